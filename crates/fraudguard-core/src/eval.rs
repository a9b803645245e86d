//! Expression evaluation
//!
//! Two entry points over an [`Expression`]: [`Evaluator::eval_value`] and
//! [`Evaluator::eval_bool`]. Evaluation is async only because aggregate
//! nodes delegate to an [`AggregateContext`] that may query the history
//! store; pure sub-trees never suspend. Recursion goes through boxed
//! futures, the same shape `async_trait` produces.

use crate::error::{CoreError, Result};
use crate::expr::{AggregateFunction, ComparisonOp, Expression, FieldRef, LogicalOp};
use crate::transaction::Transaction;
use crate::value::Value;
use async_trait::async_trait;
use futures::future::BoxFuture;

/// The scope a pattern rule supplies to make history-backed aggregates
/// meaningful. Outside a pattern rule no context exists and aggregate
/// nodes fail with [`CoreError::AggregateOutsideContext`].
#[async_trait]
pub trait AggregateContext: Send + Sync {
    /// Evaluate `function` over the context's history scope. `field` is
    /// `None` exactly for COUNT.
    async fn aggregate(&self, function: AggregateFunction, field: Option<FieldRef>)
        -> Result<Value>;
}

/// Evaluates expressions against one transaction, optionally inside an
/// aggregate context.
pub struct Evaluator<'a> {
    txn: &'a Transaction,
    ctx: Option<&'a dyn AggregateContext>,
}

impl<'a> Evaluator<'a> {
    /// Evaluator without aggregate support (threshold and composite rules).
    pub fn new(txn: &'a Transaction) -> Self {
        Self { txn, ctx: None }
    }

    /// Evaluator with history-backed aggregates (pattern rules).
    pub fn with_context(txn: &'a Transaction, ctx: &'a dyn AggregateContext) -> Self {
        Self { txn, ctx: Some(ctx) }
    }

    /// Evaluate an expression expected to yield a boolean.
    pub fn eval_bool<'s>(&'s self, expr: &'s Expression) -> BoxFuture<'s, Result<bool>> {
        Box::pin(async move {
            match expr {
                Expression::Comparison { left, op, right } => {
                    let lhs = self.eval_value(left).await?;
                    let rhs = self.eval_value(right).await?;
                    compare(&lhs, *op, &rhs)
                }
                Expression::Logical { op, operands } => self.eval_logical(*op, operands).await,
                Expression::Literal(Value::Bool(b)) => Ok(*b),
                other => Err(CoreError::TypeMismatch(format!(
                    "expression does not yield a boolean: {other:?}"
                ))),
            }
        })
    }

    /// Evaluate an expression to its value.
    pub fn eval_value<'s>(&'s self, expr: &'s Expression) -> BoxFuture<'s, Result<Value>> {
        Box::pin(async move {
            match expr {
                Expression::Field(field) => Ok(field.extract(self.txn)),
                Expression::Literal(value) => Ok(value.clone()),
                Expression::Aggregate { function, operand } => {
                    self.eval_aggregate(*function, operand.as_deref()).await
                }
                Expression::Comparison { left, op, right } => {
                    let lhs = self.eval_value(left).await?;
                    let rhs = self.eval_value(right).await?;
                    compare(&lhs, *op, &rhs).map(Value::Bool)
                }
                Expression::Logical { op, operands } => {
                    self.eval_logical(*op, operands).await.map(Value::Bool)
                }
            }
        })
    }

    async fn eval_logical(&self, op: LogicalOp, operands: &[Expression]) -> Result<bool> {
        match op {
            LogicalOp::And => {
                for operand in operands {
                    if !self.eval_bool(operand).await? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicalOp::Or => {
                for operand in operands {
                    if self.eval_bool(operand).await? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            LogicalOp::Not => {
                if operands.len() != 1 {
                    return Err(CoreError::MalformedExpression(format!(
                        "NOT requires exactly one operand, got {}",
                        operands.len()
                    )));
                }
                Ok(!self.eval_bool(&operands[0]).await?)
            }
        }
    }

    async fn eval_aggregate(
        &self,
        function: AggregateFunction,
        operand: Option<&Expression>,
    ) -> Result<Value> {
        let ctx = self.ctx.ok_or(CoreError::AggregateOutsideContext)?;

        let field = match (function.takes_operand(), operand) {
            (false, None) => None,
            (false, Some(_)) => {
                return Err(CoreError::MalformedExpression(
                    "COUNT takes no operand".to_string(),
                ))
            }
            (true, Some(Expression::Field(field))) => Some(*field),
            (true, Some(other)) => {
                return Err(CoreError::MalformedExpression(format!(
                    "aggregate operand must be a field, got {other:?}"
                )))
            }
            (true, None) => {
                return Err(CoreError::MalformedExpression(
                    "aggregate requires a field operand".to_string(),
                ))
            }
        };

        ctx.aggregate(function, field).await
    }
}

/// Comparison dispatch over the operand pair, with explicit numeric
/// promotion. Anything not covered by the static rules is a type mismatch.
fn compare(left: &Value, op: ComparisonOp, right: &Value) -> Result<bool> {
    if let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) {
        return match op {
            ComparisonOp::Equal => Ok(l == r),
            ComparisonOp::NotEqual => Ok(l != r),
            ComparisonOp::GreaterThan => Ok(l > r),
            ComparisonOp::GreaterThanOrEqual => Ok(l >= r),
            ComparisonOp::LessThan => Ok(l < r),
            ComparisonOp::LessThanOrEqual => Ok(l <= r),
            ComparisonOp::Like => Err(CoreError::TypeMismatch(
                "LIKE is not defined for numeric operands".to_string(),
            )),
        };
    }

    match (left, right) {
        (Value::Str(l), Value::Str(r)) => match op {
            ComparisonOp::Equal => Ok(l == r),
            ComparisonOp::NotEqual => Ok(l != r),
            ComparisonOp::Like => Ok(l.contains(r.as_str())),
            _ => Err(CoreError::TypeMismatch(format!(
                "{op:?} is not defined for string operands"
            ))),
        },
        (Value::Bool(l), Value::Bool(r)) => match op {
            ComparisonOp::Equal => Ok(l == r),
            ComparisonOp::NotEqual => Ok(l != r),
            _ => Err(CoreError::TypeMismatch(format!(
                "{op:?} is not defined for boolean operands"
            ))),
        },
        _ => Err(CoreError::TypeMismatch(format!(
            "cannot compare {} with {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}
