//! Conversions between wire types and the domain model
//!
//! Decoding validates enum discriminants and the coupling between
//! `rule_type` and the rule body; encoding is infallible.

use crate::pb;
use fraudguard_core::{
    AggregateFunction, ComparisonOp, DeviceUsed, Expression, FieldRef, LogicalOp, PaymentChannel,
    Profile, RuleConfig, RuleKind, RuleRequest, RuleResult, RuleStatus, Transaction,
    TransactionType, Value,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid enum value {value} for {field}")]
    InvalidEnum { field: &'static str, value: i32 },

    #[error("rule type is {rule_type} but the matching rule body is not set")]
    RuleBodyMismatch { rule_type: &'static str },

    #[error("failed to decode message: {0}")]
    Decode(String),
}

type Result<T> = std::result::Result<T, ConvertError>;

// --- transaction ---

pub fn transaction_from_proto(pb: pb::Transaction) -> Result<Transaction> {
    let transaction_type = match pb::transaction::TransactionType::try_from(pb.transaction_type) {
        Ok(pb::transaction::TransactionType::Withdrawal) => TransactionType::Withdrawal,
        Ok(pb::transaction::TransactionType::Deposit) => TransactionType::Deposit,
        Ok(pb::transaction::TransactionType::Transfer) => TransactionType::Transfer,
        Ok(pb::transaction::TransactionType::Payment) => TransactionType::Payment,
        Err(_) => {
            return Err(ConvertError::InvalidEnum {
                field: "transaction_type",
                value: pb.transaction_type,
            })
        }
    };
    let device_used = match pb::transaction::DeviceUsed::try_from(pb.device_used) {
        Ok(pb::transaction::DeviceUsed::Atm) => DeviceUsed::Atm,
        Ok(pb::transaction::DeviceUsed::Mobile) => DeviceUsed::Mobile,
        Ok(pb::transaction::DeviceUsed::Pos) => DeviceUsed::Pos,
        Ok(pb::transaction::DeviceUsed::Web) => DeviceUsed::Web,
        Err(_) => {
            return Err(ConvertError::InvalidEnum {
                field: "device_used",
                value: pb.device_used,
            })
        }
    };
    let payment_channel = match pb::transaction::PaymentChannel::try_from(pb.payment_channel) {
        Ok(pb::transaction::PaymentChannel::Ach) => PaymentChannel::Ach,
        Ok(pb::transaction::PaymentChannel::Upi) => PaymentChannel::Upi,
        Ok(pb::transaction::PaymentChannel::Card) => PaymentChannel::Card,
        Ok(pb::transaction::PaymentChannel::WireTransfer) => PaymentChannel::WireTransfer,
        Err(_) => {
            return Err(ConvertError::InvalidEnum {
                field: "payment_channel",
                value: pb.payment_channel,
            })
        }
    };

    Ok(Transaction {
        transaction_id: pb.transaction_id,
        sender_account: pb.sender_account,
        receiver_account: pb.receiver_account,
        amount: pb.amount,
        timestamp: pb.timestamp,
        transaction_type,
        merchant_category: pb.merchant_category,
        location: pb.location,
        device_used,
        payment_channel,
        ip_address: pb.ip_address,
        device_hash: pb.device_hash,
    })
}

pub fn transaction_to_proto(txn: &Transaction) -> pb::Transaction {
    pb::Transaction {
        transaction_id: txn.transaction_id.clone(),
        sender_account: txn.sender_account.clone(),
        receiver_account: txn.receiver_account.clone(),
        amount: txn.amount,
        timestamp: txn.timestamp.clone(),
        transaction_type: txn.transaction_type.discriminant(),
        merchant_category: txn.merchant_category.clone(),
        location: txn.location.clone(),
        device_used: txn.device_used.discriminant(),
        payment_channel: txn.payment_channel.discriminant(),
        ip_address: txn.ip_address.clone(),
        device_hash: txn.device_hash.clone(),
    }
}

// --- expressions ---

fn field_from_proto(pb: pb::FieldReference) -> Result<FieldRef> {
    use pb::field_reference::FieldType;
    match FieldType::try_from(pb.field) {
        Ok(FieldType::TransactionId) => Ok(FieldRef::TransactionId),
        Ok(FieldType::SenderAccount) => Ok(FieldRef::SenderAccount),
        Ok(FieldType::ReceiverAccount) => Ok(FieldRef::ReceiverAccount),
        Ok(FieldType::Amount) => Ok(FieldRef::Amount),
        Ok(FieldType::Timestamp) => Ok(FieldRef::Timestamp),
        Ok(FieldType::TransactionType) => Ok(FieldRef::TransactionType),
        Ok(FieldType::MerchantCategory) => Ok(FieldRef::MerchantCategory),
        Ok(FieldType::Location) => Ok(FieldRef::Location),
        Ok(FieldType::DeviceUsed) => Ok(FieldRef::DeviceUsed),
        Ok(FieldType::PaymentChannel) => Ok(FieldRef::PaymentChannel),
        Ok(FieldType::IpAddress) => Ok(FieldRef::IpAddress),
        Ok(FieldType::DeviceHash) => Ok(FieldRef::DeviceHash),
        Err(_) => Err(ConvertError::InvalidEnum {
            field: "field",
            value: pb.field,
        }),
    }
}

fn field_to_proto(field: FieldRef) -> pb::FieldReference {
    use pb::field_reference::FieldType;
    let field_type = match field {
        FieldRef::TransactionId => FieldType::TransactionId,
        FieldRef::SenderAccount => FieldType::SenderAccount,
        FieldRef::ReceiverAccount => FieldType::ReceiverAccount,
        FieldRef::Amount => FieldType::Amount,
        FieldRef::Timestamp => FieldType::Timestamp,
        FieldRef::TransactionType => FieldType::TransactionType,
        FieldRef::MerchantCategory => FieldType::MerchantCategory,
        FieldRef::Location => FieldType::Location,
        FieldRef::DeviceUsed => FieldType::DeviceUsed,
        FieldRef::PaymentChannel => FieldType::PaymentChannel,
        FieldRef::IpAddress => FieldType::IpAddress,
        FieldRef::DeviceHash => FieldType::DeviceHash,
    };
    pb::FieldReference {
        field: field_type as i32,
    }
}

fn literal_from_proto(pb: pb::LiteralValue) -> Result<Value> {
    use pb::literal_value::Value as PbValue;
    match pb.value {
        Some(PbValue::StringValue(s)) => Ok(Value::Str(s)),
        Some(PbValue::FloatValue(f)) => Ok(Value::Float(f64::from(f))),
        Some(PbValue::IntValue(i)) => Ok(Value::Int(i)),
        Some(PbValue::BoolValue(b)) => Ok(Value::Bool(b)),
        None => Err(ConvertError::MissingField("literal.value")),
    }
}

fn literal_to_proto(value: &Value) -> pb::LiteralValue {
    use pb::literal_value::Value as PbValue;
    pb::LiteralValue {
        value: Some(match value {
            Value::Str(s) => PbValue::StringValue(s.clone()),
            Value::Float(f) => PbValue::FloatValue(*f as f32),
            Value::Int(i) => PbValue::IntValue(*i),
            Value::Bool(b) => PbValue::BoolValue(*b),
        }),
    }
}

fn comparison_op_from_proto(value: i32) -> Result<ComparisonOp> {
    use pb::comparison_operation::Operator;
    match Operator::try_from(value) {
        Ok(Operator::Equal) => Ok(ComparisonOp::Equal),
        Ok(Operator::NotEqual) => Ok(ComparisonOp::NotEqual),
        Ok(Operator::GreaterThan) => Ok(ComparisonOp::GreaterThan),
        Ok(Operator::GreaterThanOrEqual) => Ok(ComparisonOp::GreaterThanOrEqual),
        Ok(Operator::LessThan) => Ok(ComparisonOp::LessThan),
        Ok(Operator::LessThanOrEqual) => Ok(ComparisonOp::LessThanOrEqual),
        Ok(Operator::Like) => Ok(ComparisonOp::Like),
        Err(_) => Err(ConvertError::InvalidEnum {
            field: "comparison.operator",
            value,
        }),
    }
}

fn comparison_op_to_proto(op: ComparisonOp) -> i32 {
    use pb::comparison_operation::Operator;
    (match op {
        ComparisonOp::Equal => Operator::Equal,
        ComparisonOp::NotEqual => Operator::NotEqual,
        ComparisonOp::GreaterThan => Operator::GreaterThan,
        ComparisonOp::GreaterThanOrEqual => Operator::GreaterThanOrEqual,
        ComparisonOp::LessThan => Operator::LessThan,
        ComparisonOp::LessThanOrEqual => Operator::LessThanOrEqual,
        ComparisonOp::Like => Operator::Like,
    }) as i32
}

pub fn expression_from_proto(pb: pb::Expression) -> Result<Expression> {
    use pb::expression::Expr;
    match pb.expr {
        Some(Expr::Field(field)) => Ok(Expression::Field(field_from_proto(field)?)),
        Some(Expr::Literal(literal)) => Ok(Expression::Literal(literal_from_proto(literal)?)),
        Some(Expr::Comparison(comparison)) => {
            let comparison = *comparison;
            let left = comparison
                .left
                .ok_or(ConvertError::MissingField("comparison.left"))?;
            let right = comparison
                .right
                .ok_or(ConvertError::MissingField("comparison.right"))?;
            Ok(Expression::Comparison {
                left: Box::new(expression_from_proto(*left)?),
                op: comparison_op_from_proto(comparison.operator)?,
                right: Box::new(expression_from_proto(*right)?),
            })
        }
        Some(Expr::Logical(logical)) => {
            use pb::logical_operation::Operator;
            let op = match Operator::try_from(logical.operator) {
                Ok(Operator::And) => LogicalOp::And,
                Ok(Operator::Or) => LogicalOp::Or,
                Ok(Operator::Not) => LogicalOp::Not,
                Err(_) => {
                    return Err(ConvertError::InvalidEnum {
                        field: "logical.operator",
                        value: logical.operator,
                    })
                }
            };
            let operands = logical
                .operands
                .into_iter()
                .map(expression_from_proto)
                .collect::<Result<Vec<_>>>()?;
            Ok(Expression::Logical { op, operands })
        }
        Some(Expr::Aggregate(aggregate)) => {
            use pb::aggregate_expression::Function;
            let aggregate = *aggregate;
            let function = match Function::try_from(aggregate.function) {
                Ok(Function::Count) => AggregateFunction::Count,
                Ok(Function::Sum) => AggregateFunction::Sum,
                Ok(Function::Avg) => AggregateFunction::Avg,
                Ok(Function::Min) => AggregateFunction::Min,
                Ok(Function::Max) => AggregateFunction::Max,
                Ok(Function::CountDistinct) => AggregateFunction::CountDistinct,
                Err(_) => {
                    return Err(ConvertError::InvalidEnum {
                        field: "aggregate.function",
                        value: aggregate.function,
                    })
                }
            };
            let operand = aggregate
                .operand
                .map(|operand| expression_from_proto(*operand))
                .transpose()?;
            Ok(Expression::Aggregate {
                function,
                operand: operand.map(Box::new),
            })
        }
        None => Err(ConvertError::MissingField("expression.expr")),
    }
}

pub fn expression_to_proto(expr: &Expression) -> pb::Expression {
    use pb::expression::Expr;
    let expr = match expr {
        Expression::Field(field) => Expr::Field(field_to_proto(*field)),
        Expression::Literal(value) => Expr::Literal(literal_to_proto(value)),
        Expression::Comparison { left, op, right } => {
            Expr::Comparison(Box::new(pb::ComparisonOperation {
                left: Some(Box::new(expression_to_proto(left))),
                operator: comparison_op_to_proto(*op),
                right: Some(Box::new(expression_to_proto(right))),
            }))
        }
        Expression::Logical { op, operands } => {
            use pb::logical_operation::Operator;
            Expr::Logical(pb::LogicalOperation {
                operator: (match op {
                    LogicalOp::And => Operator::And,
                    LogicalOp::Or => Operator::Or,
                    LogicalOp::Not => Operator::Not,
                }) as i32,
                operands: operands.iter().map(expression_to_proto).collect(),
            })
        }
        Expression::Aggregate { function, operand } => {
            use pb::aggregate_expression::Function;
            Expr::Aggregate(Box::new(pb::AggregateExpression {
                function: (match function {
                    AggregateFunction::Count => Function::Count,
                    AggregateFunction::Sum => Function::Sum,
                    AggregateFunction::Avg => Function::Avg,
                    AggregateFunction::Min => Function::Min,
                    AggregateFunction::Max => Function::Max,
                    AggregateFunction::CountDistinct => Function::CountDistinct,
                }) as i32,
                operand: operand
                    .as_ref()
                    .map(|operand| Box::new(expression_to_proto(operand))),
            }))
        }
    };
    pb::Expression { expr: Some(expr) }
}

// --- rule configuration ---

pub fn rule_config_from_proto(pb: pb::RuleConfig) -> Result<RuleConfig> {
    use pb::rule_config::{Rule, RuleType};

    let rule_type = RuleType::try_from(pb.rule_type).map_err(|_| ConvertError::InvalidEnum {
        field: "rule_type",
        value: pb.rule_type,
    })?;

    let kind = match (rule_type, pb.rule) {
        (RuleType::Threshold, Some(Rule::ThresholdRule(rule))) => RuleKind::Threshold {
            expression: expression_from_proto(
                rule.expression
                    .ok_or(ConvertError::MissingField("threshold_rule.expression"))?,
            )?,
        },
        (RuleType::Pattern, Some(Rule::PatternRule(rule))) => RuleKind::Pattern {
            expression: expression_from_proto(
                rule.expression
                    .ok_or(ConvertError::MissingField("pattern_rule.expression"))?,
            )?,
            max_delta_time: (rule.max_delta_time > 0).then_some(rule.max_delta_time),
            max_count: (rule.max_count > 0).then_some(rule.max_count),
        },
        (RuleType::Ml, Some(Rule::MlRule(rule))) => RuleKind::Ml {
            model_uuid: rule.model_uuid,
            lower_bound: rule.lower_bound,
        },
        (RuleType::Composite, Some(Rule::CompositeRule(rule))) => RuleKind::Composite {
            expression: expression_from_proto(
                rule.expression
                    .ok_or(ConvertError::MissingField("composite_rule.expression"))?,
            )?,
        },
        (rule_type, _) => {
            return Err(ConvertError::RuleBodyMismatch {
                rule_type: rule_type.as_str_name(),
            })
        }
    };

    Ok(RuleConfig {
        uuid: pb.uuid,
        name: pb.name,
        is_critical: pb.is_critical,
        kind,
    })
}

pub fn rule_config_to_proto(config: &RuleConfig) -> pb::RuleConfig {
    use pb::rule_config::{Rule, RuleType};

    let (rule_type, rule) = match &config.kind {
        RuleKind::Threshold { expression } => (
            RuleType::Threshold,
            Rule::ThresholdRule(pb::ThresholdRule {
                expression: Some(expression_to_proto(expression)),
            }),
        ),
        RuleKind::Pattern {
            expression,
            max_delta_time,
            max_count,
        } => (
            RuleType::Pattern,
            Rule::PatternRule(pb::PatternRule {
                expression: Some(expression_to_proto(expression)),
                max_delta_time: max_delta_time.unwrap_or(0),
                max_count: max_count.unwrap_or(0),
            }),
        ),
        RuleKind::Ml {
            model_uuid,
            lower_bound,
        } => (
            RuleType::Ml,
            Rule::MlRule(pb::MlRule {
                model_uuid: model_uuid.clone(),
                lower_bound: *lower_bound,
            }),
        ),
        RuleKind::Composite { expression } => (
            RuleType::Composite,
            Rule::CompositeRule(pb::CompositeRule {
                expression: Some(expression_to_proto(expression)),
            }),
        ),
    };

    pb::RuleConfig {
        uuid: config.uuid.clone(),
        name: config.name.clone(),
        is_critical: config.is_critical,
        rule_type: rule_type as i32,
        rule: Some(rule),
    }
}

// --- profiles and messages ---

pub fn profile_from_proto(pb: pb::Profile) -> Result<Profile> {
    Ok(Profile {
        uuid: pb.uuid,
        name: pb.name,
        rules: pb
            .rules
            .into_iter()
            .map(rule_config_from_proto)
            .collect::<Result<Vec<_>>>()?,
    })
}

pub fn profile_to_proto(profile: &Profile) -> pb::Profile {
    pb::Profile {
        uuid: profile.uuid.clone(),
        name: profile.name.clone(),
        rules: profile.rules.iter().map(rule_config_to_proto).collect(),
    }
}

pub fn rule_request_from_proto(pb: pb::RuleRequest) -> Result<RuleRequest> {
    Ok(RuleRequest {
        profile_uuid: pb.profile_uuid,
        profile_name: pb.profile_name,
        rule: rule_config_from_proto(pb.rule.ok_or(ConvertError::MissingField("rule"))?)?,
        transaction: transaction_from_proto(
            pb.transaction
                .ok_or(ConvertError::MissingField("transaction"))?,
        )?,
        number: pb.number,
        total_rule_count: pb.total_rule_count,
    })
}

pub fn rule_request_to_proto(request: &RuleRequest) -> pb::RuleRequest {
    pb::RuleRequest {
        profile_uuid: request.profile_uuid.clone(),
        profile_name: request.profile_name.clone(),
        rule: Some(rule_config_to_proto(&request.rule)),
        transaction: Some(transaction_to_proto(&request.transaction)),
        number: request.number,
        total_rule_count: request.total_rule_count,
    }
}

pub fn rule_result_from_proto(pb: pb::RuleResult) -> Result<RuleResult> {
    use pb::rule_result::Status;
    let status = match Status::try_from(pb.status) {
        Ok(Status::NotFraud) => RuleStatus::NotFraud,
        Ok(Status::Fraud) => RuleStatus::Fraud,
        Ok(Status::Critical) => RuleStatus::Critical,
        Ok(Status::Error) => RuleStatus::Error,
        Err(_) => {
            return Err(ConvertError::InvalidEnum {
                field: "status",
                value: pb.status,
            })
        }
    };
    Ok(RuleResult {
        profile_uuid: pb.profile_uuid,
        profile_name: pb.profile_name,
        config_uuid: pb.config_uuid,
        config_name: pb.config_name,
        transaction_id: pb.transaction_id,
        status,
        description: pb.description,
    })
}

pub fn rule_result_to_proto(result: &RuleResult) -> pb::RuleResult {
    use pb::rule_result::Status;
    pb::RuleResult {
        profile_uuid: result.profile_uuid.clone(),
        profile_name: result.profile_name.clone(),
        config_uuid: result.config_uuid.clone(),
        config_name: result.config_name.clone(),
        transaction_id: result.transaction_id.clone(),
        status: (match result.status {
            RuleStatus::NotFraud => Status::NotFraud,
            RuleStatus::Fraud => Status::Fraud,
            RuleStatus::Critical => Status::Critical,
            RuleStatus::Error => Status::Error,
        }) as i32,
        description: result.description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_body_mismatch_rejected() {
        let pb = pb::RuleConfig {
            uuid: "r-1".to_string(),
            name: "rule".to_string(),
            is_critical: false,
            rule_type: pb::rule_config::RuleType::Threshold as i32,
            rule: Some(pb::rule_config::Rule::MlRule(pb::MlRule {
                model_uuid: "m-1".to_string(),
                lower_bound: 0.5,
            })),
        };

        assert!(matches!(
            rule_config_from_proto(pb),
            Err(ConvertError::RuleBodyMismatch { .. })
        ));
    }

    #[test]
    fn test_expression_survives_wire_conversion() {
        // AND(amount > 500, COUNT() > 3)
        let expr = Expression::and(vec![
            Expression::comparison(
                Expression::field(FieldRef::Amount),
                ComparisonOp::GreaterThan,
                Expression::literal(500.0),
            ),
            Expression::comparison(
                Expression::aggregate(AggregateFunction::Count, None),
                ComparisonOp::GreaterThan,
                Expression::literal(3),
            ),
        ]);

        let back = expression_from_proto(expression_to_proto(&expr)).unwrap();
        assert_eq!(back, expr);
    }

    #[test]
    fn test_pattern_zero_window_means_unbounded() {
        let pb = pb::RuleConfig {
            uuid: "r-1".to_string(),
            name: "rule".to_string(),
            is_critical: false,
            rule_type: pb::rule_config::RuleType::Pattern as i32,
            rule: Some(pb::rule_config::Rule::PatternRule(pb::PatternRule {
                expression: Some(expression_to_proto(&Expression::literal(true))),
                max_delta_time: 0,
                max_count: 10,
            })),
        };

        let config = rule_config_from_proto(pb).unwrap();
        match config.kind {
            RuleKind::Pattern {
                max_delta_time,
                max_count,
                ..
            } => {
                assert_eq!(max_delta_time, None);
                assert_eq!(max_count, Some(10));
            }
            _ => panic!("expected pattern rule"),
        }
    }
}
