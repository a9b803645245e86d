//! Expression AST for rule conditions

use crate::transaction::Transaction;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A transaction field an expression can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRef {
    TransactionId,
    SenderAccount,
    ReceiverAccount,
    Amount,
    Timestamp,
    TransactionType,
    MerchantCategory,
    Location,
    DeviceUsed,
    PaymentChannel,
    IpAddress,
    DeviceHash,
}

impl FieldRef {
    /// Read the field off a transaction. Enum-typed fields evaluate to
    /// their wire discriminant.
    pub fn extract(self, txn: &Transaction) -> Value {
        match self {
            FieldRef::TransactionId => Value::Str(txn.transaction_id.clone()),
            FieldRef::SenderAccount => Value::Str(txn.sender_account.clone()),
            FieldRef::ReceiverAccount => Value::Str(txn.receiver_account.clone()),
            FieldRef::Amount => Value::Float(txn.amount),
            FieldRef::Timestamp => Value::Str(txn.timestamp.clone()),
            FieldRef::TransactionType => Value::Int(txn.transaction_type.discriminant()),
            FieldRef::MerchantCategory => Value::Str(txn.merchant_category.clone()),
            FieldRef::Location => Value::Str(txn.location.clone()),
            FieldRef::DeviceUsed => Value::Int(txn.device_used.discriminant()),
            FieldRef::PaymentChannel => Value::Int(txn.payment_channel.discriminant()),
            FieldRef::IpAddress => Value::Str(txn.ip_address.clone()),
            FieldRef::DeviceHash => Value::Str(txn.device_hash.clone()),
        }
    }

    /// Column name in the history store.
    pub fn column_name(self) -> &'static str {
        match self {
            FieldRef::TransactionId => "transaction_id",
            FieldRef::SenderAccount => "sender_account",
            FieldRef::ReceiverAccount => "receiver_account",
            FieldRef::Amount => "amount",
            FieldRef::Timestamp => "times_tamp",
            FieldRef::TransactionType => "transaction_type",
            FieldRef::MerchantCategory => "merchant_category",
            FieldRef::Location => "location",
            FieldRef::DeviceUsed => "device_used",
            FieldRef::PaymentChannel => "payment_channel",
            FieldRef::IpAddress => "ip_address",
            FieldRef::DeviceHash => "device_hash",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    /// Substring containment: right side contained in left side.
    Like,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

/// Aggregate functions over an account's transaction history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    CountDistinct,
}

impl AggregateFunction {
    /// COUNT takes no operand; every other function takes exactly one field.
    pub fn takes_operand(self) -> bool {
        !matches!(self, AggregateFunction::Count)
    }
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Transaction field access
    Field(FieldRef),

    /// Literal value
    Literal(Value),

    /// Binary comparison
    Comparison {
        left: Box<Expression>,
        op: ComparisonOp,
        right: Box<Expression>,
    },

    /// AND/OR over any number of operands, NOT over exactly one
    Logical {
        op: LogicalOp,
        operands: Vec<Expression>,
    },

    /// History-backed aggregate; only meaningful inside a pattern rule
    Aggregate {
        function: AggregateFunction,
        operand: Option<Box<Expression>>,
    },
}

impl Expression {
    pub fn field(field: FieldRef) -> Self {
        Expression::Field(field)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn comparison(left: Expression, op: ComparisonOp, right: Expression) -> Self {
        Expression::Comparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn and(operands: Vec<Expression>) -> Self {
        Expression::Logical {
            op: LogicalOp::And,
            operands,
        }
    }

    pub fn or(operands: Vec<Expression>) -> Self {
        Expression::Logical {
            op: LogicalOp::Or,
            operands,
        }
    }

    pub fn not(operand: Expression) -> Self {
        Expression::Logical {
            op: LogicalOp::Not,
            operands: vec![operand],
        }
    }

    pub fn aggregate(function: AggregateFunction, operand: Option<Expression>) -> Self {
        Expression::Aggregate {
            function,
            operand: operand.map(Box::new),
        }
    }

    /// Whether any node in the tree is an aggregate.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::Aggregate { .. } => true,
            Expression::Comparison { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expression::Logical { operands, .. } => {
                operands.iter().any(Expression::contains_aggregate)
            }
            Expression::Field(_) | Expression::Literal(_) => false,
        }
    }
}
