//! Runtime values produced by expression evaluation
//!
//! `Value` is the same tagged union as the literal type in rule
//! configurations: string, float, 32-bit int, bool. Comparison rules are
//! static over these tags; the only implicit conversion is int-to-float
//! promotion inside numeric comparisons.

use serde::{Deserialize, Serialize};

/// Runtime value type
///
/// Untagged on the wire; `Int` precedes `Float` so integral JSON numbers
/// decode back to ints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i32),
    Float(f64),
    Bool(bool),
}

impl Value {
    /// Numeric view of the value, promoting ints to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(f64::from(*i)),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Float(_) | Value::Int(_))
    }

    /// Tag name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Float(_) => "float",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(Value::Int(42).as_f64(), Some(42.0));
        assert_eq!(Value::Float(3.5).as_f64(), Some(3.5));
        assert_eq!(Value::Str("42".to_string()).as_f64(), None);
        assert_eq!(Value::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::from(1.0).type_name(), "float");
        assert_eq!(Value::from(1).type_name(), "int");
        assert_eq!(Value::from(true).type_name(), "bool");
    }

    #[test]
    fn test_serde_untagged() {
        let json = serde_json::to_string(&Value::Int(7)).unwrap();
        assert_eq!(json, "7");
        let json = serde_json::to_string(&Value::Str("RU".to_string())).unwrap();
        assert_eq!(json, "\"RU\"");
    }
}
