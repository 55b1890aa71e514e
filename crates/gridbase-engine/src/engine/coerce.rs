//! Type coercions between [`Value`] variants.
//!
//! These are total: every variant maps to a number, a boolean and a string.
//! Arithmetic, the builtin functions and result-type coercion of formula
//! fields all go through here.

use serde::{Deserialize, Serialize};

use super::Value;

/// Declared result type of a formula field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Number,
    Text,
    Boolean,
}

impl ResultType {
    /// Parse a stored result type name. Unknown names mean "no coercion".
    pub fn from_name(name: &str) -> Option<ResultType> {
        match name.trim().to_ascii_lowercase().as_str() {
            "number" => Some(ResultType::Number),
            "text" => Some(ResultType::Text),
            "boolean" => Some(ResultType::Boolean),
            _ => None,
        }
    }
}

impl Value {
    /// Numeric view of a value. Anything non-numeric is `0`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::String(s) => parse_numeric(s).unwrap_or(0.0),
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
        }
    }

    /// Truthiness. The string `"false"` (any case) is false, every other
    /// non-empty string is true.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
            Value::Null => false,
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Text view of a value.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_text(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Object(_) => serde_json::Value::from(self.clone()).to_string(),
        }
    }

    /// Null, empty or whitespace-only text, or an empty array.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Bool(_) | Value::Number(_) | Value::Object(_) => false,
        }
    }

    /// Numeric view used by comparisons: `None` when the value is not a
    /// number, a boolean or a numeric string.
    pub(crate) fn as_comparable_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => parse_numeric(s),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Rust's float parser accepts "inf" and "NaN"; those are not numeric text here.
fn parse_numeric(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number_to_text(n: f64) -> String {
    if n == 0.0 {
        // Avoid printing "-0".
        return "0".to_string();
    }
    // f64's Display already drops the fractional part of integral values.
    n.to_string()
}

/// Apply a formula field's declared result type to its computed value.
pub fn coerce_result_type(value: Value, result_type: Option<ResultType>) -> Value {
    match result_type {
        Some(ResultType::Number) => Value::Number(value.to_number()),
        Some(ResultType::Text) => Value::String(value.to_text()),
        Some(ResultType::Boolean) => Value::Bool(value.to_bool()),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number() {
        assert_eq!(Value::Number(2.5).to_number(), 2.5);
        assert_eq!(Value::from(" 42 ").to_number(), 42.0);
        assert_eq!(Value::from("abc").to_number(), 0.0);
        assert_eq!(Value::from("NaN").to_number(), 0.0);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Bool(false).to_number(), 0.0);
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::Array(vec![Value::Number(3.0)]).to_number(), 0.0);
    }

    #[test]
    fn test_to_bool() {
        assert!(Value::Number(-1.0).to_bool());
        assert!(!Value::Number(0.0).to_bool());
        assert!(Value::from("yes").to_bool());
        assert!(Value::from("0").to_bool());
        assert!(!Value::from("FALSE").to_bool());
        assert!(!Value::from("").to_bool());
        assert!(!Value::Null.to_bool());
        assert!(Value::Array(vec![]).to_bool());
    }

    #[test]
    fn test_to_text_numbers() {
        assert_eq!(Value::Number(14.0).to_text(), "14");
        assert_eq!(Value::Number(-3.0).to_text(), "-3");
        assert_eq!(Value::Number(2.5).to_text(), "2.5");
        assert_eq!(Value::Number(-0.0).to_text(), "0");
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Bool(true).to_text(), "true");
    }

    #[test]
    fn test_to_text_array_joins_elements() {
        let v = Value::Array(vec![Value::from("a"), Value::Number(1.0), Value::Null]);
        assert_eq!(v.to_text(), "a, 1, ");
    }

    #[test]
    fn test_is_blank() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("   ").is_blank());
        assert!(Value::Array(vec![]).is_blank());
        assert!(!Value::Number(0.0).is_blank());
        assert!(!Value::Bool(false).is_blank());
    }

    #[test]
    fn test_coerce_result_type() {
        assert_eq!(
            coerce_result_type(Value::from("12"), Some(ResultType::Number)),
            Value::Number(12.0)
        );
        assert_eq!(
            coerce_result_type(Value::Number(7.0), Some(ResultType::Text)),
            Value::from("7")
        );
        assert_eq!(
            coerce_result_type(Value::Number(0.0), Some(ResultType::Boolean)),
            Value::Bool(false)
        );
        assert_eq!(coerce_result_type(Value::from("x"), None), Value::from("x"));
    }

    #[test]
    fn test_result_type_from_name() {
        assert_eq!(ResultType::from_name("Number"), Some(ResultType::Number));
        assert_eq!(ResultType::from_name("boolean"), Some(ResultType::Boolean));
        assert_eq!(ResultType::from_name("currency"), None);
    }
}
