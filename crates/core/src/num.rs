//! Numeric coercion and truthiness helpers.
//!
//! All engine arithmetic is double-precision floating point. Three coercion
//! levels exist because the reference behavior differs by call site: writes
//! to numeric leaves are strict, current-value reads tolerate absence, and
//! operator inputs degrade to zero.

use serde_json::Value;

use crate::error::EngineError;

/// Strict coercion for writes to numeric leaves (`totals.*`, `item.amount`).
/// Accepts JSON numbers and numeric strings; anything else is an error.
pub fn coerce_f64(v: &Value) -> Result<f64, EngineError> {
    match v {
        Value::Number(n) => n.as_f64().ok_or_else(|| non_numeric(v)),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| non_numeric(v)),
        _ => Err(non_numeric(v)),
    }
}

/// Coercion for the current value read by `add`/`multiply`: absent and null
/// read as zero, present values go through the strict rules.
pub fn current_f64(v: Option<&Value>) -> Result<f64, EngineError> {
    match v {
        None | Some(Value::Null) => Ok(0.0),
        Some(other) => coerce_f64(other),
    }
}

/// Lenient extraction used by operators and item-value projection: numbers
/// pass through, everything else reads as zero.
pub fn lenient_f64(v: &Value) -> f64 {
    v.as_f64().unwrap_or(0.0)
}

/// Build a JSON number from an `f64`, rejecting non-finite results.
pub fn number(v: f64) -> Result<Value, EngineError> {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .ok_or_else(|| EngineError::logic("non-finite numeric result"))
}

/// Truthiness: `false`, `0`, `""`, empty array, empty object and null are
/// falsy; everything else is truthy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

fn non_numeric(v: &Value) -> EngineError {
    EngineError::NonNumeric {
        got: type_name(v).to_string(),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_f64(&json!(3)).unwrap(), 3.0);
        assert_eq!(coerce_f64(&json!(2.5)).unwrap(), 2.5);
        assert_eq!(coerce_f64(&json!("42.5")).unwrap(), 42.5);
        assert_eq!(coerce_f64(&json!(" 7 ")).unwrap(), 7.0);
    }

    #[test]
    fn coerce_rejects_non_numeric() {
        assert!(coerce_f64(&json!("abc")).is_err());
        assert!(coerce_f64(&json!(true)).is_err());
        assert!(coerce_f64(&json!(null)).is_err());
        assert!(coerce_f64(&json!([1])).is_err());
    }

    #[test]
    fn current_value_defaults_absent_to_zero() {
        assert_eq!(current_f64(None).unwrap(), 0.0);
        assert_eq!(current_f64(Some(&json!(null))).unwrap(), 0.0);
        assert_eq!(current_f64(Some(&json!(9))).unwrap(), 9.0);
        assert!(current_f64(Some(&json!({}))).is_err());
    }

    #[test]
    fn truthiness_matches_the_falsy_set() {
        for falsy in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!("x"), json!([0]), json!({"a": 0})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }
}
