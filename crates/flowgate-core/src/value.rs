//! Field value coercion helpers.
//!
//! Collected field values arrive as a flat key -> JSON value map. The
//! condition and constraint evaluators share one definition of emptiness
//! and one set of coercion rules, so the same fallback logic is never
//! rediscovered in two places.

use std::collections::BTreeMap;

use serde_json::Value;

/// Flat map of field key to collected value.
///
/// A `BTreeMap` keeps iteration (and therefore snapshot serialization)
/// deterministic for identical inputs.
pub type ValueMap = BTreeMap<String, Value>;

/// Whether a value counts as empty.
///
/// Empty means: missing, JSON null, a blank (whitespace-only) string, or
/// an empty array. Numbers and booleans are never empty.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

/// Coerce a value to a string for comparison.
///
/// Missing and null coerce to the empty string so that string operators
/// behave the same for "field absent" and "field cleared".
pub fn coerce_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Coerce a value to a number, if it has one.
///
/// Numeric strings parse; everything else is not a number and the caller
/// falls back to its non-match branch.
pub fn coerce_to_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_emptiness() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&Value::Null)));
        assert!(is_empty_value(Some(&json!(""))));
        assert!(is_empty_value(Some(&json!("   "))));
        assert!(is_empty_value(Some(&json!([]))));
        assert!(!is_empty_value(Some(&json!("x"))));
        assert!(!is_empty_value(Some(&json!(0))));
        assert!(!is_empty_value(Some(&json!(false))));
        assert!(!is_empty_value(Some(&json!(["a"]))));
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(coerce_to_string(None), "");
        assert_eq!(coerce_to_string(Some(&Value::Null)), "");
        assert_eq!(coerce_to_string(Some(&json!("abc"))), "abc");
        assert_eq!(coerce_to_string(Some(&json!(42))), "42");
        assert_eq!(coerce_to_string(Some(&json!(true))), "true");
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(coerce_to_number(Some(&json!(18))), Some(18.0));
        assert_eq!(coerce_to_number(Some(&json!("17.5"))), Some(17.5));
        assert_eq!(coerce_to_number(Some(&json!(" 3 "))), Some(3.0));
        assert_eq!(coerce_to_number(Some(&json!("abc"))), None);
        assert_eq!(coerce_to_number(Some(&json!(true))), None);
        assert_eq!(coerce_to_number(None), None);
    }
}
