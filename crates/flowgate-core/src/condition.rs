//! Condition model and evaluator.
//!
//! Conditions are pure data: a recursive boolean expression tree that a
//! visual rule builder can author, serialize, and ship to a different
//! runtime for evaluation. Evaluation is a pure function over a flat
//! value map, so it can run on every keystroke without drift.
//!
//! Malformed input is data, not control flow: an unrecognized operator or
//! a missing comparison value resolves to `false` (fail closed) with a
//! diagnostic, never a panic or an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patterns;
use crate::value::{coerce_to_number, coerce_to_string, is_empty_value, ValueMap};

/// Comparison operator for a `field` condition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Exists,
    NotExists,
    IsEmpty,
    IsNotEmpty,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    MatchesPattern,
    IsEmail,
    IsPhone,

    /// Operators authored by a newer rule builder than this evaluator.
    /// Always evaluates to false.
    #[serde(other)]
    Unknown,
}

impl Operator {
    /// Whether this operator needs a comparison value to be meaningful.
    pub fn requires_comparison_value(&self) -> bool {
        matches!(
            self,
            Operator::Equals
                | Operator::NotEquals
                | Operator::Contains
                | Operator::NotContains
                | Operator::StartsWith
                | Operator::EndsWith
                | Operator::GreaterThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThan
                | Operator::LessThanOrEqual
                | Operator::MatchesPattern
        )
    }
}

/// A recursive boolean expression over the collected field values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Compare one field against an operator and optional value.
    Field {
        field: String,
        operator: Operator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },

    /// True when every child condition is true. Empty list is true.
    And { conditions: Vec<Condition> },

    /// True when any child condition is true. Empty list is false.
    Or { conditions: Vec<Condition> },

    /// Inverts its child condition.
    Not { condition: Box<Condition> },

    /// A literal boolean.
    Always { result: bool },
}

impl Condition {
    /// Shorthand for a field condition.
    pub fn field(field: impl Into<String>, operator: Operator, value: Option<Value>) -> Self {
        Condition::Field {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Shorthand for a literal condition.
    pub fn always(result: bool) -> Self {
        Condition::Always { result }
    }

    /// Evaluate this condition against a value map.
    ///
    /// Pure and deterministic: no I/O, no shared state, never panics.
    pub fn evaluate(&self, values: &ValueMap) -> bool {
        match self {
            Condition::Field {
                field,
                operator,
                value,
            } => evaluate_field(field, *operator, value.as_ref(), values),
            Condition::And { conditions } => conditions.iter().all(|c| c.evaluate(values)),
            Condition::Or { conditions } => conditions.iter().any(|c| c.evaluate(values)),
            Condition::Not { condition } => !condition.evaluate(values),
            Condition::Always { result } => *result,
        }
    }
}

fn evaluate_field(
    field: &str,
    operator: Operator,
    expected: Option<&Value>,
    values: &ValueMap,
) -> bool {
    let actual = values.get(field);

    if operator.requires_comparison_value() && expected.is_none() {
        tracing::warn!(field, operator = ?operator, "operator requires a comparison value; treating as non-match");
        return false;
    }

    match operator {
        Operator::Exists => actual.is_some(),
        Operator::NotExists => actual.is_none(),
        Operator::IsEmpty => is_empty_value(actual),
        Operator::IsNotEmpty => !is_empty_value(actual),
        Operator::Equals => coerce_to_string(actual) == coerce_to_string(expected),
        Operator::NotEquals => coerce_to_string(actual) != coerce_to_string(expected),
        Operator::Contains => {
            lowercase(actual).contains(&lowercase(expected))
        }
        Operator::NotContains => {
            !lowercase(actual).contains(&lowercase(expected))
        }
        Operator::StartsWith => {
            lowercase(actual).starts_with(&lowercase(expected))
        }
        Operator::EndsWith => {
            lowercase(actual).ends_with(&lowercase(expected))
        }
        Operator::GreaterThan => compare_numbers(actual, expected, |a, b| a > b),
        Operator::GreaterThanOrEqual => compare_numbers(actual, expected, |a, b| a >= b),
        Operator::LessThan => compare_numbers(actual, expected, |a, b| a < b),
        Operator::LessThanOrEqual => compare_numbers(actual, expected, |a, b| a <= b),
        Operator::MatchesPattern => {
            let pattern = coerce_to_string(expected);
            match Regex::new(&pattern) {
                Ok(re) => re.is_match(&coerce_to_string(actual)),
                Err(err) => {
                    tracing::warn!(field, %pattern, error = %err, "invalid regex in condition; treating as non-match");
                    false
                }
            }
        }
        Operator::IsEmail => patterns::is_email(&coerce_to_string(actual)),
        Operator::IsPhone => patterns::is_phone(&coerce_to_string(actual)),
        Operator::Unknown => {
            tracing::warn!(field, "unknown condition operator; treating as non-match");
            false
        }
    }
}

fn lowercase(value: Option<&Value>) -> String {
    coerce_to_string(value).to_lowercase()
}

fn compare_numbers(
    actual: Option<&Value>,
    expected: Option<&Value>,
    cmp: impl Fn(f64, f64) -> bool,
) -> bool {
    match (coerce_to_number(actual), coerce_to_number(expected)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, Value)]) -> ValueMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_equals_is_string_coerced() {
        let vals = values(&[("age", json!(18))]);
        let cond = Condition::field("age", Operator::Equals, Some(json!("18")));
        assert!(cond.evaluate(&vals));

        let cond = Condition::field("age", Operator::NotEquals, Some(json!("21")));
        assert!(cond.evaluate(&vals));
    }

    #[test]
    fn test_exists_and_emptiness() {
        let vals = values(&[("name", json!("")), ("tags", json!([]))]);

        assert!(Condition::field("name", Operator::Exists, None).evaluate(&vals));
        assert!(Condition::field("missing", Operator::NotExists, None).evaluate(&vals));
        assert!(Condition::field("name", Operator::IsEmpty, None).evaluate(&vals));
        assert!(Condition::field("tags", Operator::IsEmpty, None).evaluate(&vals));
        assert!(Condition::field("missing", Operator::IsEmpty, None).evaluate(&vals));
        assert!(!Condition::field("name", Operator::IsNotEmpty, None).evaluate(&vals));
    }

    #[test]
    fn test_containment_is_case_insensitive() {
        let vals = values(&[("title", json!("Hello World"))]);

        assert!(Condition::field("title", Operator::Contains, Some(json!("WORLD"))).evaluate(&vals));
        assert!(Condition::field("title", Operator::StartsWith, Some(json!("hello"))).evaluate(&vals));
        assert!(Condition::field("title", Operator::EndsWith, Some(json!("World"))).evaluate(&vals));
        assert!(Condition::field("title", Operator::NotContains, Some(json!("bye"))).evaluate(&vals));
    }

    #[test]
    fn test_numeric_comparison() {
        let vals = values(&[("age", json!("17"))]);

        assert!(Condition::field("age", Operator::LessThan, Some(json!(18))).evaluate(&vals));
        assert!(Condition::field("age", Operator::GreaterThanOrEqual, Some(json!(17))).evaluate(&vals));
        // Non-numeric input never matches.
        let vals = values(&[("age", json!("abc"))]);
        assert!(!Condition::field("age", Operator::LessThan, Some(json!(18))).evaluate(&vals));
    }

    #[test]
    fn test_invalid_regex_is_non_match() {
        let vals = values(&[("code", json!("abc"))]);
        let cond = Condition::field("code", Operator::MatchesPattern, Some(json!("[unclosed")));
        assert!(!cond.evaluate(&vals));
    }

    #[test]
    fn test_missing_comparison_value_fails_closed() {
        let vals = values(&[("age", json!(18))]);
        let cond = Condition::field("age", Operator::Equals, None);
        assert!(!cond.evaluate(&vals));
    }

    #[test]
    fn test_boolean_combinators() {
        let vals = values(&[("a", json!(1))]);

        assert!(Condition::And { conditions: vec![] }.evaluate(&vals));
        assert!(!Condition::Or { conditions: vec![] }.evaluate(&vals));
        assert!(Condition::Not {
            condition: Box::new(Condition::always(false))
        }
        .evaluate(&vals));

        let nested = Condition::Or {
            conditions: vec![
                Condition::always(false),
                Condition::And {
                    conditions: vec![
                        Condition::field("a", Operator::Exists, None),
                        Condition::field("a", Operator::Equals, Some(json!("1"))),
                    ],
                },
            ],
        };
        assert!(nested.evaluate(&vals));
    }

    #[test]
    fn test_email_and_phone_operators() {
        let vals = values(&[
            ("email", json!("user@example.com")),
            ("phone", json!("555-123-4567")),
        ]);
        assert!(Condition::field("email", Operator::IsEmail, None).evaluate(&vals));
        assert!(Condition::field("phone", Operator::IsPhone, None).evaluate(&vals));
        assert!(!Condition::field("phone", Operator::IsEmail, None).evaluate(&vals));
    }

    #[test]
    fn test_unknown_operator_deserializes_and_fails_closed() {
        let cond: Condition = serde_json::from_str(
            r#"{ "type": "field", "field": "x", "operator": "quantum_entangled" }"#,
        )
        .unwrap();
        assert!(matches!(
            cond,
            Condition::Field {
                operator: Operator::Unknown,
                ..
            }
        ));
        assert!(!cond.evaluate(&ValueMap::new()));
    }

    #[test]
    fn test_condition_round_trip() {
        let cond = Condition::Or {
            conditions: vec![
                Condition::field("age", Operator::GreaterThan, Some(json!(18))),
                Condition::Not {
                    condition: Box::new(Condition::field("country", Operator::Equals, Some(json!("DE")))),
                },
            ],
        };
        let json = serde_json::to_string(&cond).unwrap();
        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(cond, back);
    }
}
