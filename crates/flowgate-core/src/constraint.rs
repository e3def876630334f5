//! Field validation constraints.
//!
//! A constraint checks one field value and produces at most one error.
//! Like conditions, constraints are pure data authored by the visual rule
//! builder; evaluation is a pure function and never throws.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patterns;
use crate::value::{coerce_to_number, coerce_to_string, is_empty_value};

/// Kind of validation constraint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Required,
    MinLength,
    MaxLength,
    MinValue,
    MaxValue,
    Pattern,
    Email,
    Phone,
    Url,
    Custom,

    /// Constraint kinds authored by a newer rule builder than this
    /// evaluator. Never produces an error (an error here would block
    /// progression on data this evaluator cannot judge).
    #[serde(other)]
    Unknown,
}

/// A single field validation constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConstraint {
    /// What to check.
    #[serde(rename = "type")]
    pub kind: ConstraintKind,

    /// Parameter for kinds that take one (length bound, numeric bound,
    /// regex pattern).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Override for the default error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One validation failure for one field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    /// The field key the failing constraint was attached to.
    pub field: String,

    /// Which constraint kind failed.
    pub constraint: ConstraintKind,

    /// Human-readable message (override or default).
    pub message: String,
}

impl ValidationConstraint {
    /// Build a constraint without parameter or message override.
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            value: None,
            message: None,
        }
    }

    /// Build a constraint with a parameter.
    pub fn with_value(kind: ConstraintKind, value: Value) -> Self {
        Self {
            kind,
            value: Some(value),
            message: None,
        }
    }

    /// Evaluate this constraint against a field value.
    ///
    /// Returns `Some(error)` on the constraint's single failure
    /// condition, `None` otherwise. Malformed parameters fail closed.
    pub fn evaluate(&self, value: Option<&Value>, field: &str) -> Option<ValidationError> {
        match self.kind {
            ConstraintKind::Required => {
                if is_empty_value(value) {
                    self.error(field, format!("{} is required", field))
                } else {
                    None
                }
            }
            ConstraintKind::MinLength => {
                let min = self.length_param(field)?;
                if coerce_to_string(value).chars().count() < min {
                    self.error(field, format!("{} must be at least {} characters", field, min))
                } else {
                    None
                }
            }
            ConstraintKind::MaxLength => {
                let max = self.length_param(field)?;
                if coerce_to_string(value).chars().count() > max {
                    self.error(field, format!("{} must be at most {} characters", field, max))
                } else {
                    None
                }
            }
            ConstraintKind::MinValue => {
                let min = self.numeric_param(field)?;
                match coerce_to_number(value) {
                    Some(n) if n < min => {
                        self.error(field, format!("{} must be at least {}", field, min))
                    }
                    // Non-numeric input is not this constraint's failure.
                    _ => None,
                }
            }
            ConstraintKind::MaxValue => {
                let max = self.numeric_param(field)?;
                match coerce_to_number(value) {
                    Some(n) if n > max => {
                        self.error(field, format!("{} must be at most {}", field, max))
                    }
                    _ => None,
                }
            }
            ConstraintKind::Pattern => {
                let pattern = coerce_to_string(self.value.as_ref());
                match Regex::new(&pattern) {
                    Ok(re) => {
                        if re.is_match(&coerce_to_string(value)) {
                            None
                        } else {
                            self.error(field, format!("{} has an invalid format", field))
                        }
                    }
                    // A malformed regex is a failure, not a throw.
                    Err(err) => {
                        tracing::warn!(field, %pattern, error = %err, "invalid regex in pattern constraint");
                        self.error(field, format!("{} has an invalid format", field))
                    }
                }
            }
            ConstraintKind::Email => {
                if patterns::is_email(&coerce_to_string(value)) {
                    None
                } else {
                    self.error(field, format!("{} must be a valid email address", field))
                }
            }
            ConstraintKind::Phone => {
                if patterns::is_phone(&coerce_to_string(value)) {
                    None
                } else {
                    self.error(field, format!("{} must be a valid phone number", field))
                }
            }
            ConstraintKind::Url => {
                // Only non-empty input can fail a URL parse.
                if is_empty_value(value) || patterns::is_url(&coerce_to_string(value)) {
                    None
                } else {
                    self.error(field, format!("{} must be a valid URL", field))
                }
            }
            // Custom constraints need external logic the engine does not
            // have; they never fail on their own. This is a known gap in
            // the rule model, kept visible rather than silently resolved.
            ConstraintKind::Custom => None,
            ConstraintKind::Unknown => {
                tracing::warn!(field, "unknown constraint kind; skipping");
                None
            }
        }
    }

    fn error(&self, field: &str, default_message: String) -> Option<ValidationError> {
        Some(ValidationError {
            field: field.to_string(),
            constraint: self.kind,
            message: self.message.clone().unwrap_or(default_message),
        })
    }

    fn length_param(&self, field: &str) -> Option<usize> {
        match coerce_to_number(self.value.as_ref()) {
            Some(n) if n >= 0.0 => Some(n as usize),
            _ => {
                tracing::warn!(field, kind = ?self.kind, "length constraint without a usable bound; skipping");
                None
            }
        }
    }

    fn numeric_param(&self, field: &str) -> Option<f64> {
        match coerce_to_number(self.value.as_ref()) {
            Some(n) => Some(n),
            None => {
                tracing::warn!(field, kind = ?self.kind, "numeric constraint without a usable bound; skipping");
                None
            }
        }
    }
}
