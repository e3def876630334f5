//! Rule set parsing from JSON/YAML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::rule::Rule;

/// Errors that can occur when parsing rule sets.
#[derive(Error, Debug)]
pub enum RuleSetError {
    #[error("Failed to read rule set file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Rule set validation failed: {0}")]
    ValidationError(String),
}

/// A serializable set of rules with an id and version.
///
/// Round-trips losslessly through JSON and YAML; the rule builder that
/// authored a rule set must be able to read it back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleSet {
    /// Stable identifier for this rule set.
    pub id: String,

    /// Display name, if the author set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Monotonically increasing version of the stored document.
    pub version: u32,

    /// Ordered rule list. Order matters: it breaks priority ties.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// An empty rule set: the backward-compatible permissive default for
    /// flows that have no rules yet.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            version: 1,
            rules: Vec::new(),
        }
    }

    /// Parse a rule set from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RuleSetError> {
        let rule_set: RuleSet = serde_json::from_str(json)?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Parse a rule set from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleSetError> {
        let rule_set: RuleSet = serde_yaml::from_str(yaml)?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Parse a rule set from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a rule set from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a rule set leniently: malformed rules are skipped with a
    /// diagnostic instead of failing the whole document.
    ///
    /// This is the loading mode for documents authored by newer builders:
    /// one unrecognized rule must never halt evaluation of its siblings.
    pub fn from_json_value_lenient(value: &serde_json::Value) -> Result<Self, RuleSetError> {
        #[derive(Deserialize)]
        struct Header {
            id: String,
            #[serde(default)]
            name: Option<String>,
            version: u32,
            #[serde(default)]
            rules: Vec<serde_json::Value>,
        }

        let header: Header = serde_json::from_value(value.clone())?;
        let mut rules = Vec::with_capacity(header.rules.len());
        for (index, raw) in header.rules.iter().enumerate() {
            match serde_json::from_value::<Rule>(raw.clone()) {
                Ok(rule) => rules.push(rule),
                Err(err) => {
                    tracing::warn!(rule_set = %header.id, index, error = %err, "skipping malformed rule");
                }
            }
        }

        let rule_set = RuleSet {
            id: header.id,
            name: header.name,
            version: header.version,
            rules,
        };
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Validate the rule set structure.
    fn validate(&self) -> Result<(), RuleSetError> {
        if self.id.is_empty() {
            return Err(RuleSetError::ValidationError(
                "rule set id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, Operator};
    use crate::constraint::{ConstraintKind, ValidationConstraint};
    use crate::rule::{ProgressionGate, RuleTarget};
    use serde_json::json;

    const VALID_RULESET: &str = r#"
id: "signup-flow"
name: "Signup"
version: 3
rules:
  - type: visibility
    target: { kind: step, id: "billing" }
    condition:
      type: field
      field: plan
      operator: equals
      value: paid
  - type: validation
    field: email
    constraint: { type: email }
  - type: progression
    intent: submit
    condition:
      type: field
      field: terms
      operator: equals
      value: accepted
    blocked_reason: "Accept the terms first"
"#;

    #[test]
    fn test_parse_valid_ruleset() {
        let rule_set = RuleSet::from_yaml(VALID_RULESET).unwrap();
        assert_eq!(rule_set.id, "signup-flow");
        assert_eq!(rule_set.version, 3);
        assert_eq!(rule_set.rules.len(), 3);
    }

    #[test]
    fn test_empty_id_fails() {
        let result = RuleSet::from_json(r#"{ "id": "", "version": 1, "rules": [] }"#);
        assert!(matches!(result, Err(RuleSetError::ValidationError(_))));
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let rule_set = RuleSet {
            id: "rt".to_string(),
            name: Some("Round trip".to_string()),
            version: 7,
            rules: vec![
                Rule::Visibility {
                    target: RuleTarget::Element {
                        id: "coupon-input".to_string(),
                    },
                    condition: Condition::field("has_coupon", Operator::Equals, Some(json!("yes"))),
                    priority: 2,
                },
                Rule::Validation {
                    field: "age".to_string(),
                    constraint: ValidationConstraint::with_value(ConstraintKind::MinValue, json!(18)),
                    when: None,
                    priority: 0,
                },
                Rule::Progression {
                    gate: ProgressionGate::Goto {
                        step_id: "review".to_string(),
                    },
                    condition: Condition::always(false),
                    blocked_reason: None,
                    priority: -1,
                },
            ],
        };

        let json = serde_json::to_string(&rule_set).unwrap();
        assert_eq!(RuleSet::from_json(&json).unwrap(), rule_set);

        let yaml = serde_yaml::to_string(&rule_set).unwrap();
        assert_eq!(RuleSet::from_yaml(&yaml).unwrap(), rule_set);
    }

    #[test]
    fn test_lenient_parse_skips_malformed_rules() {
        let value = json!({
            "id": "mixed",
            "version": 1,
            "rules": [
                { "type": "validation", "field": "email", "constraint": { "type": "email" } },
                { "type": "teleport", "somewhere": "else" },
                { "type": "visibility" },
                {
                    "type": "progression",
                    "intent": "next",
                    "condition": { "type": "always", "result": true }
                }
            ]
        });

        let rule_set = RuleSet::from_json_value_lenient(&value).unwrap();
        assert_eq!(rule_set.rules.len(), 2);
    }

    #[test]
    fn test_strict_parse_rejects_unknown_rule_kind() {
        let json = r#"{
            "id": "strict",
            "version": 1,
            "rules": [ { "type": "teleport" } ]
        }"#;
        assert!(matches!(
            RuleSet::from_json(json),
            Err(RuleSetError::JsonError(_))
        ));
    }
}
