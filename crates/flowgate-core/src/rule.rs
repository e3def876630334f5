//! Rule model.
//!
//! Rules are the unit the visual builder authors: a flat list of tagged
//! variants, each carrying an optional integer priority (default 0).
//! The three kinds feed the three evaluation phases in
//! [`crate::evaluator`].

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::constraint::ValidationConstraint;

/// What a visibility rule applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleTarget {
    /// A whole step.
    Step { id: String },
    /// A single element within a step.
    Element { id: String },
}

impl RuleTarget {
    pub fn id(&self) -> &str {
        match self {
            RuleTarget::Step { id } | RuleTarget::Element { id } => id,
        }
    }
}

/// Which progression intent a rule gates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ProgressionGate {
    /// Gates advancing to the next step.
    Next,
    /// Gates moving back to the previous step.
    Prev,
    /// Gates jumping directly to one specific step.
    Goto { step_id: String },
    /// Gates submission.
    Submit,
}

/// A single rule authored by the visual builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Sets the visibility flag of a step or element to the condition's
    /// result. Applied in ascending priority order; the last application
    /// for a target wins.
    Visibility {
        target: RuleTarget,
        condition: Condition,
        #[serde(default)]
        priority: i64,
    },

    /// Applies a constraint to a field, optionally gated by a `when`
    /// condition. Errors accumulate; order does not matter.
    Validation {
        field: String,
        constraint: ValidationConstraint,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        when: Option<Condition>,
        #[serde(default)]
        priority: i64,
    },

    /// Permits or blocks one progression intent. Applied in ascending
    /// priority order; later applications win.
    Progression {
        #[serde(flatten)]
        gate: ProgressionGate,
        condition: Condition,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        blocked_reason: Option<String>,
        #[serde(default)]
        priority: i64,
    },
}

impl Rule {
    /// The rule's priority (default 0).
    pub fn priority(&self) -> i64 {
        match self {
            Rule::Visibility { priority, .. }
            | Rule::Validation { priority, .. }
            | Rule::Progression { priority, .. } => *priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Operator;
    use crate::constraint::ConstraintKind;
    use serde_json::json;

    #[test]
    fn test_visibility_rule_round_trip() {
        let rule = Rule::Visibility {
            target: RuleTarget::Step {
                id: "step-2".to_string(),
            },
            condition: Condition::field("age", Operator::GreaterThanOrEqual, Some(json!(18))),
            priority: 5,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "visibility");
        assert_eq!(json["target"]["kind"], "step");
        let back: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(rule, back);
    }

    #[test]
    fn test_validation_rule_round_trip() {
        let rule = Rule::Validation {
            field: "email".to_string(),
            constraint: ValidationConstraint::new(ConstraintKind::Email),
            when: Some(Condition::field("wants_newsletter", Operator::Equals, Some(json!("yes")))),
            priority: 0,
        };
        let json = serde_json::to_value(&rule).unwrap();
        let back: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(rule, back);
    }

    #[test]
    fn test_progression_goto_flattens_intent() {
        let rule = Rule::Progression {
            gate: ProgressionGate::Goto {
                step_id: "review".to_string(),
            },
            condition: Condition::always(false),
            blocked_reason: Some("Finish the basics first".to_string()),
            priority: 1,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "progression");
        assert_eq!(json["intent"], "goto");
        assert_eq!(json["step_id"], "review");
        let back: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(rule, back);
    }

    #[test]
    fn test_priority_defaults_to_zero() {
        let rule: Rule = serde_json::from_str(
            r#"{
                "type": "progression",
                "intent": "submit",
                "condition": { "type": "always", "result": true }
            }"#,
        )
        .unwrap();
        assert_eq!(rule.priority(), 0);
    }
}
