//! # flowgate-core
//!
//! Deterministic flow progression rule engine.
//!
//! This crate provides the pure evaluation half of Flowgate, answering:
//! - Which steps and elements are visible right now?
//! - Which field values are invalid, and why?
//! - May the user go next, go back, jump, or submit?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same (rules, values, id universe) always
//!    produces the same snapshot, apart from its timestamp
//! 2. **Side-effect free**: No I/O, no shared state; safe to re-run on
//!    every keystroke
//! 3. **Fail closed**: Malformed rule data evaluates to "no match",
//!    never an exception
//! 4. **Serializable**: Rule sets round-trip losslessly through
//!    JSON/YAML for storage and transport
//!
//! ## Example
//!
//! ```rust,ignore
//! use flowgate_core::{evaluate_rule_set, EvaluationContext, RuleSet};
//!
//! let rule_set = RuleSet::from_json_file("ruleset.json")?;
//! let ctx = EvaluationContext::from_steps(&steps, values);
//! let snapshot = evaluate_rule_set(&rule_set, &ctx);
//!
//! if snapshot.progression.can_submit {
//!     println!("ready to submit");
//! }
//! ```

pub mod condition;
pub mod constraint;
pub mod evaluator;
pub mod patterns;
pub mod rule;
pub mod ruleset;
pub mod snapshot;
pub mod step;
pub mod value;

// Re-export main types at crate root
pub use condition::{Condition, Operator};
pub use constraint::{ConstraintKind, ValidationConstraint, ValidationError};
pub use evaluator::{evaluate, evaluate_rule_set, RULE_BLOCKED_REASON, VALIDATION_BLOCKED_REASON};
pub use rule::{ProgressionGate, Rule, RuleTarget};
pub use ruleset::{validate_ruleset_schema, RuleSet, RuleSetError};
pub use snapshot::{
    EvaluationSnapshot, ProgressionSnapshot, StepGate, ValidationSnapshot, VisibilitySnapshot,
};
pub use step::{EvaluationContext, FlowStep};
pub use value::ValueMap;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_evaluation() {
        let rule_set = RuleSet::from_yaml(
            r#"
id: "contact-flow"
version: 1
rules:
  - type: validation
    field: email
    constraint: { type: email }
  - type: visibility
    target: { kind: step, id: "details" }
    condition:
      type: field
      field: email
      operator: is_not_empty
"#,
        )
        .unwrap();

        let mut values = ValueMap::new();
        values.insert("email".to_string(), json!("user@example.com"));
        let steps = vec![FlowStep::new("contact"), FlowStep::new("details")];
        let ctx = EvaluationContext::from_steps(&steps, values);

        let snapshot = evaluate_rule_set(&rule_set, &ctx);
        assert!(snapshot.validation.is_valid);
        assert!(snapshot.visibility.is_step_visible("details"));
        assert!(snapshot.progression.can_submit);
    }

    #[test]
    fn test_invalid_email_blocks_submission() {
        let rule_set = RuleSet::from_yaml(
            r#"
id: "contact-flow"
version: 1
rules:
  - type: validation
    field: email
    constraint: { type: email }
"#,
        )
        .unwrap();

        let mut values = ValueMap::new();
        values.insert("email".to_string(), json!("not-an-email"));
        let ctx = EvaluationContext::new(values, vec!["contact".to_string()], vec![]);

        let snapshot = evaluate_rule_set(&rule_set, &ctx);
        assert!(!snapshot.validation.is_valid);
        assert_eq!(snapshot.validation.by_field["email"].len(), 1);
        assert!(!snapshot.progression.can_submit);
        assert!(!snapshot.progression.can_go_next);
    }
}
