//! The rule evaluator.
//!
//! Partitions a rule list by kind and applies the condition and
//! constraint evaluators in a fixed three-phase order: visibility, then
//! validation, then progression. The order is load-bearing: progression
//! defaults depend on the validation outcome.
//!
//! Evaluation is a pure function of (rules, context). It never mutates
//! shared state and is safe to call from anywhere, as often as needed.

use chrono::Utc;

use crate::condition::Condition;
use crate::rule::{ProgressionGate, Rule, RuleTarget};
use crate::ruleset::RuleSet;
use crate::snapshot::{
    EvaluationSnapshot, ProgressionSnapshot, StepGate, ValidationSnapshot, VisibilitySnapshot,
};
use crate::step::EvaluationContext;
use crate::value::ValueMap;

/// Reason used when validation errors force `next`/`submit` closed.
pub const VALIDATION_BLOCKED_REASON: &str = "Fix the validation errors before continuing";

/// Reason used when a progression rule blocks without its own message.
pub const RULE_BLOCKED_REASON: &str = "This action is currently not allowed";

/// Evaluate a rule list against a context, producing one snapshot.
///
/// An empty rule list yields the canonical fully-permissive snapshot.
pub fn evaluate(rules: &[Rule], ctx: &EvaluationContext) -> EvaluationSnapshot {
    let visibility = evaluate_visibility(rules, ctx);
    let validation = evaluate_validation(rules, &ctx.values);
    let progression = evaluate_progression(rules, &ctx.values, validation.is_valid);

    EvaluationSnapshot {
        visibility,
        validation,
        progression,
        evaluated_at: Utc::now(),
    }
}

/// Convenience wrapper for evaluating a whole rule set.
pub fn evaluate_rule_set(rule_set: &RuleSet, ctx: &EvaluationContext) -> EvaluationSnapshot {
    evaluate(&rule_set.rules, ctx)
}

/// Phase 1: visibility.
///
/// Every known id starts visible. Rules apply in ascending priority
/// (stable sort, so list order breaks ties) and each application
/// overwrites any earlier value for the same target.
fn evaluate_visibility(rules: &[Rule], ctx: &EvaluationContext) -> VisibilitySnapshot {
    let mut snapshot = VisibilitySnapshot {
        steps: ctx.step_ids.iter().map(|id| (id.clone(), true)).collect(),
        elements: ctx
            .element_ids
            .iter()
            .map(|id| (id.clone(), true))
            .collect(),
    };

    let mut visibility_rules: Vec<(i64, &RuleTarget, &Condition)> = rules
        .iter()
        .filter_map(|rule| match rule {
            Rule::Visibility {
                target,
                condition,
                priority,
            } => Some((*priority, target, condition)),
            _ => None,
        })
        .collect();
    visibility_rules.sort_by_key(|(priority, _, _)| *priority);

    for (_, target, condition) in visibility_rules {
        let visible = condition.evaluate(&ctx.values);
        match target {
            RuleTarget::Step { id } => {
                snapshot.steps.insert(id.clone(), visible);
            }
            RuleTarget::Element { id } => {
                snapshot.elements.insert(id.clone(), visible);
            }
        }
    }

    snapshot
}

/// Phase 2: validation.
///
/// Errors accumulate in rule-list order; a `when` gate that evaluates
/// false skips its rule entirely.
fn evaluate_validation(rules: &[Rule], values: &ValueMap) -> ValidationSnapshot {
    let mut snapshot = ValidationSnapshot::default();

    for rule in rules {
        let Rule::Validation {
            field,
            constraint,
            when,
            ..
        } = rule
        else {
            continue;
        };

        if let Some(gate) = when {
            if !gate.evaluate(values) {
                continue;
            }
        }

        if let Some(error) = constraint.evaluate(values.get(field), field) {
            snapshot
                .by_field
                .entry(field.clone())
                .or_default()
                .push(error.clone());
            snapshot.errors.push(error);
        }
    }

    snapshot.is_valid = snapshot.errors.is_empty();
    snapshot
}

/// Phase 3: progression.
///
/// Defaults are fully permissive. Failed validation forces `next` and
/// `submit` closed with a fixed reason before any rule runs, so a
/// later rule can still deliberately override. Rules then apply in
/// ascending priority with unconditional overwrite, ties broken by list
/// order.
fn evaluate_progression(rules: &[Rule], values: &ValueMap, is_valid: bool) -> ProgressionSnapshot {
    let mut snapshot = ProgressionSnapshot::default();

    if !is_valid {
        snapshot.can_go_next = false;
        snapshot.next_blocked_reason = Some(VALIDATION_BLOCKED_REASON.to_string());
        snapshot.can_submit = false;
        snapshot.submit_blocked_reason = Some(VALIDATION_BLOCKED_REASON.to_string());
    }

    let mut progression_rules: Vec<(i64, &ProgressionGate, &Condition, Option<&String>)> = rules
        .iter()
        .filter_map(|rule| match rule {
            Rule::Progression {
                gate,
                condition,
                blocked_reason,
                priority,
            } => Some((*priority, gate, condition, blocked_reason.as_ref())),
            _ => None,
        })
        .collect();
    progression_rules.sort_by_key(|(priority, _, _, _)| *priority);

    for (_, gate, condition, blocked_reason) in progression_rules {
        let allowed = condition.evaluate(values);
        let reason = if allowed {
            None
        } else {
            Some(
                blocked_reason
                    .cloned()
                    .unwrap_or_else(|| RULE_BLOCKED_REASON.to_string()),
            )
        };

        match gate {
            ProgressionGate::Next => {
                snapshot.can_go_next = allowed;
                snapshot.next_blocked_reason = reason;
            }
            ProgressionGate::Prev => {
                snapshot.can_go_prev = allowed;
                snapshot.prev_blocked_reason = reason;
            }
            ProgressionGate::Submit => {
                snapshot.can_submit = allowed;
                snapshot.submit_blocked_reason = reason;
            }
            ProgressionGate::Goto { step_id } => {
                snapshot
                    .go_to
                    .insert(step_id.clone(), StepGate { allowed, reason });
            }
        }
    }

    snapshot
}
