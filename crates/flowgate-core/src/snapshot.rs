//! Evaluation snapshot: the engine's sole output object.
//!
//! A snapshot is immutable once produced. The rendering layer reads it
//! to derive disabled/error/visibility states and never writes back.
//! All maps are `BTreeMap` so identical inputs serialize byte-identically
//! apart from `evaluated_at`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constraint::ValidationError;

/// Visibility flags per step and per element id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibilitySnapshot {
    pub steps: BTreeMap<String, bool>,
    pub elements: BTreeMap<String, bool>,
}

impl VisibilitySnapshot {
    /// Whether a step is visible. Ids outside the known universe default
    /// to visible, matching the permissive baseline.
    pub fn is_step_visible(&self, step_id: &str) -> bool {
        self.steps.get(step_id).copied().unwrap_or(true)
    }

    pub fn is_element_visible(&self, element_id: &str) -> bool {
        self.elements.get(element_id).copied().unwrap_or(true)
    }
}

/// Accumulated validation state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationSnapshot {
    /// True iff no rule produced an error.
    pub is_valid: bool,

    /// Errors grouped by field key.
    pub by_field: BTreeMap<String, Vec<ValidationError>>,

    /// All errors in rule-list order.
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationSnapshot {
    fn default() -> Self {
        Self {
            is_valid: true,
            by_field: BTreeMap::new(),
            errors: Vec::new(),
        }
    }
}

/// Gate for one `goto` target step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepGate {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Progression permissions. Defaults are fully permissive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressionSnapshot {
    pub can_go_next: bool,
    pub can_go_prev: bool,
    pub can_submit: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_blocked_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_blocked_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_blocked_reason: Option<String>,

    /// Per-target gates populated by `goto` progression rules. Steps
    /// without an entry are not restricted by any rule.
    pub go_to: BTreeMap<String, StepGate>,
}

impl Default for ProgressionSnapshot {
    fn default() -> Self {
        Self {
            can_go_next: true,
            can_go_prev: true,
            can_submit: true,
            next_blocked_reason: None,
            prev_blocked_reason: None,
            submit_blocked_reason: None,
            go_to: BTreeMap::new(),
        }
    }
}

impl ProgressionSnapshot {
    /// Whether a `goto` to this step is permitted. Absent entries are
    /// permitted; only an explicit `allowed: false` gate blocks.
    pub fn can_go_to_step(&self, step_id: &str) -> bool {
        self.go_to.get(step_id).map(|g| g.allowed).unwrap_or(true)
    }
}

/// The complete, immutable output of one rule evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationSnapshot {
    pub visibility: VisibilitySnapshot,
    pub validation: ValidationSnapshot,
    pub progression: ProgressionSnapshot,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationSnapshot {
    /// The canonical fully-permissive snapshot for a given id universe:
    /// everything visible, no errors, all progression allowed.
    ///
    /// This is the required result of evaluating an empty rule list, and
    /// the backward-compatible default for flows without rules.
    pub fn permissive(step_ids: &[String], element_ids: &[String]) -> Self {
        Self {
            visibility: VisibilitySnapshot {
                steps: step_ids.iter().map(|id| (id.clone(), true)).collect(),
                elements: element_ids.iter().map(|id| (id.clone(), true)).collect(),
            },
            validation: ValidationSnapshot::default(),
            progression: ProgressionSnapshot::default(),
            evaluated_at: Utc::now(),
        }
    }

    /// Structural equality ignoring the timestamp. Two evaluations of
    /// the same inputs must be identical under this comparison.
    pub fn same_result(&self, other: &Self) -> bool {
        self.visibility == other.visibility
            && self.validation == other.validation
            && self.progression == other.progression
    }
}
