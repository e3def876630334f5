//! Flow steps and the evaluation context.

use serde::{Deserialize, Serialize};

use crate::value::ValueMap;

/// One step of a flow.
///
/// Steps are created and edited by the authoring layer; the engine only
/// reads their ids and element membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowStep {
    /// Stable identifier, unique within a flow.
    pub id: String,

    /// Display name, if the author set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Ids of the elements placed on this step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<String>,
}

impl FlowStep {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            elements: Vec::new(),
        }
    }

    pub fn with_elements(id: impl Into<String>, elements: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            elements,
        }
    }
}

/// Everything the rule evaluator needs: the collected values plus the
/// full universe of step and element ids.
///
/// A snapshot is a pure function of this context and the rule list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    pub values: ValueMap,
    pub step_ids: Vec<String>,
    pub element_ids: Vec<String>,
}

impl EvaluationContext {
    pub fn new(values: ValueMap, step_ids: Vec<String>, element_ids: Vec<String>) -> Self {
        Self {
            values,
            step_ids,
            element_ids,
        }
    }

    /// Build a context from a step list, deriving the element universe
    /// from step membership.
    pub fn from_steps(steps: &[FlowStep], values: ValueMap) -> Self {
        Self {
            values,
            step_ids: steps.iter().map(|s| s.id.clone()).collect(),
            element_ids: steps
                .iter()
                .flat_map(|s| s.elements.iter().cloned())
                .collect(),
        }
    }
}
