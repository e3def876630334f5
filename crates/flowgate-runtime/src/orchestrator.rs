//! The step orchestrator.
//!
//! The orchestrator owns step order, the current step pointer, and the
//! collected field values. It is the single writer: the UI layer mutates
//! state only through the setters and [`FlowOrchestrator::emit_intent`],
//! and reads the snapshot back. Every mutation recomputes the snapshot
//! before returning, so the snapshot is always consistent with the
//! latest committed state.
//!
//! Everything here is synchronous and single-threaded. A multi-threaded
//! host must serialize access to one orchestrator instance at its own
//! boundary.

use flowgate_core::{
    evaluate_rule_set, EvaluationContext, EvaluationSnapshot, FlowStep, RuleSet, ValueMap,
    RULE_BLOCKED_REASON, VALIDATION_BLOCKED_REASON,
};

use crate::intent::{Intent, IntentOutcome};

/// Reason for rejecting progression intents while not interactive.
pub const EDIT_MODE_REASON: &str = "Step navigation is disabled in edit mode";

const FIRST_STEP_REASON: &str = "Already on the first step";
const NO_ACTIVE_STEP_REASON: &str = "No step is currently active";

type SubmitHook = Box<dyn FnMut(&ValueMap)>;
type StepChangeHook = Box<dyn FnMut(&str, usize)>;
type RejectedHook = Box<dyn FnMut(&Intent, &str)>;
type ActionHook = Box<dyn FnMut(&Intent)>;

/// Stateful owner of one flow instance.
///
/// Construct via [`FlowOrchestratorBuilder`].
pub struct FlowOrchestrator {
    steps: Vec<FlowStep>,
    current_step_id: Option<String>,
    values: ValueMap,
    rule_set: RuleSet,
    interactive: bool,
    snapshot: EvaluationSnapshot,
    last_blocked_reason: Option<String>,

    on_submit: Option<SubmitHook>,
    on_step_change: Option<StepChangeHook>,
    on_intent_rejected: Option<RejectedHook>,
    on_external_action: Option<ActionHook>,
}

impl FlowOrchestrator {
    /// Start building an orchestrator.
    pub fn builder() -> FlowOrchestratorBuilder {
        FlowOrchestratorBuilder::new()
    }

    // ------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------

    /// The latest evaluation snapshot. Always consistent with the last
    /// committed state.
    pub fn snapshot(&self) -> &EvaluationSnapshot {
        &self.snapshot
    }

    pub fn current_step_id(&self) -> Option<&str> {
        self.current_step_id.as_deref()
    }

    pub fn current_step(&self) -> Option<&FlowStep> {
        let id = self.current_step_id.as_deref()?;
        self.steps.iter().find(|s| s.id == id)
    }

    /// Configured steps, in flow order.
    pub fn steps(&self) -> &[FlowStep] {
        &self.steps
    }

    /// Steps currently visible under the latest snapshot, in flow order.
    pub fn visible_steps(&self) -> Vec<&FlowStep> {
        self.steps
            .iter()
            .filter(|s| self.snapshot.visibility.is_step_visible(&s.id))
            .collect()
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    /// Why the most recent intent was rejected, if it was. Cleared by
    /// the next successful intent.
    pub fn last_blocked_reason(&self) -> Option<&str> {
        self.last_blocked_reason.as_deref()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    // ------------------------------------------------------------------
    // Mutation surface
    // ------------------------------------------------------------------

    /// Record one field value.
    pub fn set_value(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.values.insert(key.into(), value);
        self.recompute();
    }

    /// Merge a batch of field values.
    pub fn set_values(&mut self, values: ValueMap) {
        self.values.extend(values);
        self.recompute();
    }

    /// Replace the step list. If the current step no longer exists the
    /// pointer resets to the new first step.
    pub fn set_steps(&mut self, steps: Vec<FlowStep>) {
        self.steps = steps;
        let current_exists = self
            .current_step_id
            .as_ref()
            .is_some_and(|id| self.steps.iter().any(|s| s.id == *id));
        if !current_exists {
            self.current_step_id = self.steps.first().map(|s| s.id.clone());
        }
        self.recompute();
    }

    /// Replace the rule set.
    pub fn set_rule_set(&mut self, rule_set: RuleSet) {
        self.rule_set = rule_set;
        self.recompute();
    }

    /// Switch between authoring (false) and end-user (true) mode.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Clear collected values and return to the first step.
    pub fn reset(&mut self) {
        self.values.clear();
        self.current_step_id = self.steps.first().map(|s| s.id.clone());
        self.last_blocked_reason = None;
        self.recompute();
    }

    /// Process one intent. The only way to change step position or
    /// trigger submission; always returns an outcome, never no-ops.
    pub fn emit_intent(&mut self, intent: Intent) -> IntentOutcome {
        if intent.is_external_action() {
            // External actions are side effects outside the engine's
            // jurisdiction; they fire in either mode, ungated.
            tracing::debug!(intent = intent.label(), "dispatching external action");
            if let Some(hook) = self.on_external_action.as_mut() {
                hook(&intent);
            }
            self.last_blocked_reason = None;
            return IntentOutcome::executed(intent);
        }

        if !self.interactive {
            return self.reject(intent, EDIT_MODE_REASON.to_string());
        }

        let result = match &intent {
            Intent::NextStep => self.handle_next(),
            Intent::PrevStep => self.handle_prev(),
            Intent::GoToStep { step_id } => {
                let step_id = step_id.clone();
                self.handle_goto(&step_id)
            }
            Intent::Submit { values } => {
                let values = values.clone();
                self.handle_submit(values)
            }
            // External actions returned above.
            _ => Err(format!("Unsupported intent: {}", intent.label())),
        };

        match result {
            Ok(()) => {
                self.last_blocked_reason = None;
                IntentOutcome::executed(intent)
            }
            Err(reason) => self.reject(intent, reason),
        }
    }

    // ------------------------------------------------------------------
    // Intent handlers
    // ------------------------------------------------------------------

    fn handle_next(&mut self) -> Result<(), String> {
        if !self.snapshot.progression.can_go_next {
            return Err(self
                .snapshot
                .progression
                .next_blocked_reason
                .clone()
                .unwrap_or_else(|| RULE_BLOCKED_REASON.to_string()));
        }
        // A progression rule may have re-opened `next` despite errors;
        // the orchestrator still refuses to walk past invalid input.
        if !self.snapshot.validation.is_valid {
            return Err(VALIDATION_BLOCKED_REASON.to_string());
        }

        let index = self.current_index().ok_or(NO_ACTIVE_STEP_REASON)?;
        if index + 1 < self.steps.len() {
            let next_id = self.steps[index + 1].id.clone();
            self.move_to(&next_id);
        } else {
            // Last configured step: next is an implicit submit.
            self.fire_submit(None);
        }
        Ok(())
    }

    fn handle_prev(&mut self) -> Result<(), String> {
        if !self.snapshot.progression.can_go_prev {
            return Err(self
                .snapshot
                .progression
                .prev_blocked_reason
                .clone()
                .unwrap_or_else(|| RULE_BLOCKED_REASON.to_string()));
        }

        let index = self.current_index().ok_or(NO_ACTIVE_STEP_REASON)?;
        if index == 0 {
            return Err(FIRST_STEP_REASON.to_string());
        }
        let prev_id = self.steps[index - 1].id.clone();
        self.move_to(&prev_id);
        Ok(())
    }

    fn handle_goto(&mut self, step_id: &str) -> Result<(), String> {
        if let Some(gate) = self.snapshot.progression.go_to.get(step_id) {
            if !gate.allowed {
                return Err(gate
                    .reason
                    .clone()
                    .unwrap_or_else(|| RULE_BLOCKED_REASON.to_string()));
            }
        }

        let configured = self.steps.iter().any(|s| s.id == step_id);
        if !configured || !self.snapshot.visibility.is_step_visible(step_id) {
            return Err(format!("Step '{}' is not currently available", step_id));
        }

        self.move_to(step_id);
        Ok(())
    }

    fn handle_submit(&mut self, values: Option<ValueMap>) -> Result<(), String> {
        if !self.snapshot.progression.can_submit {
            return Err(self
                .snapshot
                .progression
                .submit_blocked_reason
                .clone()
                .unwrap_or_else(|| RULE_BLOCKED_REASON.to_string()));
        }
        if !self.snapshot.validation.is_valid {
            return Err(VALIDATION_BLOCKED_REASON.to_string());
        }

        self.fire_submit(values);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn current_index(&self) -> Option<usize> {
        let id = self.current_step_id.as_deref()?;
        self.steps.iter().position(|s| s.id == id)
    }

    fn move_to(&mut self, step_id: &str) {
        self.current_step_id = Some(step_id.to_string());
        self.notify_step_change(step_id);
    }

    /// Notify the host of a pointer move, reporting the step's index
    /// within the *visible* list.
    fn notify_step_change(&mut self, step_id: &str) {
        let visible_index = self
            .steps
            .iter()
            .filter(|s| self.snapshot.visibility.is_step_visible(&s.id))
            .position(|s| s.id == step_id)
            .unwrap_or(0);
        if let Some(hook) = self.on_step_change.as_mut() {
            hook(step_id, visible_index);
        }
    }

    fn fire_submit(&mut self, extra: Option<ValueMap>) {
        if let Some(extra) = extra {
            self.values.extend(extra);
            self.recompute();
        }
        tracing::debug!(fields = self.values.len(), "submitting flow");
        if let Some(hook) = self.on_submit.as_mut() {
            hook(&self.values);
        }
    }

    fn reject(&mut self, intent: Intent, reason: String) -> IntentOutcome {
        tracing::debug!(intent = intent.label(), %reason, "intent rejected");
        self.last_blocked_reason = Some(reason.clone());
        if let Some(hook) = self.on_intent_rejected.as_mut() {
            hook(&intent, &reason);
        }
        IntentOutcome::blocked(intent, reason)
    }

    /// Re-derive the snapshot from the current state, then relocate the
    /// pointer if its step became invisible.
    fn recompute(&mut self) {
        let ctx = EvaluationContext::from_steps(&self.steps, self.values.clone());
        self.snapshot = evaluate_rule_set(&self.rule_set, &ctx);
        self.auto_correct_position();
    }

    /// If the current step is no longer visible, move to the nearest
    /// visible step: forward in flow order first, then backward. When no
    /// step is visible at all the pointer stays where it is.
    fn auto_correct_position(&mut self) {
        let Some(current) = self.current_step_id.clone() else {
            return;
        };
        if self.snapshot.visibility.is_step_visible(&current) {
            return;
        }
        let Some(index) = self.steps.iter().position(|s| s.id == current) else {
            return;
        };

        let forward = self.steps[index + 1..]
            .iter()
            .find(|s| self.snapshot.visibility.is_step_visible(&s.id));
        let backward = self.steps[..index]
            .iter()
            .rev()
            .find(|s| self.snapshot.visibility.is_step_visible(&s.id));

        match forward.or(backward) {
            Some(step) => {
                let target = step.id.clone();
                tracing::debug!(from = %current, to = %target, "current step hidden; relocating");
                self.current_step_id = Some(target.clone());
                self.notify_step_change(&target);
            }
            None => {
                // No visible step exists; leave the pointer untouched.
                tracing::debug!(step = %current, "no visible step to relocate to");
            }
        }
    }
}

/// Builder for [`FlowOrchestrator`].
pub struct FlowOrchestratorBuilder {
    steps: Vec<FlowStep>,
    current_step_id: Option<String>,
    rule_set: RuleSet,
    interactive: bool,
    on_submit: Option<SubmitHook>,
    on_step_change: Option<StepChangeHook>,
    on_intent_rejected: Option<RejectedHook>,
    on_external_action: Option<ActionHook>,
}

impl FlowOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            current_step_id: None,
            rule_set: RuleSet::empty("default"),
            interactive: false,
            on_submit: None,
            on_step_change: None,
            on_intent_rejected: None,
            on_external_action: None,
        }
    }

    /// Initial step list.
    pub fn steps(mut self, steps: Vec<FlowStep>) -> Self {
        self.steps = steps;
        self
    }

    /// Initial current step (defaults to the first step).
    pub fn current_step(mut self, step_id: impl Into<String>) -> Self {
        self.current_step_id = Some(step_id.into());
        self
    }

    /// Initial rule set (defaults to empty, i.e. fully permissive).
    pub fn rule_set(mut self, rule_set: RuleSet) -> Self {
        self.rule_set = rule_set;
        self
    }

    /// Start in end-user mode (defaults to authoring mode).
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Callback invoked with the merged value map on submission.
    pub fn on_submit(mut self, hook: impl FnMut(&ValueMap) + 'static) -> Self {
        self.on_submit = Some(Box::new(hook));
        self
    }

    /// Callback invoked with (step id, index in the visible list) on
    /// every pointer move, intent-driven or auto-corrective.
    pub fn on_step_change(mut self, hook: impl FnMut(&str, usize) + 'static) -> Self {
        self.on_step_change = Some(Box::new(hook));
        self
    }

    /// Callback invoked with (intent, reason) on every rejection. For
    /// logging only; the outcome already carries the reason.
    pub fn on_intent_rejected(mut self, hook: impl FnMut(&Intent, &str) + 'static) -> Self {
        self.on_intent_rejected = Some(Box::new(hook));
        self
    }

    /// Callback invoked for external-action intents. The host performs
    /// the actual side effect; the engine does no I/O.
    pub fn on_external_action(mut self, hook: impl FnMut(&Intent) + 'static) -> Self {
        self.on_external_action = Some(Box::new(hook));
        self
    }

    /// Build the orchestrator with a freshly computed snapshot.
    pub fn build(self) -> FlowOrchestrator {
        let current_step_id = self
            .current_step_id
            .filter(|id| self.steps.iter().any(|s| s.id == *id))
            .or_else(|| self.steps.first().map(|s| s.id.clone()));

        let mut orchestrator = FlowOrchestrator {
            steps: self.steps,
            current_step_id,
            values: ValueMap::new(),
            rule_set: self.rule_set,
            interactive: self.interactive,
            snapshot: EvaluationSnapshot::permissive(&[], &[]),
            last_blocked_reason: None,
            on_submit: self.on_submit,
            on_step_change: self.on_step_change,
            on_intent_rejected: self.on_intent_rejected,
            on_external_action: self.on_external_action,
        };
        orchestrator.recompute();
        orchestrator
    }
}

impl Default for FlowOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
