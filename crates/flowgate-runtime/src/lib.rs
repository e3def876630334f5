//! # flowgate-runtime
//!
//! Intent-gated step orchestrator for Flowgate.
//!
//! This crate owns the stateful half of the engine: one
//! [`FlowOrchestrator`] per running flow instance, holding step order,
//! the current step pointer, and the collected values. All mutation goes
//! through its setters and [`FlowOrchestrator::emit_intent`]; the
//! rendering layer reads the snapshot and never writes.
//!
//! ## Key Guarantees
//!
//! 1. **Single choke point**: step position and submission change only
//!    through `emit_intent`, which always returns a structured outcome
//! 2. **Snapshot consistency**: every mutating setter re-derives the
//!    snapshot before returning
//! 3. **Auto-correction**: the pointer never rests on a step that rules
//!    have hidden (unless no step is visible at all)
//! 4. **Synchronous**: no suspension points, no background tasks; a
//!    multi-threaded host serializes access at its own boundary
//!
//! ## Example
//!
//! ```rust,ignore
//! use flowgate_runtime::{FlowOrchestrator, Intent};
//!
//! let mut flow = FlowOrchestrator::builder()
//!     .steps(steps)
//!     .rule_set(rule_set)
//!     .interactive(true)
//!     .on_submit(|values| println!("submitted {} fields", values.len()))
//!     .build();
//!
//! flow.set_value("email", "user@example.com".into());
//! let outcome = flow.emit_intent(Intent::NextStep);
//! if !outcome.executed {
//!     eprintln!("blocked: {:?}", outcome.blocked_reason);
//! }
//! ```

pub mod intent;
pub mod orchestrator;

// Re-export main types at crate root
pub use intent::{Intent, IntentOutcome};
pub use orchestrator::{FlowOrchestrator, FlowOrchestratorBuilder, EDIT_MODE_REASON};

// The core types callers need alongside the orchestrator.
pub use flowgate_core::{EvaluationSnapshot, FlowStep, RuleSet, ValueMap};
