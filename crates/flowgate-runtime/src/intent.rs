//! The intent surface.
//!
//! An intent is a request from the UI layer to change step position,
//! submit, or trigger a host-side action. Intents are the only way to
//! move through a flow; the orchestrator decides each one and always
//! answers with an [`IntentOutcome`].

use serde::{Deserialize, Serialize};

use flowgate_core::ValueMap;

/// A request emitted by the UI layer.
///
/// Serialized with a kebab-case `type` tag and camelCase fields, matching
/// the transport format the rendering layer speaks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Intent {
    /// Advance to the next step (implicit submit on the last step).
    NextStep,

    /// Move back to the previous step.
    PrevStep,

    /// Jump directly to a specific step.
    GoToStep { step_id: String },

    /// Submit the flow, optionally merging extra values first.
    Submit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<ValueMap>,
    },

    /// Open a URL. Side effect performed by the host.
    Url {
        url: String,
        #[serde(default)]
        open_new_tab: bool,
    },

    /// Scroll the given selector into view.
    Scroll { selector: String },

    /// Dial a phone number.
    Phone { number: String },

    /// Open the mail client.
    Email { address: String },

    /// Trigger a file download.
    Download { url: String },
}

impl Intent {
    /// Whether this intent is a host-side action rather than a step
    /// progression. External actions are outside the engine's
    /// jurisdiction and are never gated.
    pub fn is_external_action(&self) -> bool {
        matches!(
            self,
            Intent::Url { .. }
                | Intent::Scroll { .. }
                | Intent::Phone { .. }
                | Intent::Email { .. }
                | Intent::Download { .. }
        )
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::NextStep => "next-step",
            Intent::PrevStep => "prev-step",
            Intent::GoToStep { .. } => "go-to-step",
            Intent::Submit { .. } => "submit",
            Intent::Url { .. } => "url",
            Intent::Scroll { .. } => "scroll",
            Intent::Phone { .. } => "phone",
            Intent::Email { .. } => "email",
            Intent::Download { .. } => "download",
        }
    }
}

/// The orchestrator's answer to one intent. Every emitted intent gets
/// one; there is no silent no-op path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentOutcome {
    /// Whether the intent was executed.
    pub executed: bool,

    /// Why the intent was rejected, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,

    /// The intent this outcome answers.
    pub intent: Intent,
}

impl IntentOutcome {
    pub fn executed(intent: Intent) -> Self {
        Self {
            executed: true,
            blocked_reason: None,
            intent,
        }
    }

    pub fn blocked(intent: Intent, reason: impl Into<String>) -> Self {
        Self {
            executed: false,
            blocked_reason: Some(reason.into()),
            intent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_wire_format() {
        let intent = Intent::GoToStep {
            step_id: "review".to_string(),
        };
        let value = serde_json::to_value(&intent).unwrap();
        assert_eq!(value, json!({ "type": "go-to-step", "stepId": "review" }));

        let intent = Intent::Url {
            url: "https://example.com".to_string(),
            open_new_tab: true,
        };
        let value = serde_json::to_value(&intent).unwrap();
        assert_eq!(
            value,
            json!({ "type": "url", "url": "https://example.com", "openNewTab": true })
        );
    }

    #[test]
    fn test_intent_round_trip() {
        let intents = vec![
            Intent::NextStep,
            Intent::PrevStep,
            Intent::Submit { values: None },
            Intent::Scroll {
                selector: "#section-2".to_string(),
            },
            Intent::Phone {
                number: "+1 555 123 4567".to_string(),
            },
            Intent::Email {
                address: "help@example.com".to_string(),
            },
            Intent::Download {
                url: "https://example.com/file.pdf".to_string(),
            },
        ];
        for intent in intents {
            let json = serde_json::to_string(&intent).unwrap();
            let back: Intent = serde_json::from_str(&json).unwrap();
            assert_eq!(intent, back);
        }
    }

    #[test]
    fn test_external_action_classification() {
        assert!(!Intent::NextStep.is_external_action());
        assert!(!Intent::Submit { values: None }.is_external_action());
        assert!(Intent::Url {
            url: "https://example.com".to_string(),
            open_new_tab: false
        }
        .is_external_action());
        assert!(Intent::Download {
            url: "x".to_string()
        }
        .is_external_action());
    }
}
