//! Outbound response envelope — the canonical shape every turn returns.

use serde::{Deserialize, Serialize};

/// One entry of the ordered action list.
///
/// The legacy shapes (chip list, navigation target, call-to-action) and
/// clarification options all land here, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Suggested follow-up the user can tap to send as a message
    Chip { label: String, prompt: String },
    /// Navigate the client to a route
    Navigate { label: String, route: String },
    /// A single call-to-action with an opaque payload for the client
    CallToAction {
        label: String,
        action: String,
        #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
        payload: serde_json::Value,
    },
    /// Clarification option: resend the turn with this intent forced
    SelectIntent { label: String, intent: String },
}

impl Action {
    pub fn label(&self) -> &str {
        match self {
            Self::Chip { label, .. }
            | Self::Navigate { label, .. }
            | Self::CallToAction { label, .. }
            | Self::SelectIntent { label, .. } => label,
        }
    }
}

/// How the turn ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The model answered
    #[default]
    Answered,
    /// Terminal disambiguation question; the model was not invoked
    Clarification,
    /// The model could not be reached; fixed safe text returned
    Fallback,
    /// The caller aborted before or during invocation
    Cancelled,
}

/// Per-stage wall-clock timings in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTimings {
    pub classify_ms: u64,
    pub context_ms: u64,
    pub compose_ms: u64,
    pub invoke_ms: u64,
    pub finalize_ms: u64,
    pub total_ms: u64,
}

/// Envelope metadata. Known fields are typed; anything else an intent
/// handler or the model produced lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeMeta {
    /// Resolved intent key
    pub intent: String,
    pub outcome: Outcome,
    /// The intent came from an explicit client override
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub ambiguous: bool,
    #[serde(default)]
    pub cache_hit: bool,
    /// Set whenever a stage failed, even if the turn still answered
    #[serde(default)]
    pub error: bool,
    /// Fault detail; only populated outside production
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_version: Option<String>,
    #[serde(default)]
    pub timings: StageTimings,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The canonical response returned to the caller for every turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub response_text: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_prompt: Option<String>,
    pub meta: EnvelopeMeta,
}

impl ResponseEnvelope {
    pub fn is_clarification(&self) -> bool {
        self.meta.outcome == Outcome::Clarification
    }
}
