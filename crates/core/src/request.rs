//! Inbound request types — one [`ChatRequest`] per conversational turn.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single conversational turn as received from a client surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_id: String,
    pub business_id: String,

    /// Free-text user message
    pub message: String,

    /// Explicit intent override; bypasses scoring when it names a registered intent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    /// Current client path, used for the route-category bonus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    #[serde(default)]
    pub hints: Hints,

    /// Module override (finance, marketing, tax, calendar, inbox, general)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<Depth>,

    /// Client surface tag (e.g. "chat-widget", "dashboard")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,

    /// Style family override; wins over the surface mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleFamily>,

    #[serde(default)]
    pub dials: DialOverrides,
}

impl ChatRequest {
    /// Minimal request with no hints or overrides.
    pub fn new(
        user_id: impl Into<String>,
        business_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            business_id: business_id.into(),
            message: message.into(),
            intent: None,
            route: None,
            hints: Hints::default(),
            module: None,
            depth: None,
            surface: None,
            style: None,
            dials: DialOverrides::default(),
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_hints(mut self, hints: Hints) -> Self {
        self.hints = hints;
        self
    }
}

/// Request hints: continuity ids, search filters, metric/period hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl Hints {
    /// Whether the client is continuing an email thread or account context.
    pub fn has_continuity(&self) -> bool {
        self.thread_id.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self.account_id.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    pub fn thread(id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// Verbosity preset. Each maps to an approximate word-count target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Brief,
    #[default]
    Standard,
    Detailed,
    Deep,
}

impl Depth {
    /// Approximate target length in words.
    pub fn target_words(&self) -> u32 {
        match self {
            Self::Brief => 60,
            Self::Standard => 150,
            Self::Detailed => 300,
            Self::Deep => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brief => "brief",
            Self::Standard => "standard",
            Self::Detailed => "detailed",
            Self::Deep => "deep",
        }
    }
}

/// Style family: structured answers follow per-intent templates,
/// conversational answers stay free-form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleFamily {
    #[default]
    Structured,
    Conversational,
}

/// Per-request persona dial overrides. Unset dials use configured defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brevity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimism: Option<i32>,
}
