//! Message domain types.
//!
//! Messages are the value objects handed to the completion provider:
//! system instructions, prior conversation turns, and the current user turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender. Deliberately a small fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The assistant
    Assistant,
    /// System instructions (persona, style, context)
    System,
}

impl Role {
    /// Map a stored role label onto the fixed role set.
    ///
    /// Stored conversation logs use a zoo of labels (`human`, `bot`, `ai`,
    /// `model`, `tool`, ...). Anything unrecognized is treated as the user
    /// so it never gains assistant or system authority.
    pub fn normalize(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "assistant" | "ai" | "bot" | "model" | "agent" | "tool" | "function" => Self::Assistant,
            "system" | "developer" => Self::System,
            _ => Self::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Rebuild a message from a stored record, keeping its original timestamp.
    pub fn restored(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ..Self::with_role(role, content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, steward!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, steward!");
    }

    #[test]
    fn role_normalization() {
        assert_eq!(Role::normalize("assistant"), Role::Assistant);
        assert_eq!(Role::normalize("  BOT "), Role::Assistant);
        assert_eq!(Role::normalize("model"), Role::Assistant);
        assert_eq!(Role::normalize("system"), Role::System);
        assert_eq!(Role::normalize("human"), Role::User);
        assert_eq!(Role::normalize("customer"), Role::User);
        assert_eq!(Role::normalize(""), Role::User);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::assistant("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"assistant\""));
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "Test message");
        assert_eq!(deserialized.role, Role::Assistant);
    }
}
