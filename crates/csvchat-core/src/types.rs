//! Data types shared by the conversation store and the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversation identifier (a millisecond timestamp rendered as a string).
pub type ConversationId = String;

/// Message identifier (a millisecond timestamp rendered as a string).
pub type MessageId = String;

/// Longest title prefix taken from the first user message, in characters.
pub const TITLE_MAX_CHARS: usize = 30;

/// Speaker role for a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User-authored message.
    User,
    /// Assistant-authored message.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single entry in a conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    /// Plain text, or a JSON-encoded API payload for assistant replies.
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build a user-authored message.
    pub fn user(id: MessageId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            content: content.into(),
            role: Role::User,
            timestamp,
        }
    }

    /// Build an assistant-authored message.
    pub fn assistant(id: MessageId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            content: content.into(),
            role: Role::Assistant,
            timestamp,
        }
    }
}

/// A named thread of messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    /// Append-only; insertion order is display order.
    pub messages: Vec<Message>,
    /// Time of the most recent activity.
    pub last_message: DateTime<Utc>,
}

/// Derive a conversation title from the first user message.
///
/// Keeps the first [`TITLE_MAX_CHARS`] characters of the trimmed content and
/// appends `...` when anything was cut.
pub fn title_from_content(content: &str) -> String {
    let trimmed = content.trim();
    let mut title: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

#[cfg(test)]
mod tests {
    use super::{Role, title_from_content};
    use pretty_assertions::assert_eq;

    #[test]
    fn short_titles_are_kept() {
        assert_eq!(title_from_content("  Show totals  "), "Show totals");
    }

    #[test]
    fn long_titles_are_cut_at_thirty_chars() {
        let content = "Show me companies with transaction amount above 100.";
        assert_eq!(
            title_from_content(content),
            "Show me companies with transac..."
        );
    }

    #[test]
    fn exactly_thirty_chars_has_no_ellipsis() {
        let content = "a".repeat(30);
        assert_eq!(title_from_content(&content), content);
    }

    #[test]
    fn titles_count_characters_not_bytes() {
        let content = "é".repeat(31);
        assert_eq!(title_from_content(&content), format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(Role::Assistant.as_str(), "assistant");
        assert_eq!(
            serde_json::to_string(&Role::User).expect("json"),
            "\"user\""
        );
    }
}
