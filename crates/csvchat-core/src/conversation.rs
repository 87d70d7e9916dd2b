//! Conversation list and active-conversation pointer.
//!
//! Every transition consumes the state and returns the next one, so callers
//! can compose them and tests can assert on plain values.

use crate::types::{Conversation, ConversationId, Message, title_from_content};
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Conversations in display order plus the active selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    conversations: Vec<Conversation>,
    /// Weak reference by id; never owns the conversation.
    active_id: Option<ConversationId>,
    /// Last millisecond value handed out by [`ConversationState::next_id`].
    last_issued: i64,
}

impl ConversationState {
    /// Create a state seeded with existing conversations and nothing active.
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations,
            active_id: None,
            last_issued: 0,
        }
    }

    /// Conversations in display order (newest first).
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Id of the active conversation, if any.
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Look up a conversation by id.
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|conv| conv.id == id)
    }

    /// True when no conversation is selected.
    pub fn is_new_chat(&self) -> bool {
        self.active_id.is_none()
    }

    /// Mint an id from the clock in milliseconds.
    ///
    /// Ids are strictly increasing, so two ids requested within the same
    /// millisecond still differ.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis().max(self.last_issued + 1);
        self.last_issued = millis;
        millis.to_string()
    }

    /// Start a fresh chat: clear the selection without allocating anything.
    ///
    /// The conversation itself is created lazily on the first send.
    #[must_use]
    pub fn create_new_conversation(mut self) -> Self {
        debug!("new conversation requested");
        self.active_id = None;
        self
    }

    /// Make `id` the active conversation. Unknown ids are ignored.
    #[must_use]
    pub fn select_conversation(mut self, id: &str) -> Self {
        if self.get(id).is_some() {
            debug!("conversation selected (id={id})");
            self.active_id = Some(id.to_string());
        }
        self
    }

    /// Remove a conversation, clearing the selection when it was active.
    #[must_use]
    pub fn delete_conversation(mut self, id: &str) -> Self {
        let before = self.conversations.len();
        self.conversations.retain(|conv| conv.id != id);
        if self.conversations.len() != before {
            info!("conversation deleted (id={id})");
        }
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self
    }

    /// Append a message and bump `last_message` to the append time.
    ///
    /// Does nothing when `conversation_id` is unknown.
    #[must_use]
    pub fn add_message(mut self, conversation_id: &str, message: Message) -> Self {
        let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|conv| conv.id == conversation_id)
        else {
            debug!("dropping message for unknown conversation (id={conversation_id})");
            return self;
        };
        debug!(
            "appending message (conversation_id={}, role={}, content_len={})",
            conversation_id,
            message.role.as_str(),
            message.content.len()
        );
        conversation.last_message = message.timestamp;
        conversation.messages.push(message);
        self
    }

    /// Alias of [`ConversationState::add_message`].
    #[must_use]
    pub fn append_message(self, conversation_id: &str, message: Message) -> Self {
        self.add_message(conversation_id, message)
    }

    /// Return the active conversation id, creating one when nothing is active.
    ///
    /// A new conversation takes its title from `content`, is prepended to the
    /// list, and becomes active. It starts empty; callers append the first
    /// message with [`ConversationState::append_message`].
    pub fn ensure_conversation(
        mut self,
        content: &str,
        now: DateTime<Utc>,
    ) -> (Self, ConversationId) {
        if let Some(id) = self.active_id.clone()
            && self.get(&id).is_some()
        {
            return (self, id);
        }
        let id = self.next_id(now);
        let conversation = Conversation {
            id: id.clone(),
            title: title_from_content(content),
            messages: Vec::new(),
            last_message: now,
        };
        info!(
            "conversation created (id={}, title_len={})",
            id,
            conversation.title.len()
        );
        self.conversations.insert(0, conversation);
        self.active_id = Some(id.clone());
        (self, id)
    }
}

/// The conversation currently displayed, computed on every call.
pub fn find_active(state: &ConversationState) -> Option<&Conversation> {
    state.active_id().and_then(|id| state.get(id))
}

#[cfg(test)]
mod tests {
    use super::{ConversationState, find_active};
    use crate::types::{Conversation, Message};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn conversation(id: &str) -> Conversation {
        Conversation {
            id: id.to_string(),
            title: format!("title {id}"),
            messages: Vec::new(),
            last_message: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn seeded() -> ConversationState {
        ConversationState::new(vec![conversation("a"), conversation("b")])
    }

    #[test]
    fn select_sets_active_pointer() {
        let state = seeded().select_conversation("b");
        assert_eq!(state.active_id(), Some("b"));
        assert_eq!(find_active(&state).map(|c| c.id.as_str()), Some("b"));
        assert!(!state.is_new_chat());
    }

    #[test]
    fn select_unknown_id_is_noop() {
        let state = seeded().select_conversation("a").select_conversation("zzz");
        assert_eq!(state.active_id(), Some("a"));
    }

    #[test]
    fn create_new_clears_selection_without_allocating() {
        let state = seeded().select_conversation("a").create_new_conversation();
        assert!(state.is_new_chat());
        assert_eq!(state.conversations().len(), 2);
        assert!(find_active(&state).is_none());
    }

    #[test]
    fn deleting_active_clears_pointer() {
        let state = seeded().select_conversation("a").delete_conversation("a");
        assert_eq!(state.active_id(), None);
        assert_eq!(state.conversations().len(), 1);
    }

    #[test]
    fn deleting_other_keeps_pointer() {
        let state = seeded().select_conversation("a").delete_conversation("b");
        assert_eq!(state.active_id(), Some("a"));
        assert_eq!(state.conversations().len(), 1);
    }

    #[test]
    fn add_message_bumps_last_message() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let state = seeded().add_message("a", Message::user("m1".into(), "hi", at));
        let conv = state.get("a").expect("conversation");
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.last_message, at);
    }

    #[test]
    fn add_message_to_unknown_conversation_changes_nothing() {
        let before = seeded();
        let after = before.clone().add_message(
            "missing",
            Message::user("m1".into(), "hi", Utc::now()),
        );
        assert_eq!(after, before);
    }

    #[test]
    fn ensure_conversation_reuses_active() {
        let (state, id) = seeded()
            .select_conversation("b")
            .ensure_conversation("hello", Utc::now());
        assert_eq!(id, "b");
        assert_eq!(state.conversations().len(), 2);
    }

    #[test]
    fn ensure_conversation_prepends_and_activates() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let (state, id) = seeded().ensure_conversation("  Show totals ", now);
        assert_eq!(id, "1700000000000");
        assert_eq!(state.active_id(), Some(id.as_str()));
        let first = &state.conversations()[0];
        assert_eq!(first.id, id);
        assert_eq!(first.title, "Show totals");
        assert!(first.messages.is_empty());
    }

    #[test]
    fn ids_are_unique_within_one_millisecond() {
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        let mut state = ConversationState::default();
        let first = state.next_id(now);
        let second = state.next_id(now);
        let third = state.next_id(now - Duration::milliseconds(5));
        assert_eq!(first, "1000");
        assert_eq!(second, "1001");
        assert_eq!(third, "1002");
    }
}
