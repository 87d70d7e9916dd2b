//! Composer state and the send pipeline.
//!
//! A send is split in two halves so the UI can stay responsive while the
//! reply is in flight: [`ChatState::begin_send`] records the user message and
//! raises the loading flags, [`ChatState::complete_send`] records the reply
//! and lowers them again.

use crate::backend::{Reply, ReplyBackend, ReplyRequest};
use crate::clock::Clock;
use crate::conversation::ConversationState;
use crate::error::CoreError;
use crate::types::{ConversationId, Message};
use chrono::{DateTime, Utc};
use csvchat_config::FilesConfig;
use log::{info, warn};

/// Assistant content stored when a reply fails.
pub const API_ERROR_PLACEHOLDER: &str =
    "Sorry, I could not get an answer from the analysis service. Please try again.";

/// Conversation store plus composer and loading flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub conversations: ConversationState,
    pub input: String,
    /// A reply is outstanding.
    pub loading: bool,
    /// The outstanding reply comes from the remote API.
    pub api_loading: bool,
}

/// Handle for a reply that has been requested but not yet recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub conversation_id: ConversationId,
    pub query: String,
    pub remote: bool,
}

impl ChatState {
    pub fn new(conversations: ConversationState) -> Self {
        Self {
            conversations,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn set_input(mut self, value: impl Into<String>) -> Self {
        self.input = value.into();
        self
    }

    /// Clear the active conversation and the composer.
    #[must_use]
    pub fn create_new_conversation(mut self) -> Self {
        self.conversations = self.conversations.create_new_conversation();
        self.input.clear();
        self
    }

    #[must_use]
    pub fn select_conversation(mut self, id: &str) -> Self {
        self.conversations = self.conversations.select_conversation(id);
        self
    }

    #[must_use]
    pub fn delete_conversation(mut self, id: &str) -> Self {
        self.conversations = self.conversations.delete_conversation(id);
        self
    }

    /// Record the user side of a turn.
    ///
    /// Blank content leaves the state untouched and returns `None`.
    pub fn begin_send(
        mut self,
        content: &str,
        remote: bool,
        now: DateTime<Utc>,
    ) -> (Self, Option<PendingReply>) {
        let query = content.trim();
        if query.is_empty() {
            return (self, None);
        }
        let (mut conversations, conversation_id) =
            self.conversations.ensure_conversation(query, now);
        let message_id = conversations.next_id(now);
        self.conversations = conversations.append_message(
            &conversation_id,
            Message::user(message_id, query, now),
        );
        self.input.clear();
        self.loading = true;
        self.api_loading = remote;
        info!(
            "message sent (conversation_id={}, remote={}, content_len={})",
            conversation_id,
            remote,
            query.len()
        );
        let pending = PendingReply {
            conversation_id,
            query: query.to_string(),
            remote,
        };
        (self, Some(pending))
    }

    /// Record the assistant side of a turn and clear both loading flags.
    ///
    /// Exactly one assistant message is appended, whatever the outcome.
    #[must_use]
    pub fn complete_send(
        mut self,
        pending: &PendingReply,
        outcome: Result<Reply, CoreError>,
        now: DateTime<Utc>,
    ) -> Self {
        let content = match outcome {
            Ok(reply) => reply.into_content(),
            Err(err) => {
                warn!(
                    "reply failed (conversation_id={}, remote={}, err={})",
                    pending.conversation_id, pending.remote, err
                );
                API_ERROR_PLACEHOLDER.to_string()
            }
        };
        let message_id = self.conversations.next_id(now);
        self.conversations = self.conversations.append_message(
            &pending.conversation_id,
            Message::assistant(message_id, content, now),
        );
        self.loading = false;
        self.api_loading = false;
        self
    }
}

/// Run a full turn: record the user message, await the backend, record the
/// reply.
pub async fn send_message(
    state: ChatState,
    content: &str,
    backend: &dyn ReplyBackend,
    uploads: &FilesConfig,
    clock: &dyn Clock,
) -> ChatState {
    let (state, pending) = state.begin_send(content, backend.is_remote(), clock.now());
    let Some(pending) = pending else {
        return state;
    };
    let outcome = backend
        .reply(ReplyRequest {
            query: pending.query.clone(),
            conversation_id: pending.conversation_id.clone(),
            uploads: uploads.clone(),
        })
        .await;
    state.complete_send(&pending, outcome, clock.now())
}

#[cfg(test)]
mod tests {
    use super::{API_ERROR_PLACEHOLDER, ChatState};
    use crate::backend::Reply;
    use crate::conversation::find_active;
    use crate::error::CoreError;
    use crate::types::Role;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn blank_send_is_noop() {
        let state = ChatState::default().set_input("   ");
        let (after, pending) = state.clone().begin_send("   ", true, Utc::now());
        assert!(pending.is_none());
        assert_eq!(after, state);
    }

    #[test]
    fn begin_send_creates_conversation_with_first_message() {
        let now = Utc.timestamp_millis_opt(5_000).unwrap();
        let state = ChatState::default().set_input("Show totals");
        let (state, pending) = state.begin_send("Show totals", true, now);
        let pending = pending.expect("pending");

        assert!(state.loading);
        assert!(state.api_loading);
        assert_eq!(state.input, "");
        let active = find_active(&state.conversations).expect("active");
        assert_eq!(active.id, pending.conversation_id);
        assert_eq!(active.title, "Show totals");
        assert_eq!(active.messages.len(), 1);
        assert_eq!(active.messages[0].role, Role::User);
        assert_ne!(active.messages[0].id, active.id);
    }

    #[test]
    fn second_send_appends_to_active_conversation() {
        let now = Utc::now();
        let (state, first) = ChatState::default().begin_send("one", false, now);
        let (state, second) = state.begin_send("two", false, now);
        assert!(!state.api_loading);
        assert_eq!(
            first.expect("first").conversation_id,
            second.expect("second").conversation_id
        );
        assert_eq!(state.conversations.conversations().len(), 1);
        assert_eq!(state.conversations.conversations()[0].messages.len(), 2);
    }

    #[test]
    fn complete_send_stores_serialized_json() {
        let now = Utc::now();
        let (state, pending) = ChatState::default().begin_send("Show totals", true, now);
        let pending = pending.expect("pending");
        let state = state.complete_send(
            &pending,
            Ok(Reply::Json(json!({ "summary": "Total is 42" }))),
            now,
        );
        let active = find_active(&state.conversations).expect("active");
        assert_eq!(active.messages.len(), 2);
        assert_eq!(active.messages[1].role, Role::Assistant);
        assert_eq!(active.messages[1].content, r#"{"summary":"Total is 42"}"#);
        assert!(!state.loading);
        assert!(!state.api_loading);
    }

    #[test]
    fn failure_stores_placeholder_and_clears_flags() {
        let now = Utc::now();
        let (state, pending) = ChatState::default().begin_send("Show totals", true, now);
        let pending = pending.expect("pending");
        let state = state.complete_send(
            &pending,
            Err(CoreError::Backend("boom".to_string())),
            now,
        );
        let active = find_active(&state.conversations).expect("active");
        assert_eq!(active.messages[1].content, API_ERROR_PLACEHOLDER);
        assert!(!state.loading);
        assert!(!state.api_loading);
    }

    #[test]
    fn reply_for_deleted_conversation_is_dropped() {
        let now = Utc::now();
        let (state, kept) = ChatState::default().begin_send("keep me", false, now);
        let state = state.complete_send(&kept.expect("kept"), Ok(Reply::Text("ok".into())), now);
        let (state, pending) = state
            .create_new_conversation()
            .begin_send("delete me", true, now);
        let pending = pending.expect("pending");

        let state = state.delete_conversation(&pending.conversation_id);
        let before = state.conversations.conversations().to_vec();
        let state = state.complete_send(&pending, Ok(Reply::Json(json!({ "summary": "late" }))), now);

        assert_eq!(state.conversations.conversations(), before.as_slice());
        assert!(state.conversations.get(&pending.conversation_id).is_none());
        assert!(state.conversations.is_new_chat());
        assert!(!state.loading);
        assert!(!state.api_loading);
    }

    #[test]
    fn new_conversation_clears_input_and_selection() {
        let (state, _) = ChatState::default().begin_send("hi", false, Utc::now());
        let state = state.set_input("draft").create_new_conversation();
        assert!(state.conversations.is_new_chat());
        assert_eq!(state.input, "");
        assert_eq!(state.conversations.conversations().len(), 1);
    }
}
