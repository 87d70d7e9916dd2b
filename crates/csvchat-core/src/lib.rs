//! Core state and request plumbing for csvchat.
//!
//! This crate owns the conversation store, the send pipeline, the UI chrome
//! state, and the multipart client for the CSV analysis service. Nothing here
//! touches the terminal.

pub mod backend;
pub mod chat;
pub mod chrome;
pub mod client;
pub mod clock;
pub mod conversation;
pub mod error;
pub mod payload;
pub mod seed;
pub mod types;

pub use backend::{
    CsvBackend, Reply, ReplyBackend, ReplyRequest, SimulatedBackend, backend_from_config,
};
pub use chat::{API_ERROR_PLACEHOLDER, ChatState, PendingReply, send_message};
pub use chrome::UiChrome;
pub use client::{CsvBotClient, CsvQuery, UploadFile};
pub use clock::{Clock, SystemClock};
pub use conversation::{ConversationState, find_active};
pub use error::{ClientError, CoreError};
pub use payload::{AssistantView, PARSE_ERROR_TEXT, QueryResponse, ResultTable, format_time_ago};
pub use seed::demo_conversations;
pub use types::{Conversation, ConversationId, Message, MessageId, Role};
