//! TUI event types for input and reply delivery.

use crossterm::event::KeyEvent;
use csvchat_core::{CoreError, PendingReply, Reply};

/// Application event emitted by input handlers or reply tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Terminal resized to the given width and height.
    Resize(u16, u16),
    /// Scroll event in the thread view.
    Scroll(i16),
    /// A spawned reply finished.
    Reply {
        pending: PendingReply,
        outcome: Result<Reply, CoreError>,
    },
    /// Periodic tick event.
    Tick,
}
