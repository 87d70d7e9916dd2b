//! Test helpers shared across csvchat crates.

pub mod backend;
pub mod clock;

pub use backend::{FailingBackend, FixedBackend, RecordingBackend};
pub use clock::ManualClock;
