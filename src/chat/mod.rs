//! Conversation subsystem for the sumchat service.
//!
//! This module owns everything between the UI surface and the completion
//! endpoint:
//! - `turn`: role-tagged conversation turns
//! - `memory`: the three selectable history-truncation policies
//! - `session`: per-session mutable state (history, URL summary, policy)
//! - `summarize`: the URL-summarization prompt pipeline
//! - `orchestrator`: the Idle / Awaiting-Reply turn loop

pub mod memory;
pub mod orchestrator;
pub mod session;
pub mod summarize;
pub mod turn;

pub use memory::MemoryPolicy;
pub use orchestrator::ChatError;
pub use session::{ChatState, Session, SessionId};
pub use turn::{Role, Turn};
