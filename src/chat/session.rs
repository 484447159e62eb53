//! Per-session conversation state.

use chrono::{DateTime, Utc};
use core::fmt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::memory::MemoryPolicy;
use crate::chat::turn::Turn;

/// Strongly-typed session identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Orchestrator state for a session.
///
/// `AwaitingReply` covers the window in which a completion request is in
/// flight; no new user turn is accepted while a session is in it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    /// Waiting for the next user interaction.
    #[default]
    Idle,
    /// A completion request is in flight.
    AwaitingReply,
}

/// Mutable state owned by one chat session.
///
/// Created at session start, mutated on every fetch or chat turn, dropped at
/// session end. The orchestrator is the single writer; there is no sharing
/// across sessions and nothing is persisted.
#[derive(Clone, Debug)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// The visible working history, in turn order.
    pub history: Vec<Turn>,
    /// Accumulated URL summary; empty until the first successful
    /// summarization, replaced wholesale on each subsequent one.
    pub url_summary: String,
    /// The currently selected memory policy.
    pub policy: MemoryPolicy,
    /// Per-session API credential for the completion endpoint.
    pub api_key: Option<String>,
    /// Orchestrator state flag.
    pub state: ChatState,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last fetch or chat activity.
    pub last_active: DateTime<Utc>,
}

impl Session {
    /// Create an empty session with the default policy.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            history: Vec::new(),
            url_summary: String::new(),
            policy: MemoryPolicy::default(),
            api_key: None,
            state: ChatState::default(),
            created_at: now,
            last_active: now,
        }
    }

    /// Store the user-supplied API credential.
    pub fn set_credential(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
        self.touch();
    }

    /// Re-select the memory policy; takes effect on the next turn.
    pub fn set_policy(&mut self, policy: MemoryPolicy) {
        self.policy = policy;
        self.touch();
    }

    /// Record activity on the session.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::memory::MemoryPolicy;

    #[test]
    fn test_new_session_is_idle_and_empty() {
        let session = Session::new();
        assert_eq!(session.state, ChatState::Idle);
        assert!(session.history.is_empty());
        assert!(session.url_summary.is_empty());
        assert!(session.api_key.is_none());
        assert_eq!(session.policy, MemoryPolicy::default());
    }

    #[test]
    fn test_policy_reselection() {
        let mut session = Session::new();
        session.set_policy(MemoryPolicy::FullSummary);
        assert_eq!(session.policy, MemoryPolicy::FullSummary);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
