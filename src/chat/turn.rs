//! Role-tagged conversation turns.

use serde::{Deserialize, Serialize};

/// The speaker of a conversation turn.
///
/// Serialized lowercase because these are the completion endpoint's wire
/// names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Synthetic context turn (stored summary, collapsed history).
    System,
    /// A message typed by the user.
    User,
    /// A reply generated by the completion endpoint.
    Assistant,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged message in a conversation.
///
/// The working history is an ordered sequence of these, append-only except
/// when a memory policy rewrites it wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced the content.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Turn {
    /// Create a turn with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Shorthand for a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Shorthand for an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Shorthand for a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}
