//! Selectable memory-truncation policies for the working history.
//!
//! A policy reshapes the stored history before each completion request.
//! All three variants are deliberate heuristics carried over from the
//! product behavior they implement:
//! - `LastQuestions` slices positionally, not by role, so a tail that does
//!   not alternate cleanly is still cut at the same index.
//! - `FullSummary` is a one-way compaction; once it fires, role/content
//!   granularity of prior turns is gone for good.
//! - `CharBudget` counts characters, not tokens, and falls back to a fixed
//!   turn count rather than trimming to the byte budget. Do not "upgrade"
//!   it to token-accurate counting; that would change observable behavior.

use serde::{Deserialize, Serialize};

use crate::chat::turn::{Role, Turn};

/// Default number of question/answer pairs kept by `LastQuestions`.
pub const DEFAULT_KEPT_QUESTIONS: usize = 5;

/// Default character budget for `CharBudget`.
pub const DEFAULT_CHAR_BUDGET: usize = 5_000;

/// Number of trailing turns kept when `CharBudget` trips.
const CHAR_BUDGET_FALLBACK_TURNS: usize = 100;

/// How the working history is reduced before each completion request.
///
/// Selected per session and re-selectable at any time; read by the
/// orchestrator on every turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryPolicy {
    /// Keep only the last `kept` user/assistant pairs (a suffix of
    /// `2 * kept` turns, cut purely by position).
    LastQuestions {
        /// Number of pairs to retain.
        kept: usize,
    },
    /// Collapse the entire history into a single synthetic `system` turn.
    FullSummary,
    /// Keep the last 100 turns once the newline-joined contents exceed
    /// `budget_chars` characters.
    CharBudget {
        /// Character threshold that triggers the trim.
        budget_chars: usize,
    },
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self::LastQuestions {
            kept: DEFAULT_KEPT_QUESTIONS,
        }
    }
}

impl MemoryPolicy {
    /// The `CharBudget` variant with its stock threshold.
    #[must_use]
    pub const fn char_budget_default() -> Self {
        Self::CharBudget {
            budget_chars: DEFAULT_CHAR_BUDGET,
        }
    }
}

/// Apply a memory policy to the working history.
///
/// Returns the possibly-reduced history to use as context for the next
/// request. `LastQuestions` and `CharBudget` are idempotent once under
/// their thresholds; `FullSummary` is not — reapplying it wraps the
/// previous collapse in a new system turn.
#[must_use]
pub fn apply(policy: MemoryPolicy, history: Vec<Turn>) -> Vec<Turn> {
    match policy {
        MemoryPolicy::LastQuestions { kept } => keep_last_turns(history, kept * 2),
        MemoryPolicy::FullSummary => collapse_to_summary(history),
        MemoryPolicy::CharBudget { budget_chars } => trim_to_char_budget(history, budget_chars),
    }
}

/// Keep at most the last `max_turns` turns, order preserved.
fn keep_last_turns(mut history: Vec<Turn>, max_turns: usize) -> Vec<Turn> {
    if history.len() <= max_turns {
        return history;
    }
    history.split_off(history.len() - max_turns)
}

/// Flatten the whole history into one `system` turn of `"{role}: {content}"`
/// lines. Empty history stays empty.
fn collapse_to_summary(history: Vec<Turn>) -> Vec<Turn> {
    if history.is_empty() {
        return history;
    }

    let lines: Vec<String> = history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
        .collect();

    vec![Turn::new(Role::System, lines.join("\n"))]
}

/// Keep the last `CHAR_BUDGET_FALLBACK_TURNS` turns when the newline-joined
/// contents exceed the budget; otherwise leave the history unchanged.
fn trim_to_char_budget(history: Vec<Turn>, budget_chars: usize) -> Vec<Turn> {
    if joined_content_chars(&history) <= budget_chars {
        return history;
    }
    keep_last_turns(history, CHAR_BUDGET_FALLBACK_TURNS)
}

/// Character length of all turn contents joined with `"\n"`.
fn joined_content_chars(history: &[Turn]) -> usize {
    let content: usize = history
        .iter()
        .map(|turn| turn.content.chars().count())
        .sum();
    content + history.len().saturating_sub(1)
}
