//! URL summarization pipeline.
//!
//! Page text is truncated to a fixed character budget before submission.
//! The truncation is hard and silent: nothing tells the user that content
//! past the budget was cut.

use crate::chat::turn::Turn;
use crate::llm::{ApiError, CompletionClient};

/// Instruction prefix placed before the page text.
pub const SUMMARY_PROMPT_PREFIX: &str = "Summarize the following content: ";

/// Maximum number of page-text characters submitted for summarization.
pub const SUMMARY_INPUT_BUDGET: usize = 2_000;

/// Build the single-user-message summarization prompt.
#[must_use]
pub fn build_summary_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(SUMMARY_PROMPT_PREFIX.len() + SUMMARY_INPUT_BUDGET);
    prompt.push_str(SUMMARY_PROMPT_PREFIX);
    prompt.extend(text.chars().take(SUMMARY_INPUT_BUDGET));
    prompt
}

/// Summarize extracted page text via the completion endpoint.
///
/// Returns the endpoint's generated text verbatim.
///
/// # Errors
/// Returns an error if the credential is missing or the endpoint call
/// fails; the caller leaves any previously stored summary unchanged.
pub fn summarize(
    client: &CompletionClient,
    api_key: &str,
    text: &str,
) -> Result<String, ApiError> {
    let prompt = build_summary_prompt(text);
    tracing::debug!(prompt_chars = prompt.chars().count(), "Summarizing page text");
    client.chat(api_key, &[Turn::user(prompt)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_prefix_and_text() {
        let prompt = build_summary_prompt("short page");
        assert_eq!(prompt, "Summarize the following content: short page");
    }

    #[test]
    fn test_prompt_truncates_to_budget() {
        let text = "a".repeat(SUMMARY_INPUT_BUDGET * 3);
        let prompt = build_summary_prompt(&text);
        assert_eq!(
            prompt.chars().count(),
            SUMMARY_PROMPT_PREFIX.chars().count() + SUMMARY_INPUT_BUDGET
        );
    }

    #[test]
    fn test_prompt_truncation_counts_characters() {
        // Multi-byte characters: the cut is by character, never mid-codepoint.
        let text = "日".repeat(SUMMARY_INPUT_BUDGET + 10);
        let prompt = build_summary_prompt(&text);
        assert_eq!(
            prompt.chars().count(),
            SUMMARY_PROMPT_PREFIX.chars().count() + SUMMARY_INPUT_BUDGET
        );
        assert!(prompt.ends_with('日'));
    }

    #[test]
    fn test_empty_text_yields_bare_prefix() {
        assert_eq!(build_summary_prompt(""), SUMMARY_PROMPT_PREFIX);
    }
}
