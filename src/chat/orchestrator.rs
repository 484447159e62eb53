//! The per-turn chat loop and the URL-summarization entry point.
//!
//! Both operations run the same two-state machine: a session is `Idle`
//! until a request is in flight, `AwaitingReply` while one is, and back to
//! `Idle` on response or error. A session in `AwaitingReply` accepts no new
//! work (single-flight).
//!
//! Failure policy is roll-forward: a failed completion call leaves the
//! just-appended user turn in history and reports the error; a failed
//! summarization leaves the previously stored summary untouched.

use thiserror::Error;

use crate::chat::memory;
use crate::chat::session::{ChatState, Session};
use crate::chat::summarize;
use crate::chat::turn::Turn;
use crate::fetch::{FetchError, FetchService};
use crate::llm::{ApiError, CompletionClient};

/// Errors surfaced by orchestrator operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The session already has a request in flight.
    #[error("a reply is already being generated for this session")]
    Busy,

    /// Fetching the URL failed; nothing was summarized.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The completion endpoint call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result of a successful URL summarization.
#[derive(Clone, Debug)]
pub struct SummaryOutcome {
    /// Title of the summarized page, possibly empty.
    pub title: String,
    /// The generated summary, stored on the session verbatim.
    pub summary: String,
}

/// Process one user turn.
///
/// Appends the user message, applies the selected memory policy to the
/// stored history, sends `[system: stored summary] + history` to the
/// completion endpoint (the summary turn is always present, even while the
/// summary is still empty), appends the assistant reply, and returns it.
///
/// # Errors
/// Returns [`ChatError::Busy`] when a request is already in flight, or the
/// endpoint error otherwise. On endpoint failure the user turn stays in
/// history and the session returns to `Idle`.
pub fn send_message(
    session: &mut Session,
    client: &CompletionClient,
    message: &str,
) -> Result<String, ChatError> {
    if session.state == ChatState::AwaitingReply {
        return Err(ChatError::Busy);
    }
    let api_key = session.api_key.clone().ok_or(ApiError::MissingCredential)?;

    session.history.push(Turn::user(message));
    let history = std::mem::take(&mut session.history);
    session.history = memory::apply(session.policy, history);

    let mut context = Vec::with_capacity(session.history.len() + 1);
    context.push(Turn::system(session.url_summary.clone()));
    context.extend(session.history.iter().cloned());

    session.state = ChatState::AwaitingReply;
    let result = client.chat(&api_key, &context);
    session.state = ChatState::Idle;
    session.touch();

    let reply = result?;
    tracing::info!(
        session = %session.id,
        turns = session.history.len() + 1,
        "Chat turn completed"
    );
    session.history.push(Turn::assistant(reply.clone()));
    Ok(reply)
}

/// Fetch a URL, summarize its visible text, and store the summary.
///
/// # Errors
/// Returns [`ChatError::Busy`] when a request is already in flight, the
/// fetch error when the page cannot be retrieved, or the endpoint error
/// when summarization fails. On any failure the stored summary keeps its
/// prior value and the chat history is untouched.
pub fn summarize_url(
    session: &mut Session,
    fetcher: &FetchService,
    client: &CompletionClient,
    url: &str,
) -> Result<SummaryOutcome, ChatError> {
    if session.state == ChatState::AwaitingReply {
        return Err(ChatError::Busy);
    }
    let api_key = session.api_key.clone().ok_or(ApiError::MissingCredential)?;

    session.state = ChatState::AwaitingReply;
    let result = fetch_and_summarize(fetcher, client, &api_key, url);
    session.state = ChatState::Idle;
    session.touch();

    let outcome = result?;
    tracing::info!(session = %session.id, %url, "URL summarized");
    session.url_summary.clone_from(&outcome.summary);
    Ok(outcome)
}

/// The fallible part of summarization, isolated so state restoration stays
/// in one place.
fn fetch_and_summarize(
    fetcher: &FetchService,
    client: &CompletionClient,
    api_key: &str,
    url: &str,
) -> Result<SummaryOutcome, ChatError> {
    let page = fetcher.fetch_page(url)?;
    tracing::debug!(
        final_url = %page.final_url,
        chars = page.text.chars().count(),
        "Page fetched for summarization"
    );
    let summary = summarize::summarize(client, api_key, &page.text)?;
    Ok(SummaryOutcome {
        title: page.title,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::memory::MemoryPolicy;
    use crate::chat::turn::Role;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serve exactly one canned chat-completion response, then exit.
    fn spawn_stub_endpoint(body: &'static str) -> String {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0") else {
            unreachable!()
        };
        let Ok(addr) = listener.local_addr() else {
            unreachable!()
        };

        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                // Drain the whole request (headers plus content-length body)
                // before answering, so the client never sees a reset mid-write.
                let mut buf = [0_u8; 8192];
                let mut seen = Vec::new();
                while let Ok(n) = stream.read(&mut buf) {
                    if n == 0 {
                        break;
                    }
                    seen.extend_from_slice(&buf[..n]);
                    if let Some(header_end) =
                        seen.windows(4).position(|w| w == b"\r\n\r\n")
                    {
                        let body_len = String::from_utf8_lossy(&seen[..header_end])
                            .lines()
                            .find_map(|line| {
                                let (name, value) = line.split_once(':')?;
                                name.eq_ignore_ascii_case("content-length")
                                    .then(|| value.trim().parse::<usize>().ok())?
                            })
                            .unwrap_or(0);
                        if seen.len() >= header_end + 4 + body_len {
                            break;
                        }
                    }
                }

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        format!("http://{addr}")
    }

    fn client_for(base_url: &str) -> CompletionClient {
        let Ok(client) = CompletionClient::new(base_url, "test-model") else {
            unreachable!()
        };
        client
    }

    fn unreachable_client() -> CompletionClient {
        client_for("http://127.0.0.1:1")
    }

    fn session_with_key() -> Session {
        let mut session = Session::new();
        session.set_credential("sk-test");
        session
    }

    const STUB_REPLY: &str =
        r#"{"choices":[{"message":{"role":"assistant","content":"stub reply"}}]}"#;

    #[test]
    fn test_send_message_appends_user_and_assistant_turns() {
        let base = spawn_stub_endpoint(STUB_REPLY);
        let client = client_for(&base);
        let mut session = session_with_key();

        let result = send_message(&mut session, &client, "hi");
        assert_eq!(result.ok(), Some("stub reply".to_string()));
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0], Turn::user("hi"));
        assert_eq!(session.history[1], Turn::assistant("stub reply"));
        assert_eq!(session.state, ChatState::Idle);
    }

    #[test]
    fn test_send_message_rolls_forward_on_endpoint_failure() {
        let client = unreachable_client();
        let mut session = session_with_key();

        let result = send_message(&mut session, &client, "hi");
        assert!(matches!(result, Err(ChatError::Api(_))));
        // Roll-forward: the user turn stays appended, the session is usable.
        assert_eq!(session.history, vec![Turn::user("hi")]);
        assert_eq!(session.state, ChatState::Idle);
    }

    #[test]
    fn test_send_message_rejected_while_awaiting_reply() {
        let client = unreachable_client();
        let mut session = session_with_key();
        session.state = ChatState::AwaitingReply;

        let result = send_message(&mut session, &client, "hi");
        assert!(matches!(result, Err(ChatError::Busy)));
        assert!(session.history.is_empty());
    }

    #[test]
    fn test_send_message_without_credential_leaves_history_untouched() {
        let client = unreachable_client();
        let mut session = Session::new();

        let result = send_message(&mut session, &client, "hi");
        assert!(matches!(
            result,
            Err(ChatError::Api(ApiError::MissingCredential))
        ));
        assert!(session.history.is_empty());
    }

    #[test]
    fn test_full_summary_policy_collapses_before_the_request() {
        let base = spawn_stub_endpoint(STUB_REPLY);
        let client = client_for(&base);
        let mut session = session_with_key();
        session.set_policy(MemoryPolicy::FullSummary);
        session.history = vec![Turn::user("first"), Turn::assistant("answer")];

        let result = send_message(&mut session, &client, "second");
        assert!(result.is_ok());
        // Collapsed system turn plus the freshly appended assistant reply.
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, Role::System);
        assert_eq!(
            session.history[0].content,
            "user: first\nassistant: answer\nuser: second"
        );
        assert_eq!(session.history[1], Turn::assistant("stub reply"));
    }

    #[test]
    fn test_summarize_url_failure_keeps_prior_summary() {
        let client = unreachable_client();
        let Ok(fetcher) = FetchService::with_defaults() else {
            unreachable!()
        };
        let mut session = session_with_key();
        session.url_summary = "prior summary".to_string();

        let result = summarize_url(&mut session, &fetcher, &client, "http://127.0.0.1:1/");
        assert!(matches!(result, Err(ChatError::Fetch(_))));
        assert_eq!(session.url_summary, "prior summary");
        assert!(session.history.is_empty());
        assert_eq!(session.state, ChatState::Idle);
    }

    #[test]
    fn test_summarize_url_rejected_while_awaiting_reply() {
        let client = unreachable_client();
        let Ok(fetcher) = FetchService::with_defaults() else {
            unreachable!()
        };
        let mut session = session_with_key();
        session.state = ChatState::AwaitingReply;

        let result = summarize_url(&mut session, &fetcher, &client, "http://example.com/");
        assert!(matches!(result, Err(ChatError::Busy)));
    }
}
