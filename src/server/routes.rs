//! HTTP route handlers for the sumchat API.

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use crate::chat::memory::MemoryPolicy;
use crate::chat::orchestrator::{self, ChatError};
use crate::chat::session::{ChatState, Session, SessionId};
use crate::chat::turn::Turn;
use crate::llm::ApiError;

use super::state::AppState;

/// A handler failure, rendered as an inline error string.
type ErrorResponse = (StatusCode, String);

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/session", post(create_session))
        .route("/api/session/{id}/credential", put(set_credential))
        .route("/api/session/{id}/policy", put(set_policy))
        .route("/api/session/{id}/summarize", post(summarize_page))
        .route("/api/session/{id}/chat", post(chat_turn))
        .route("/api/session/{id}/history", get(session_history))
        .fallback_service(ServeDir::new("static"))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sumchat",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Session creation response.
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    /// Identifier to pass on all subsequent calls.
    pub session_id: SessionId,
}

/// Create a fresh session.
async fn create_session(State(state): State<Arc<AppState>>) -> Json<CreateSessionResponse> {
    Json(CreateSessionResponse {
        session_id: state.create_session(),
    })
}

/// Credential request.
#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    /// The user-supplied completion endpoint credential.
    pub api_key: String,
}

/// Store the per-session API credential.
async fn set_credential(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<CredentialRequest>,
) -> Result<StatusCode, ErrorResponse> {
    let session = lookup(&state, id)?;
    let mut guard = lock_session(&session).map_err(|e| error_response(&e))?;
    guard.set_credential(request.api_key);
    Ok(StatusCode::NO_CONTENT)
}

/// Policy selection request.
#[derive(Debug, Deserialize)]
pub struct PolicyRequest {
    /// The memory policy to use from the next turn onward.
    pub policy: MemoryPolicy,
}

/// Re-select the session's memory policy.
async fn set_policy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<PolicyRequest>,
) -> Result<StatusCode, ErrorResponse> {
    let session = lookup(&state, id)?;
    let mut guard = lock_session(&session).map_err(|e| error_response(&e))?;
    guard.set_policy(request.policy);
    Ok(StatusCode::NO_CONTENT)
}

/// URL summarization request.
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    /// The URL to fetch and summarize.
    pub url: String,
}

/// URL summarization response.
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    /// Title of the fetched page, possibly empty.
    pub title: String,
    /// The generated summary.
    pub summary: String,
}

/// Fetch a URL, summarize it, and store the summary on the session.
async fn summarize_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ErrorResponse> {
    let session = lookup(&state, id)?;
    let worker_state = Arc::clone(&state);

    let outcome = tokio::task::spawn_blocking(move || {
        let mut guard = lock_session(&session)?;
        orchestrator::summarize_url(
            &mut guard,
            &worker_state.fetcher,
            &worker_state.completions,
            &request.url,
        )
    })
    .await
    .map_err(join_failure)?
    .map_err(|e| error_response(&e))?;

    Ok(Json(SummarizeResponse {
        title: outcome.title,
        summary: outcome.summary,
    }))
}

/// Chat turn request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
}

/// Chat turn response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub reply: String,
    /// Model used.
    pub model: String,
}

/// Process one chat turn for the session.
async fn chat_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ErrorResponse> {
    let session = lookup(&state, id)?;
    let worker_state = Arc::clone(&state);

    let reply = tokio::task::spawn_blocking(move || {
        let mut guard = lock_session(&session)?;
        orchestrator::send_message(&mut guard, &worker_state.completions, &request.message)
    })
    .await
    .map_err(join_failure)?
    .map_err(|e| error_response(&e))?;

    Ok(Json(ChatResponse {
        reply,
        model: state.completions.model().to_string(),
    }))
}

/// Transcript response.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// The working history, in turn order.
    pub turns: Vec<Turn>,
    /// The stored URL summary, empty until one succeeds.
    pub url_summary: String,
    /// The currently selected memory policy.
    pub policy: MemoryPolicy,
    /// Orchestrator state.
    pub state: ChatState,
}

/// Read the session transcript and state.
async fn session_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<HistoryResponse>, ErrorResponse> {
    let session = lookup(&state, id)?;
    let guard = lock_session(&session).map_err(|e| error_response(&e))?;

    Ok(Json(HistoryResponse {
        turns: guard.history.clone(),
        url_summary: guard.url_summary.clone(),
        policy: guard.policy,
        state: guard.state,
    }))
}

/// Look up a session or answer 404.
fn lookup(state: &AppState, id: SessionId) -> Result<Arc<Mutex<Session>>, ErrorResponse> {
    state
        .session(id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown session: {id}")))
}

/// Acquire a session without waiting; a held lock means a request is in
/// flight. A poisoned lock is recovered: session state is plain data.
fn lock_session(session: &Arc<Mutex<Session>>) -> Result<MutexGuard<'_, Session>, ChatError> {
    match session.try_lock() {
        Ok(guard) => Ok(guard),
        Err(TryLockError::WouldBlock) => Err(ChatError::Busy),
        Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
    }
}

/// Map an orchestrator error to a status code and inline message.
fn error_response(error: &ChatError) -> ErrorResponse {
    let status = match error {
        ChatError::Busy => StatusCode::CONFLICT,
        ChatError::Api(ApiError::MissingCredential) => StatusCode::UNAUTHORIZED,
        ChatError::Fetch(_) | ChatError::Api(_) => StatusCode::BAD_GATEWAY,
    };
    (status, error.to_string())
}

/// Map a worker-task join failure to a 500.
fn join_failure(error: tokio::task::JoinError) -> ErrorResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("worker task failed: {error}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::future::Future;
    use tower::ServiceExt;

    fn test_router() -> (Arc<AppState>, Router) {
        let Ok(state) = AppState::new() else {
            unreachable!()
        };
        let router = create_router(Arc::clone(&state));
        (state, router)
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        let Ok(rt) = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        else {
            unreachable!()
        };
        rt.block_on(future)
    }

    #[test]
    fn test_health_endpoint() {
        let (_state, router) = test_router();
        let Ok(request) = Request::builder().uri("/health").body(Body::empty()) else {
            unreachable!()
        };
        let response = block_on(router.oneshot(request));
        assert_eq!(response.ok().map(|r| r.status()), Some(StatusCode::OK));
    }

    #[test]
    fn test_unknown_session_is_404() {
        let (_state, router) = test_router();
        let uri = format!("/api/session/{}/history", SessionId::new());
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            unreachable!()
        };
        let response = block_on(router.oneshot(request));
        assert_eq!(
            response.ok().map(|r| r.status()),
            Some(StatusCode::NOT_FOUND)
        );
    }

    #[test]
    fn test_chat_without_credential_is_401() {
        let (state, router) = test_router();
        let id = state.create_session();
        let uri = format!("/api/session/{id}/chat");
        let Ok(request) = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message":"hi"}"#))
        else {
            unreachable!()
        };
        let response = block_on(router.oneshot(request));
        assert_eq!(
            response.ok().map(|r| r.status()),
            Some(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn test_busy_session_is_409() {
        let (state, router) = test_router();
        let id = state.create_session();
        let Some(session) = state.session(id) else {
            unreachable!()
        };
        // Hold the session lock to simulate a request in flight.
        let guard = session.try_lock();
        let uri = format!("/api/session/{id}/chat");
        let Ok(request) = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message":"hi"}"#))
        else {
            unreachable!()
        };
        let response = block_on(router.oneshot(request));
        assert_eq!(
            response.ok().map(|r| r.status()),
            Some(StatusCode::CONFLICT)
        );
        drop(guard);
    }

    #[test]
    fn test_error_mapping() {
        let (status, message) = error_response(&ChatError::Busy);
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(!message.is_empty());

        let (status, _) = error_response(&ChatError::Api(ApiError::MissingCredential));
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = error_response(&ChatError::Api(ApiError::EmptyCompletion));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
