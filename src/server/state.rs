//! Application state shared across all request handlers.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::chat::session::{Session, SessionId};
use crate::fetch::FetchService;
use crate::llm::CompletionClient;

/// Shared application state.
///
/// Sessions live here for the lifetime of the process; each one is wrapped
/// in its own mutex so a request in flight blocks only that session.
pub struct AppState {
    /// Per-session state, keyed by session id.
    pub sessions: DashMap<SessionId, Arc<Mutex<Session>>>,
    /// Page fetcher for URL summarization.
    pub fetcher: FetchService,
    /// Completion endpoint client.
    pub completions: CompletionClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    /// Returns an error if either HTTP client cannot be created.
    pub fn new() -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let fetcher = FetchService::with_defaults()
            .map_err(|e| format!("Failed to create page fetcher: {e}"))?;
        let completions = CompletionClient::from_env()
            .map_err(|e| format!("Failed to create completion client: {e}"))?;

        Ok(Arc::new(Self {
            sessions: DashMap::new(),
            fetcher,
            completions,
        }))
    }

    /// Create and register a fresh session.
    pub fn create_session(&self) -> SessionId {
        let session = Session::new();
        let id = session.id;
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        tracing::info!(session = %id, "Session created");
        id
    }

    /// Look up a session by id.
    #[must_use]
    pub fn session(&self, id: SessionId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }
}
