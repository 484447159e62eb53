//! Startup helpers for the sumchat server.

use std::process::ExitCode;
use std::sync::Arc;

use crate::server::{self, AppState};

/// Environment variable for the listen port.
const PORT_ENV: &str = "SUMCHAT_PORT";

/// Run the server.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting sumchat v{}", env!("CARGO_PKG_VERSION"));

    // Shared state builds its blocking HTTP clients, so it must exist
    // before the async runtime does.
    let state = match AppState::new() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let port = get_port();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server(state, port)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Initialize application state without starting the server.
///
/// # Errors
/// Returns an error if state creation fails.
pub fn initialize() -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    AppState::new()
}

/// Resolve the listen port: `SUMCHAT_PORT`, then `PORT`, then the default.
fn get_port() -> u16 {
    std::env::var(PORT_ENV)
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}
