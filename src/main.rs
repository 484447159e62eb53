//! Binary entrypoint that launches the sumchat server.

use std::process::ExitCode;

use sumchat::startup;

/// Start the server: tracing, shared state, then the HTTP listener.
fn main() -> ExitCode {
    startup::run()
}
