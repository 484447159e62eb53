//! Chat service with URL summarization and selectable conversation memory.

// Strict lint policy: warnings are errors, no unsafe, everything public is documented.
#![deny(warnings)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(unused_variables)]
#![deny(unused_must_use)]
#![deny(non_snake_case)]
#![deny(non_camel_case_types)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy discipline: no unwrap/expect/panic in production paths.
#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::redundant_clone)]

/// Conversation state, memory policies, summarization, and the chat orchestrator.
pub mod chat;
/// URL fetching and visible-text extraction.
pub mod fetch;
/// Blocking client for the hosted completion endpoint.
pub mod llm;
/// HTTP server and API routes.
#[allow(clippy::unused_async)]
pub mod server;
/// Entry helpers to start the sumchat server.
pub mod startup;
