//! Client for the hosted completion endpoint.
//!
//! One wire contract only: the chat-style message list. Both the chat loop
//! and URL summarization go through [`CompletionClient::chat`].

pub mod client;

pub use client::{ApiError, CompletionClient};
