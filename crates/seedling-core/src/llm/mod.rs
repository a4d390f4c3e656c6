//! Chat-completion client for the generation pipeline.
//!
//! The pipeline only ever talks to the [`Completion`] trait. The production
//! implementation is [`CompletionClient`], which pairs a single-attempt
//! [`ChatTransport`] with a [`RetryPolicy`]:
//!
//! ```text
//! Orchestrator --complete(conversation)--> CompletionClient
//!                                              |
//!                                   RetryPolicy::run (backoff on transient errors)
//!                                              |
//!                                              v
//!                                   ChatTransport::send (one HTTP request)
//! ```

pub mod client;
pub mod retry;
pub mod types;

pub use client::{
    ChatTransport, ClientConfig, Completion, CompletionClient, LlmError, OpenAiTransport,
};
pub use retry::RetryPolicy;
pub use types::{ChatRequest, ChatResponse, Conversation, GenerationParams, Message, Role};
