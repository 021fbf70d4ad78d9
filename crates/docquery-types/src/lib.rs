//! # docquery-types
//!
//! Shared domain types for the docquery pipeline.
//!
//! This crate defines the pieces every other crate agrees on:
//! - [`TextChunk`]: an immutable, ordered segment of extracted document text
//! - [`Settings`]: layered configuration (defaults, file, env, CLI)
//! - [`ProviderError`]: the failure contract of every external service
//! - [`with_retry`]: bounded exponential-backoff retry for transient provider errors

pub mod chunk;
pub mod config;
pub mod error;
pub mod provider;
pub mod retry;

pub use chunk::TextChunk;
pub use config::{
    AgentSettings, ChatSettings, ChunkingSettings, EmbeddingSettings, MessagingSettings,
    RetrySettings, Settings, SizeMetric,
};
pub use error::ConfigError;
pub use provider::ProviderError;
pub use retry::{with_retry, with_retry_if, RetryPolicy};
