//! # docquery-embeddings
//!
//! Converts text into fixed-dimension vectors through an external embedding
//! provider.
//!
//! ## Features
//! - [`EmbeddingModel`] trait implemented by the HTTP [`ApiEmbedder`] and the
//!   offline [`MockEmbedder`]
//! - [`SizeValidator`]: rejects oversized inputs before any request is made
//! - [`EmbeddingClient`]: validation, batching and vector-shape checks around a model

pub mod api;
pub mod client;
pub mod error;
pub mod mock;
pub mod model;
pub mod validate;

pub use api::{ApiEmbedder, ApiEmbedderConfig};
pub use client::EmbeddingClient;
pub use error::{EmbeddingError, OversizedInput};
pub use mock::MockEmbedder;
pub use model::{Embedding, EmbeddingModel, ModelInfo};
pub use validate::SizeValidator;
