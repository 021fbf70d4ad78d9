//! # docquery-session
//!
//! Ties extraction, chunking, embedding, indexing and the query agent
//! together for one loaded document.
//!
//! - [`Workspace`]: explicit upload-directory setup and file staging
//! - [`Session`]: `build_index`, `load_document`, `query`, `query_batch`

pub mod error;
pub mod session;
pub mod workspace;

pub use error::SessionError;
pub use session::{BatchAnswer, LoadedDocument, Session, SessionConfig};
pub use workspace::Workspace;
