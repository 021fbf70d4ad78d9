//! # docquery-vector
//!
//! Vector index for docquery.
//!
//! Stores one embedding per chunk in chunk order and answers k-nearest
//! queries by exact squared Euclidean distance. A result's `position` is the
//! index of the chunk it was built from.

pub mod error;
pub mod flat;
pub mod index;

pub use error::VectorError;
pub use flat::FlatIndex;
pub use index::{IndexStats, SearchResult, VectorIndex};
