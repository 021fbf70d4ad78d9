//! docquery CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (chunks, ask, repl)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{ask, repl, show_chunks};
