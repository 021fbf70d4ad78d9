//! docquery
//!
//! Ask questions about a document with a retrieval agent.
//!
//! # Usage
//!
//! ```bash
//! docquery chunks <FILE> [--max-chunk-size N]
//! docquery ask <FILE> "<query>[; <query>...]"
//! docquery repl <FILE>
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/docquery/config.toml)
//! 3. `--config` file
//! 4. Environment variables (DOCQUERY__SECTION__KEY)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use docquery_cli::{ask, repl, show_chunks, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chunks {
            file,
            max_chunk_size,
        } => {
            show_chunks(
                cli.config.as_deref(),
                cli.log_level.as_deref(),
                &file,
                max_chunk_size,
            )?;
        }
        Commands::Ask {
            file,
            queries,
            no_stage,
        } => {
            ask(
                cli.config.as_deref(),
                cli.log_level.as_deref(),
                &file,
                &queries,
                !no_stage,
            )
            .await?;
        }
        Commands::Repl { file, no_stage } => {
            repl(
                cli.config.as_deref(),
                cli.log_level.as_deref(),
                &file,
                !no_stage,
            )
            .await?;
        }
    }

    Ok(())
}
