//! CLI argument parsing for docquery.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// docquery
///
/// Load a document, index it, and answer questions with a retrieval agent.
#[derive(Parser, Debug)]
#[command(name = "docquery")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/docquery/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// docquery commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract and chunk a document without calling any provider
    Chunks {
        /// PDF or text file
        file: PathBuf,

        /// Override chunking.max_chunk_size
        #[arg(short, long)]
        max_chunk_size: Option<usize>,
    },

    /// Index a document and answer one or more queries
    Ask {
        /// PDF or text file
        file: PathBuf,

        /// Queries separated by ';'
        queries: String,

        /// Read the file in place instead of copying it to the upload directory
        #[arg(long)]
        no_stage: bool,
    },

    /// Index a document once, then answer queries read from stdin
    Repl {
        /// PDF or text file
        file: PathBuf,

        /// Read the file in place instead of copying it to the upload directory
        #[arg(long)]
        no_stage: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_chunks() {
        let cli = Cli::parse_from(["docquery", "chunks", "report.pdf", "-m", "500"]);
        match cli.command {
            Commands::Chunks {
                file,
                max_chunk_size,
            } => {
                assert_eq!(file, PathBuf::from("report.pdf"));
                assert_eq!(max_chunk_size, Some(500));
            }
            _ => panic!("Expected Chunks command"),
        }
    }

    #[test]
    fn test_cli_ask() {
        let cli = Cli::parse_from(["docquery", "ask", "report.pdf", "what?; and why?"]);
        match cli.command {
            Commands::Ask {
                queries, no_stage, ..
            } => {
                assert_eq!(queries, "what?; and why?");
                assert!(!no_stage);
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_cli_repl_no_stage() {
        let cli = Cli::parse_from(["docquery", "repl", "notes.txt", "--no-stage"]);
        assert!(matches!(cli.command, Commands::Repl { no_stage: true, .. }));
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from([
            "docquery",
            "--config",
            "/path/to/config.toml",
            "chunks",
            "a.txt",
        ]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
    }

    #[test]
    fn test_cli_with_log_level() {
        let cli = Cli::parse_from(["docquery", "chunks", "a.txt", "--log-level", "debug"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_ask_requires_queries() {
        assert!(Cli::try_parse_from(["docquery", "ask", "report.pdf"]).is_err());
    }
}
