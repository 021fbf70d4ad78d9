//! Command implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use docquery_agent::{AgentOutcome, Termination};
use docquery_ingest::{extractor_for, split_text};
use docquery_session::{BatchAnswer, Session, Workspace};
use docquery_types::{Settings, TextChunk};

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Extract and chunk `file`, printing one row per chunk. No provider calls.
pub fn show_chunks(
    config_path: Option<&str>,
    log_level: Option<&str>,
    file: &Path,
    max_chunk_size: Option<usize>,
) -> Result<()> {
    let mut settings = load_settings(config_path, log_level)?;
    init_logging(&settings.log_level)?;
    if let Some(size) = max_chunk_size {
        settings.chunking.max_chunk_size = size;
    }
    settings.validate().context("Invalid configuration")?;

    let extractor = extractor_for(file)?;
    let text = extractor
        .extract(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let chunks = split_text(&text, settings.chunking.max_chunk_size)?;

    print!("{}", format_chunk_table(&chunks, settings.chunking.max_chunk_size));
    Ok(())
}

/// Index `file` and answer the `;`-separated `queries`.
pub async fn ask(
    config_path: Option<&str>,
    log_level: Option<&str>,
    file: &Path,
    queries: &str,
    stage: bool,
) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings.log_level)?;

    let session = open_session(&settings, file, stage).await?;
    for answer in session.query_batch(queries).await? {
        print_answer(&answer);
    }
    Ok(())
}

/// Index `file` once, then answer each line read from stdin.
pub async fn repl(
    config_path: Option<&str>,
    log_level: Option<&str>,
    file: &Path,
    stage: bool,
) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings.log_level)?;

    let session = open_session(&settings, file, stage).await?;
    println!("Enter your query (separate multiple queries with ';', 'exit' to quit):");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        if line.is_empty() {
            println!("Empty query");
            continue;
        }

        match session.query_batch(line).await {
            Ok(answers) => answers.iter().for_each(print_answer),
            Err(e) => println!("Error: {e}"),
        }
    }
    Ok(())
}

async fn open_session(settings: &Settings, file: &Path, stage: bool) -> Result<Session> {
    let path: PathBuf = if stage {
        let workspace = Workspace::from_settings(settings)?;
        workspace
            .stage(file)
            .with_context(|| format!("Failed to stage {}", file.display()))?
    } else {
        file.to_path_buf()
    };
    debug!(path = ?path, "Opening document");

    let mut session = Session::from_settings(settings)?;
    let loaded = session
        .load_document(&path)
        .await
        .with_context(|| format!("Failed to index {}", path.display()))?;
    info!(chunks = loaded.index.len(), "Document ready");
    Ok(session)
}

fn print_answer(answer: &BatchAnswer) {
    match &answer.outcome {
        Ok(outcome) => println!("Response for '{}': {}", answer.query, describe(outcome)),
        Err(e) => println!("Response for '{}': Error: {}", answer.query, e),
    }
}

fn describe(outcome: &AgentOutcome) -> String {
    match &outcome.termination {
        Termination::FinalAnswer => outcome.answer.clone(),
        Termination::Posted { delivered: true, .. } => outcome.answer.clone(),
        Termination::Posted {
            delivered: false,
            channel,
        } => format!("{} (not delivered to {channel})", outcome.answer),
    }
}

/// Render chunk sizes as a fixed-width table.
pub fn format_chunk_table(chunks: &[TextChunk], max_chunk_size: usize) -> String {
    const PREVIEW: usize = 48;

    let mut out = format!("{:>5}  {:>7}  {}\n", "#", "chars", "preview");
    for chunk in chunks {
        let preview: String = chunk
            .content()
            .chars()
            .take(PREVIEW)
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .collect();
        let marker = if chunk.char_len() > max_chunk_size { "*" } else { " " };
        out.push_str(&format!(
            "{:>5}  {:>6}{}  {}\n",
            chunk.index(),
            chunk.char_len(),
            marker,
            preview
        ));
    }

    let total: usize = chunks.iter().map(TextChunk::char_len).sum();
    out.push_str(&format!(
        "{} chunks, {} chars, max {}",
        chunks.len(),
        total,
        max_chunk_size
    ));
    if chunks.iter().any(|c| c.char_len() > max_chunk_size) {
        out.push_str(" (* = single paragraph over the limit)");
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_table() {
        let text = format!("short one\n{}\ntail", "y".repeat(30));
        let chunks = split_text(&text, 20).unwrap();

        let table = format_chunk_table(&chunks, 20);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), chunks.len() + 2);
        assert!(lines[0].contains("chars"));
        assert!(lines[2].contains("30*"));
        assert!(lines.last().unwrap().starts_with("3 chunks"));
        assert!(table.contains("single paragraph over the limit"));
    }

    #[test]
    fn test_describe_undelivered_post() {
        let outcome = AgentOutcome {
            answer: "Failed to post message: timeout".to_string(),
            termination: Termination::Posted {
                channel: "#ops".to_string(),
                delivered: false,
            },
            iterations: 1,
            searches: 0,
        };
        assert!(describe(&outcome).ends_with("(not delivered to #ops)"));
    }
}
