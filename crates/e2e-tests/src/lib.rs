//! End-to-end test infrastructure for docquery.
//!
//! Provides a shared TestHarness wiring a [`Session`] to offline providers:
//! a hashed bag-of-words embedder, a scripted chat model and a recording
//! messenger.

use std::path::PathBuf;
use std::sync::Arc;

use docquery_agent::{AgentConfig, RecordingMessenger, ScriptedChatModel};
use docquery_embeddings::{EmbeddingClient, MockEmbedder, SizeValidator};
use docquery_session::{Session, SessionConfig, Workspace};

/// A small policy handbook; one topic per paragraph group.
pub const HANDBOOK: &str = "\
Employee Handbook

Vacation: full-time employees accrue fifteen vacation days per year.
Unused vacation days roll over up to a maximum of five days.

Expenses: submit expense reports within thirty days of purchase.
Receipts are required for any expense above twenty five dollars.

Remote work: employees may work remotely up to three days per week.
Remote work requires manager approval for the first month.

Security: report lost laptops to the security team within one hour.
Passwords must be rotated every ninety days.";

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub workspace: Workspace,
    pub embedder: Arc<MockEmbedder>,
    pub chat: Arc<ScriptedChatModel>,
    pub messenger: Arc<RecordingMessenger>,
}

impl TestHarness {
    /// Harness whose chat model replays `replies` in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_chat(ScriptedChatModel::new(replies))
    }

    pub fn with_chat(chat: ScriptedChatModel) -> Self {
        Self::with_parts(chat, RecordingMessenger::new())
    }

    pub fn with_parts(chat: ScriptedChatModel, messenger: RecordingMessenger) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let workspace =
            Workspace::init(temp_dir.path().join("uploads")).expect("Failed to init workspace");

        Self {
            _temp_dir: temp_dir,
            workspace,
            embedder: Arc::new(MockEmbedder::new(256)),
            chat: Arc::new(chat),
            messenger: Arc::new(messenger),
        }
    }

    /// Session over the harness providers with default agent settings.
    pub fn session(&self, max_chunk_size: usize) -> Session {
        self.session_with(SessionConfig {
            max_chunk_size,
            agent: AgentConfig::default(),
        })
    }

    pub fn session_with(&self, config: SessionConfig) -> Session {
        Session::new(
            EmbeddingClient::new(self.embedder.clone(), SizeValidator::default()),
            self.chat.clone(),
            self.messenger.clone(),
            config,
        )
    }

    /// Write `text` to a file outside the upload directory and stage it.
    pub fn staged_document(&self, name: &str, text: &str) -> PathBuf {
        let source = self._temp_dir.path().join(name);
        std::fs::write(&source, text).expect("Failed to write document");
        self.workspace
            .stage(&source)
            .expect("Failed to stage document")
    }
}
