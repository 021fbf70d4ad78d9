//! Per-document session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use docquery_agent::{
    AgentConfig, AgentOutcome, ApiChatConfig, ApiChatModel, ChatModel, DocumentIndex,
    IndexRetriever, Messenger, QueryAgent, SlackConfig, SlackMessenger,
};
use docquery_embeddings::{
    ApiEmbedder, ApiEmbedderConfig, EmbeddingClient, EmbeddingModel, MockEmbedder, SizeValidator,
};
use docquery_ingest::{extractor_for, split_text};
use docquery_types::{ProviderError, Settings};

use crate::error::SessionError;

/// Dimension used by the offline `mock` embedding provider when none is configured.
const MOCK_DIMENSION: usize = 256;

/// Session-level tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_chunk_size: usize,
    pub agent: AgentConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            agent: AgentConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_chunk_size: settings.chunking.max_chunk_size,
            agent: AgentConfig::from_settings(&settings.agent, &settings.messaging),
        }
    }
}

/// Result of [`Session::load_document`].
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub index: Arc<DocumentIndex>,
    /// True when the path matched the current document and nothing was rebuilt
    pub reused: bool,
}

/// One query of a batch and what became of it.
#[derive(Debug)]
pub struct BatchAnswer {
    pub query: String,
    pub outcome: Result<AgentOutcome, SessionError>,
}

/// Holds the providers and the currently indexed document.
pub struct Session {
    embedder: EmbeddingClient,
    chat: Arc<dyn ChatModel>,
    messenger: Arc<dyn Messenger>,
    config: SessionConfig,
    document: Option<Arc<DocumentIndex>>,
}

impl Session {
    pub fn new(
        embedder: EmbeddingClient,
        chat: Arc<dyn ChatModel>,
        messenger: Arc<dyn Messenger>,
        config: SessionConfig,
    ) -> Self {
        Self {
            embedder,
            chat,
            messenger,
            config,
            document: None,
        }
    }

    /// Build providers from settings.
    ///
    /// Missing credentials are not an error here; they surface as
    /// `MissingCredential` on first use, before any request is sent.
    pub fn from_settings(settings: &Settings) -> Result<Self, SessionError> {
        let model: Arc<dyn EmbeddingModel> = match settings.embedding.provider.as_str() {
            "openai" => Arc::new(ApiEmbedder::new(ApiEmbedderConfig::from_settings(
                &settings.embedding,
                &settings.retry,
            ))?),
            "mock" => Arc::new(MockEmbedder::new(
                settings.embedding.dimension.unwrap_or(MOCK_DIMENSION),
            )),
            other => {
                return Err(ProviderError::Config(format!("unknown embedding provider: {other}")).into())
            }
        };
        let embedder = EmbeddingClient::new(model, SizeValidator::from_settings(&settings.embedding));

        let chat = ApiChatModel::new(ApiChatConfig::from_settings(&settings.chat, &settings.retry))?;
        let messenger = SlackMessenger::new(SlackConfig::from_settings(
            &settings.messaging,
            &settings.retry,
        ))?;

        Ok(Self::new(
            embedder,
            Arc::new(chat),
            Arc::new(messenger),
            SessionConfig::from_settings(settings),
        ))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Currently indexed document, if any.
    pub fn document(&self) -> Option<&Arc<DocumentIndex>> {
        self.document.as_ref()
    }

    /// Chunk, validate, embed and index `text`, replacing the current document.
    pub async fn build_index(&mut self, text: &str) -> Result<Arc<DocumentIndex>, SessionError> {
        let document = Arc::new(self.index_text(text).await?);
        self.document = Some(document.clone());
        Ok(document)
    }

    /// Extract and index the file at `path`.
    ///
    /// Loading the path that is already indexed reuses the existing index.
    pub async fn load_document(&mut self, path: &Path) -> Result<LoadedDocument, SessionError> {
        let path = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());

        if let Some(current) = &self.document {
            if current.source() == Some(path.as_path()) {
                info!(path = ?path, "Document already processed, reusing index");
                return Ok(LoadedDocument {
                    index: current.clone(),
                    reused: true,
                });
            }
        }

        let text = extract(path.clone()).await?;
        info!(path = ?path, chars = text.chars().count(), "Text extracted");

        let document = Arc::new(self.index_text(&text).await?.with_source(path));
        self.document = Some(document.clone());
        Ok(LoadedDocument {
            index: document,
            reused: false,
        })
    }

    /// Answer one query against the current document.
    pub async fn query(&self, query: &str) -> Result<AgentOutcome, SessionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SessionError::InvalidInput("Empty query".to_string()));
        }
        let document = self.document.clone().ok_or(SessionError::NoDocument)?;

        let retriever = IndexRetriever::new(self.embedder.clone(), document)?;
        let agent = QueryAgent::new(
            self.chat.clone(),
            Arc::new(retriever),
            self.messenger.clone(),
            self.config.agent.clone(),
        );

        Ok(agent.run(query).await?)
    }

    /// Answer each `;`-separated query in order.
    ///
    /// Blank entries are skipped. A failing query does not stop the rest.
    pub async fn query_batch(&self, input: &str) -> Result<Vec<BatchAnswer>, SessionError> {
        let queries: Vec<&str> = input
            .split(';')
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .collect();

        if queries.is_empty() {
            return Err(SessionError::InvalidInput("All queries are empty".to_string()));
        }
        if self.document.is_none() {
            return Err(SessionError::NoDocument);
        }

        let mut answers = Vec::with_capacity(queries.len());
        for query in queries {
            let outcome = self.query(query).await;
            if let Err(e) = &outcome {
                warn!(query, error = %e, "Query failed");
            }
            answers.push(BatchAnswer {
                query: query.to_string(),
                outcome,
            });
        }
        Ok(answers)
    }

    async fn index_text(&self, text: &str) -> Result<DocumentIndex, SessionError> {
        let chunks = split_text(text, self.config.max_chunk_size)?;
        info!(chunks = chunks.len(), "Text split into chunks");

        let contents: Vec<String> = chunks.iter().map(|c| c.content().to_string()).collect();
        self.embedder.check_sizes(&contents)?;

        let embeddings = self.embedder.embed(&contents).await?;
        let document = DocumentIndex::build(chunks, embeddings, self.embedder.info().clone())?;
        info!(
            vectors = document.len(),
            model = %document.model().name,
            "Document indexed"
        );
        Ok(document)
    }
}

/// Run the blocking extractor off the async runtime.
async fn extract(path: PathBuf) -> Result<String, SessionError> {
    tokio::task::spawn_blocking(move || {
        let extractor = extractor_for(&path)?;
        extractor.extract(&path)
    })
    .await
    .map_err(|e| SessionError::Task(e.to_string()))?
    .map_err(SessionError::from)
}
