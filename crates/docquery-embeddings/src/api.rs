//! API-based embedder using OpenAI-compatible endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use docquery_types::{with_retry, EmbeddingSettings, ProviderError, RetryPolicy, RetrySettings};

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Configuration for API-based embedder.
#[derive(Debug, Clone)]
pub struct ApiEmbedderConfig {
    /// API base URL (e.g., "https://api.openai.com/v1")
    pub base_url: String,

    /// Model to use (e.g., "text-embedding-3-large")
    pub model: String,

    /// API key; requests fail with `MissingCredential` when absent
    pub api_key: Option<SecretString>,

    /// Expected vector dimension, when known
    pub dimension: Option<usize>,

    /// Inputs per request
    pub batch_size: usize,

    /// Request timeout
    pub timeout: Duration,

    pub retry: RetryPolicy,
}

impl ApiEmbedderConfig {
    /// Create config for OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            dimension: known_dimension(&model),
            model,
            api_key: Some(SecretString::from(api_key.into())),
            batch_size: 256,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_settings(settings: &EmbeddingSettings, retry: &RetrySettings) -> Self {
        Self {
            base_url: settings
                .api_base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().map(SecretString::from),
            dimension: settings.dimension.or_else(|| known_dimension(&settings.model)),
            batch_size: settings.batch_size.max(1),
            timeout: Duration::from_secs(settings.timeout_secs),
            retry: RetryPolicy::from(retry),
        }
    }
}

/// Output dimension of well-known OpenAI embedding models.
pub fn known_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-large" => Some(3072),
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        _ => None,
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// API-based embedder implementation.
pub struct ApiEmbedder {
    client: Client,
    config: ApiEmbedderConfig,
    info: ModelInfo,
}

impl ApiEmbedder {
    /// Create a new API embedder. A zero `batch_size` is treated as 1.
    pub fn new(mut config: ApiEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.batch_size = config.batch_size.max(1);
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        let info = ModelInfo {
            name: config.model.clone(),
            dimension: config.dimension,
        };

        Ok(Self {
            client,
            config,
            info,
        })
    }

    /// Make a single API request for one batch.
    async fn request(
        &self,
        api_key: &SecretString,
        batch: &[String],
    ) -> Result<Vec<Embedding>, ProviderError> {
        let url = format!("{}/embeddings", self.config.base_url);
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: batch,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if body.data.len() != batch.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                body.data.len()
            )));
        }

        // The API may return items out of order; `index` is authoritative
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; batch.len()];
        for item in body.data {
            let slot = slots.get_mut(item.index).ok_or_else(|| {
                ProviderError::InvalidResponse(format!("embedding index {} out of range", item.index))
            })?;
            *slot = Some(item.embedding);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.map(Embedding::new).ok_or_else(|| {
                    ProviderError::InvalidResponse(format!("missing embedding for input {i}"))
                })
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingModel for ApiEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            ProviderError::MissingCredential("embedding API key (OPENAI_API_KEY)".to_string())
        })?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for (batch_no, batch) in texts.chunks(self.config.batch_size).enumerate() {
            debug!(batch = batch_no, size = batch.len(), "Requesting embeddings");
            let vectors =
                with_retry(&self.config.retry, "embeddings", || self.request(api_key, batch))
                    .await?;
            embeddings.extend(vectors);
        }
        Ok(embeddings)
    }
}
