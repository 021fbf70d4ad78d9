//! Pre-flight size validation.
//!
//! Inputs are measured before anything is sent to the provider. A batch with
//! any oversized input is rejected as a whole.

use tiktoken_rs::CoreBPE;
use tracing::warn;

use docquery_types::{EmbeddingSettings, SizeMetric};

use crate::error::{EmbeddingError, OversizedInput};

/// Default per-input limit (text-embedding-3 models).
pub const DEFAULT_MAX_INPUT_SIZE: usize = 8191;

/// Measures inputs against a per-input size limit.
pub struct SizeValidator {
    limit: usize,
    metric: SizeMetric,
    bpe: Option<CoreBPE>,
}

impl SizeValidator {
    /// Create a validator. Token counting uses cl100k_base.
    pub fn new(limit: usize, metric: SizeMetric) -> Self {
        let bpe = match metric {
            SizeMetric::Chars => None,
            SizeMetric::Tokens => match tiktoken_rs::cl100k_base() {
                Ok(bpe) => Some(bpe),
                Err(e) => {
                    warn!(error = %e, "cl100k_base unavailable, estimating tokens from length");
                    None
                }
            },
        };
        Self { limit, metric, bpe }
    }

    /// Character-based validator with the given limit.
    pub fn chars(limit: usize) -> Self {
        Self::new(limit, SizeMetric::Chars)
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self::new(settings.max_input_size, settings.size_metric)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn metric(&self) -> SizeMetric {
        self.metric
    }

    /// Size of `text` under this validator's metric.
    pub fn measure(&self, text: &str) -> usize {
        match self.metric {
            SizeMetric::Chars => text.chars().count(),
            SizeMetric::Tokens => match &self.bpe {
                Some(bpe) => bpe.encode_with_special_tokens(text).len(),
                // Rough estimate: ~4 chars per token
                None => (text.chars().count() / 4).max(1),
            },
        }
    }

    /// True when every input is within the limit.
    pub fn validate<S: AsRef<str>>(&self, texts: &[S]) -> bool {
        texts.iter().all(|t| self.measure(t.as_ref()) <= self.limit)
    }

    /// Like [`validate`](Self::validate) but reports every offending input.
    pub fn check<S: AsRef<str>>(&self, texts: &[S]) -> Result<(), EmbeddingError> {
        let oversized: Vec<OversizedInput> = texts
            .iter()
            .enumerate()
            .filter_map(|(position, text)| {
                let size = self.measure(text.as_ref());
                (size > self.limit).then_some(OversizedInput { position, size })
            })
            .collect();

        if oversized.is_empty() {
            Ok(())
        } else {
            Err(EmbeddingError::ChunkTooLarge {
                limit: self.limit,
                oversized,
            })
        }
    }
}

impl Default for SizeValidator {
    fn default() -> Self {
        Self::chars(DEFAULT_MAX_INPUT_SIZE)
    }
}
