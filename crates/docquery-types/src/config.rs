//! Configuration loading for docquery.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! Default config file lives at ~/.config/docquery/config.toml.
//! API credentials are read from the environment when the file leaves them unset.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment variables consulted for the OpenAI key, in order.
pub const OPENAI_KEY_VARS: &[&str] = &["OPENAI_API_KEY", "OPENAI_KEY_PROJECT"];

/// Environment variable consulted for the Anthropic key.
pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Environment variable holding the Slack bot token.
pub const SLACK_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";

/// How chunk sizes are measured before embedding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SizeMetric {
    /// Unicode characters
    #[default]
    Chars,
    /// cl100k_base tokens
    Tokens,
}

/// Chunker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingSettings {
    /// Soft upper bound on chunk length in characters
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
}

fn default_max_chunk_size() -> usize {
    1000
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
        }
    }
}

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name ("openai" or "mock")
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API key (loaded from env var, not stored in config file)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Maximum size of a single input
    #[serde(default = "default_max_input_size")]
    pub max_input_size: usize,

    /// How input size is measured
    #[serde(default)]
    pub size_metric: SizeMetric,

    /// Expected vector dimension; checked when set
    #[serde(default)]
    pub dimension: Option<usize>,

    /// Inputs per provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-large".to_string()
}

fn default_max_input_size() -> usize {
    8191
}

fn default_batch_size() -> usize {
    256
}

fn default_provider_timeout() -> u64 {
    30
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_key: None,
            api_base_url: None,
            max_input_size: default_max_input_size(),
            size_metric: SizeMetric::default(),
            dimension: None,
            batch_size: default_batch_size(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Chat completion provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Provider name ("openai" or "anthropic")
    #[serde(default = "default_chat_provider")]
    pub provider: String,

    /// Model name
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API key (loaded from env var, not stored in config file)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base_url: Option<String>,

    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
}

fn default_chat_provider() -> String {
    "openai".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_chat_timeout() -> u64 {
    60
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: default_chat_provider(),
            model: default_chat_model(),
            api_key: None,
            api_base_url: None,
            temperature: 0.0,
            timeout_secs: default_chat_timeout(),
        }
    }
}

/// Messaging provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingSettings {
    /// Slack Web API base URL
    #[serde(default = "default_slack_base_url")]
    pub api_base_url: String,

    /// Bot token (loaded from SLACK_BOT_TOKEN when unset)
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,

    /// Channel used when a post decision names none
    #[serde(default = "default_channel")]
    pub default_channel: String,

    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_slack_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_channel() -> String {
    "#testchannel".to_string()
}

impl Default for MessagingSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_slack_base_url(),
            bot_token: None,
            default_channel: default_channel(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Control loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Iteration budget per query
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Chunks retrieved per search
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Return right after a post instead of feeding the result back to the model
    #[serde(default = "default_post_terminates")]
    pub post_terminates: bool,
}

fn default_max_iterations() -> usize {
    10
}

fn default_top_k() -> usize {
    5
}

fn default_post_terminates() -> bool {
    true
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            top_k: default_top_k(),
            post_terminates: default_post_terminates(),
        }
    }
}

/// Retry settings for transient provider failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    #[serde(default = "default_max_elapsed_secs")]
    pub max_elapsed_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_interval_ms() -> u64 {
    500
}

fn default_max_interval_ms() -> u64 {
    10_000
}

fn default_max_elapsed_secs() -> u64 {
    120
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            max_elapsed_secs: default_max_elapsed_secs(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory input documents are staged into
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default)]
    pub chunking: ChunkingSettings,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub chat: ChatSettings,

    #[serde(default)]
    pub messaging: MessagingSettings,

    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_upload_dir() -> String {
    ProjectDirs::from("", "", "docquery")
        .map(|p| p.data_local_dir().join("uploads"))
        .unwrap_or_else(|| PathBuf::from("./uploads"))
        .to_string_lossy()
        .to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            upload_dir: default_upload_dir(),
            chunking: ChunkingSettings::default(),
            embedding: EmbeddingSettings::default(),
            chat: ChatSettings::default(),
            messaging: MessagingSettings::default(),
            agent: AgentSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/docquery/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (DOCQUERY__SECTION__KEY)
    ///
    /// Credentials still unset afterwards are filled from the provider
    /// environment variables. CLI flags are applied by the caller.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "docquery")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())?
            .set_default("upload_dir", default_upload_dir())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: DOCQUERY__CHAT__MODEL, DOCQUERY__AGENT__TOP_K, etc.
        builder = builder.add_source(
            Environment::with_prefix("DOCQUERY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.resolve_credentials(|name| std::env::var(name).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Fill unset credentials using `lookup` (normally the process environment).
    pub fn resolve_credentials<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let openai_key = || OPENAI_KEY_VARS.iter().find_map(|var| non_empty(*var));

        if self.embedding.api_key.is_none() {
            self.embedding.api_key = openai_key();
        }
        if self.chat.api_key.is_none() {
            self.chat.api_key = if self.chat.provider == "anthropic" {
                non_empty(ANTHROPIC_KEY_VAR)
            } else {
                openai_key()
            };
        }
        if self.messaging.bot_token.is_none() {
            self.messaging.bot_token = non_empty(SLACK_TOKEN_VAR);
        }
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.max_chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "chunking.max_chunk_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.embedding.max_input_size == 0 {
            return Err(ConfigError::Invalid {
                field: "embedding.max_input_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "embedding.batch_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "agent.max_iterations",
                reason: "must be > 0".to_string(),
            });
        }
        if self.agent.top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "agent.top_k",
                reason: "must be >= 1".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::Invalid {
                field: "chat.temperature",
                reason: format!("must be 0.0-2.0, got {}", self.chat.temperature),
            });
        }
        Ok(())
    }

    /// Upload directory with a leading `~/` expanded.
    pub fn expanded_upload_dir(&self) -> PathBuf {
        if let Some(rest) = self.upload_dir.strip_prefix("~/") {
            if let Some(dirs) = BaseDirs::new() {
                return dirs.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.upload_dir)
    }
}
