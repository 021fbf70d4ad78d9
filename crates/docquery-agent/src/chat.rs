//! Chat completion providers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use docquery_types::{with_retry, ChatSettings, ProviderError, RetryPolicy, RetrySettings};

/// Produces the model's reply to a single prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Wire protocol spoken by the chat endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatApi {
    /// `POST {base}/chat/completions` with JSON response format
    OpenAi,
    /// `POST {base}/messages`
    Anthropic,
}

/// Configuration for API-based chat model.
#[derive(Debug, Clone)]
pub struct ApiChatConfig {
    pub api: ChatApi,

    /// API base URL (e.g., "https://api.openai.com/v1")
    pub base_url: String,

    /// Model to use (e.g., "gpt-4o-mini", "claude-3-haiku-20240307")
    pub model: String,

    /// API key; requests fail with `MissingCredential` when absent
    pub api_key: Option<SecretString>,

    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,

    pub retry: RetryPolicy,
}

impl ApiChatConfig {
    /// Create config for OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api: ChatApi::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            api_key: Some(SecretString::from(api_key.into())),
            temperature: 0.0,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }

    /// Create config for Claude API.
    pub fn claude(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api: ChatApi::Anthropic,
            base_url: "https://api.anthropic.com/v1".to_string(),
            ..Self::openai(api_key, model)
        }
    }

    pub fn from_settings(settings: &ChatSettings, retry: &RetrySettings) -> Self {
        let (api, default_base) = if settings.provider.eq_ignore_ascii_case("anthropic") {
            (ChatApi::Anthropic, "https://api.anthropic.com/v1")
        } else {
            (ChatApi::OpenAi, "https://api.openai.com/v1")
        };

        Self {
            api,
            base_url: settings
                .api_base_url
                .clone()
                .unwrap_or_else(|| default_base.to_string()),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().map(SecretString::from),
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
            retry: RetryPolicy::from(retry),
        }
    }
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

/// API-based chat model implementation.
pub struct ApiChatModel {
    client: Client,
    config: ApiChatConfig,
}

impl ApiChatModel {
    /// Create a new API chat model.
    pub fn new(config: ApiChatConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Make a single API request.
    async fn make_request(&self, api_key: &SecretString, prompt: &str) -> Result<String, ProviderError> {
        match self.config.api {
            ChatApi::OpenAi => self.make_openai_request(api_key, prompt).await,
            ChatApi::Anthropic => self.make_anthropic_request(api_key, prompt).await,
        }
    }

    /// Make OpenAI-compatible API request.
    async fn make_openai_request(
        &self,
        api_key: &SecretString,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let request = OpenAiRequest {
            model: &self.config.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.config.base_url);
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

        let body: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))
    }

    /// Make Anthropic API request.
    async fn make_anthropic_request(
        &self,
        api_key: &SecretString,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens: 1024,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/messages", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        body.content
            .into_iter()
            .find_map(|c| c.text)
            .ok_or_else(|| ProviderError::InvalidResponse("No content in response".to_string()))
    }
}

#[async_trait]
impl ChatModel for ApiChatModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            let var = match self.config.api {
                ChatApi::OpenAi => "OPENAI_API_KEY",
                ChatApi::Anthropic => "ANTHROPIC_API_KEY",
            };
            ProviderError::MissingCredential(format!("chat API key ({var})"))
        })?;

        with_retry(&self.config.retry, "chat", || self.make_request(api_key, prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            max_elapsed: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_openai_config() {
        let config = ApiChatConfig::openai("test-key", "gpt-4o-mini");
        assert!(config.base_url.contains("openai"));
        assert_eq!(config.api, ChatApi::OpenAi);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_claude_config() {
        let config = ApiChatConfig::claude("test-key", "claude-3-haiku-20240307");
        assert!(config.base_url.contains("anthropic"));
        assert_eq!(config.api, ChatApi::Anthropic);
        assert_eq!(config.model, "claude-3-haiku-20240307");
    }

    #[test]
    fn test_from_settings_selects_api() {
        let settings = ChatSettings {
            provider: "Anthropic".to_string(),
            ..ChatSettings::default()
        };
        let config = ApiChatConfig::from_settings(&settings, &RetrySettings::default());
        assert_eq!(config.api, ChatApi::Anthropic);
        assert!(config.base_url.contains("anthropic"));
    }

    #[tokio::test]
    async fn test_openai_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "{\"action\": \"FinalAnswer\"}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ApiChatConfig {
            base_url: server.uri(),
            ..ApiChatConfig::openai("test-key", "gpt-4o-mini")
        };
        let model = ApiChatModel::new(config).unwrap();
        let reply = model.complete("prompt").await.unwrap();
        assert_eq!(reply, "{\"action\": \"FinalAnswer\"}");
    }

    #[tokio::test]
    async fn test_anthropic_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "hello"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ApiChatConfig {
            base_url: server.uri(),
            ..ApiChatConfig::claude("test-key", "claude-3-haiku-20240307")
        };
        let model = ApiChatModel::new(config).unwrap();
        assert_eq!(model.complete("prompt").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_rate_limit_retried_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ApiChatConfig {
            base_url: server.uri(),
            retry: fast_retry(),
            ..ApiChatConfig::openai("test-key", "gpt-4o-mini")
        };
        let model = ApiChatModel::new(config).unwrap();
        assert_eq!(model.complete("prompt").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_missing_key() {
        let config = ApiChatConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiChatConfig::openai("unused", "gpt-4o-mini")
        };
        let model = ApiChatModel::new(config).unwrap();
        assert!(matches!(
            model.complete("prompt").await,
            Err(ProviderError::MissingCredential(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let config = ApiChatConfig {
            base_url: server.uri(),
            retry: fast_retry(),
            ..ApiChatConfig::openai("test-key", "gpt-4o-mini")
        };
        let model = ApiChatModel::new(config).unwrap();
        assert!(matches!(
            model.complete("prompt").await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
