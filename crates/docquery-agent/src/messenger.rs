//! Messaging providers for the post tool.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::info;

use docquery_types::{with_retry_if, MessagingSettings, ProviderError, RetryPolicy, RetrySettings};

/// Confirmation of a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub channel: String,
    /// Provider message id, when returned
    pub ts: Option<String>,
}

/// Delivers text to a named channel.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn post(&self, channel: &str, text: &str) -> Result<PostReceipt, ProviderError>;
}

/// Configuration for the Slack Web API messenger.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// API base URL (e.g., "https://slack.com/api")
    pub base_url: String,

    /// Bot token; posts fail with `MissingCredential` when absent
    pub bot_token: Option<SecretString>,

    /// Request timeout
    pub timeout: Duration,

    pub retry: RetryPolicy,
}

impl SlackConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            base_url: "https://slack.com/api".to_string(),
            bot_token: Some(SecretString::from(bot_token.into())),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_settings(settings: &MessagingSettings, retry: &RetrySettings) -> Self {
        Self {
            base_url: settings.api_base_url.clone(),
            bot_token: settings.bot_token.clone().map(SecretString::from),
            timeout: Duration::from_secs(settings.timeout_secs),
            retry: RetryPolicy::from(retry),
        }
    }
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    channel: Option<String>,
}

/// Posts via `chat.postMessage`.
pub struct SlackMessenger {
    client: Client,
    config: SlackConfig,
}

impl SlackMessenger {
    pub fn new(config: SlackConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn send(
        &self,
        token: &SecretString,
        channel: &str,
        text: &str,
    ) -> Result<PostReceipt, ProviderError> {
        let url = format!("{}/chat.postMessage", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose_secret())
            .json(&PostMessageRequest { channel, text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        // Slack reports most failures as 200 with "ok": false
        if !body.ok {
            let error = body.error.unwrap_or_else(|| "unknown_error".to_string());
            return Err(if error == "ratelimited" {
                ProviderError::RateLimited
            } else {
                ProviderError::Failure(format!("Slack API error: {error}"))
            });
        }

        Ok(PostReceipt {
            channel: body.channel.unwrap_or_else(|| channel.to_string()),
            ts: body.ts,
        })
    }
}

#[async_trait]
impl Messenger for SlackMessenger {
    async fn post(&self, channel: &str, text: &str) -> Result<PostReceipt, ProviderError> {
        let token = self.config.bot_token.as_ref().ok_or_else(|| {
            ProviderError::MissingCredential("Slack bot token (SLACK_BOT_TOKEN)".to_string())
        })?;

        // A timed-out post may still have been delivered; only retry refusals
        let receipt = with_retry_if(
            &self.config.retry,
            "slack.post",
            |e| matches!(e, ProviderError::RateLimited),
            || self.send(token, channel, text),
        )
        .await?;

        info!(channel = %receipt.channel, "Message posted");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> SlackConfig {
        SlackConfig {
            base_url: server.uri(),
            retry: RetryPolicy {
                max_retries: 2,
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(5),
                max_elapsed: Duration::from_secs(10),
            },
            ..SlackConfig::new("xoxb-test")
        }
    }

    #[tokio::test]
    async fn test_post_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_json(json!({"channel": "#general", "text": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "C123", "ts": "1700000000.000100"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messenger = SlackMessenger::new(config(&server)).unwrap();
        let receipt = messenger.post("#general", "hello").await.unwrap();
        assert_eq!(receipt.channel, "C123");
        assert_eq!(receipt.ts.as_deref(), Some("1700000000.000100"));
    }

    #[tokio::test]
    async fn test_ok_false_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "channel_not_found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let messenger = SlackMessenger::new(config(&server)).unwrap();
        match messenger.post("#missing", "hello").await {
            Err(ProviderError::Failure(msg)) => assert!(msg.contains("channel_not_found")),
            other => panic!("Expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let messenger = SlackMessenger::new(config(&server)).unwrap();
        let receipt = messenger.post("#general", "hello").await.unwrap();
        assert_eq!(receipt.channel, "#general");
    }

    #[tokio::test]
    async fn test_server_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let messenger = SlackMessenger::new(config(&server)).unwrap();
        assert!(matches!(
            messenger.post("#general", "hello").await,
            Err(ProviderError::Http { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_token_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = SlackConfig {
            bot_token: None,
            ..config(&server)
        };
        let messenger = SlackMessenger::new(config).unwrap();
        assert!(matches!(
            messenger.post("#general", "hello").await,
            Err(ProviderError::MissingCredential(_))
        ));
    }
}
