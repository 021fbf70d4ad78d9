//! Scripted providers for testing without network access.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::json;

use docquery_types::ProviderError;

use crate::chat::ChatModel;
use crate::error::AgentError;
use crate::messenger::{Messenger, PostReceipt};
use crate::retriever::{RetrievedChunk, Retriever};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Chat model that replays a fixed list of replies and records every prompt.
///
/// Once the script runs out, calls fail unless a repeating reply was set.
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<String>>,
    repeat: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChatModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            repeat: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with `reply`.
    pub fn repeating(reply: impl Into<String>) -> Self {
        Self {
            repeat: Some(reply.into()),
            ..Self::new(Vec::<String>::new())
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Reply choosing the search tool.
    pub fn search(query: &str) -> String {
        decision("SearchTool", query, None)
    }

    /// Reply choosing the post tool with the default channel.
    pub fn post(message: &str) -> String {
        decision("SlackTool", message, None)
    }

    pub fn post_to(message: &str, channel: &str) -> String {
        decision("SlackTool", message, Some(channel))
    }

    pub fn final_answer(answer: &str) -> String {
        decision("FinalAnswer", answer, None)
    }
}

fn decision(action: &str, input: &str, channel: Option<&str>) -> String {
    let mut value = json!({
        "thoughts": format!("choosing {action}"),
        "action": action,
        "action_input": input,
    });
    if let Some(channel) = channel {
        value["channel"] = json!(channel);
    }
    value.to_string()
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        lock(&self.prompts).push(prompt.to_string());
        if let Some(reply) = lock(&self.replies).pop_front() {
            return Ok(reply);
        }
        self.repeat
            .clone()
            .ok_or_else(|| ProviderError::Failure("chat script exhausted".to_string()))
    }
}

/// Messenger that records posts instead of sending them.
#[derive(Default)]
pub struct RecordingMessenger {
    posts: Mutex<Vec<(String, String)>>,
    failure: Option<ProviderError>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record each post, then fail it with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// `(channel, text)` pairs in call order.
    pub fn posts(&self) -> Vec<(String, String)> {
        lock(&self.posts).clone()
    }

    pub fn post_count(&self) -> usize {
        lock(&self.posts).len()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn post(&self, channel: &str, text: &str) -> Result<PostReceipt, ProviderError> {
        lock(&self.posts).push((channel.to_string(), text.to_string()));
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(PostReceipt {
                channel: channel.to_string(),
                ts: None,
            }),
        }
    }
}

/// Retriever over a fixed chunk list; returns the first `top_k` in order.
pub struct MockRetriever {
    chunks: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl MockRetriever {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }

    pub fn search_count(&self) -> usize {
        lock(&self.queries).len()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, AgentError> {
        lock(&self.queries).push(query.to_string());
        Ok(self
            .chunks
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(position, content)| RetrievedChunk {
                position,
                distance: position as f32,
                content: content.clone(),
            })
            .collect())
    }
}
