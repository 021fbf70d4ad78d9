//! # docquery-agent
//!
//! Bounded tool-using agent that answers a query over an indexed document.
//!
//! Each iteration asks a chat model for a JSON [`Decision`], then searches
//! the document, posts to a messaging channel, or returns a final answer.
//!
//! ## Features
//! - [`QueryAgent`]: the control loop with an iteration budget
//! - [`ChatModel`] / [`ApiChatModel`]: OpenAI-compatible or Anthropic chat completion
//! - [`Messenger`] / [`SlackMessenger`]: `chat.postMessage` delivery
//! - [`Retriever`] / [`IndexRetriever`]: top-k chunk lookup over a [`DocumentIndex`]
//! - Scripted fakes in [`mock`] for tests and offline runs

pub mod agent;
pub mod chat;
pub mod decision;
pub mod document;
pub mod error;
pub mod messenger;
pub mod mock;
pub mod prompt;
pub mod retriever;
pub mod state;
pub mod tools;

pub use agent::{AgentConfig, AgentOutcome, QueryAgent, Termination};
pub use chat::{ApiChatConfig, ApiChatModel, ChatApi, ChatModel};
pub use decision::{parse_decision, Action, Decision};
pub use document::DocumentIndex;
pub use error::AgentError;
pub use messenger::{Messenger, PostReceipt, SlackConfig, SlackMessenger};
pub use mock::{MockRetriever, RecordingMessenger, ScriptedChatModel};
pub use retriever::{IndexRetriever, RetrievedChunk, Retriever};
pub use state::{AgentState, LoopState};
pub use tools::Tool;
