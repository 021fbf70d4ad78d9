//! The query control loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use docquery_types::{AgentSettings, MessagingSettings};

use crate::chat::ChatModel;
use crate::decision::{parse_decision, Action};
use crate::error::AgentError;
use crate::messenger::Messenger;
use crate::prompt::build_prompt;
use crate::retriever::Retriever;
use crate::state::{AgentState, LoopState};

/// Loop limits and tool defaults.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Decisions allowed before giving up
    pub max_iterations: usize,
    /// Chunks returned per search
    pub top_k: usize,
    /// Channel used when a post names none
    pub default_channel: String,
    /// Whether a post ends the run
    pub post_terminates: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            top_k: 5,
            default_channel: "#testchannel".to_string(),
            post_terminates: true,
        }
    }
}

impl AgentConfig {
    pub fn from_settings(agent: &AgentSettings, messaging: &MessagingSettings) -> Self {
        Self {
            max_iterations: agent.max_iterations,
            top_k: agent.top_k,
            default_channel: messaging.default_channel.clone(),
            post_terminates: agent.post_terminates,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    FinalAnswer,
    Posted { channel: String, delivered: bool },
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    /// Final answer, or the post result when the run ended on a post
    pub answer: String,
    pub termination: Termination,
    pub iterations: usize,
    pub searches: usize,
}

/// Answers one query at a time by letting a chat model drive the tools.
pub struct QueryAgent {
    chat: Arc<dyn ChatModel>,
    retriever: Arc<dyn Retriever>,
    messenger: Arc<dyn Messenger>,
    config: AgentConfig,
}

impl QueryAgent {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        retriever: Arc<dyn Retriever>,
        messenger: Arc<dyn Messenger>,
        config: AgentConfig,
    ) -> Self {
        Self {
            chat,
            retriever,
            messenger,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the loop for `query` until a terminal decision or the iteration budget.
    pub async fn run(&self, query: &str) -> Result<AgentOutcome, AgentError> {
        let mut state = AgentState::new(query);

        match self.drive(&mut state).await {
            Ok(outcome) => {
                info!(
                    iterations = outcome.iterations,
                    searches = outcome.searches,
                    termination = ?outcome.termination,
                    "Query complete"
                );
                Ok(outcome)
            }
            Err(e) => {
                state.transition(LoopState::Failed);
                warn!(iteration = state.iteration(), error = %e, "Query failed");
                Err(e)
            }
        }
    }

    async fn drive(&self, state: &mut AgentState) -> Result<AgentOutcome, AgentError> {
        while state.iteration() < self.config.max_iterations {
            state.begin_iteration();

            let prompt = build_prompt(
                state.context(),
                state.search_completed(),
                &self.config.default_channel,
            );
            let reply = self.chat.complete(&prompt).await?;
            let decision = parse_decision(&reply)?;

            debug!(
                iteration = state.iteration(),
                model = self.chat.name(),
                thoughts = %decision.thoughts,
                action = ?decision.action,
                "Agent decision"
            );

            match decision.action {
                Action::Search { query } => {
                    state.transition(LoopState::Searching);
                    let results = self.retriever.retrieve(&query, self.config.top_k).await?;
                    state.record_search(&results);
                }
                Action::Post { message, channel } => {
                    state.transition(LoopState::Posting);
                    let channel = channel.unwrap_or_else(|| self.config.default_channel.clone());
                    let (result, delivered) = self.post(&channel, &message).await;

                    if self.config.post_terminates {
                        return Ok(AgentOutcome {
                            answer: result,
                            termination: Termination::Posted { channel, delivered },
                            iterations: state.iteration(),
                            searches: state.searches(),
                        });
                    }
                    state.record_post(&result);
                }
                Action::FinalAnswer(answer) => {
                    state.transition(LoopState::Finalized);
                    return Ok(AgentOutcome {
                        answer,
                        termination: Termination::FinalAnswer,
                        iterations: state.iteration(),
                        searches: state.searches(),
                    });
                }
            }
        }

        Err(AgentError::IterationBudgetExceeded(self.config.max_iterations))
    }

    /// Post and describe the result; failures become text for the model or caller.
    async fn post(&self, channel: &str, message: &str) -> (String, bool) {
        match self.messenger.post(channel, message).await {
            Ok(_) => (format!("Message posted to {channel}"), true),
            Err(e) => {
                warn!(channel, error = %e, "Post failed");
                (format!("Failed to post message: {e}"), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRetriever, RecordingMessenger, ScriptedChatModel};
    use docquery_types::ProviderError;

    struct Harness {
        chat: Arc<ScriptedChatModel>,
        retriever: Arc<MockRetriever>,
        messenger: Arc<RecordingMessenger>,
    }

    impl Harness {
        fn new(chat: ScriptedChatModel) -> Self {
            Self::with_messenger(chat, RecordingMessenger::new())
        }

        fn with_messenger(chat: ScriptedChatModel, messenger: RecordingMessenger) -> Self {
            Self {
                chat: Arc::new(chat),
                retriever: Arc::new(MockRetriever::new([
                    "Refunds are issued within 30 days.",
                    "Shipping takes five business days.",
                ])),
                messenger: Arc::new(messenger),
            }
        }

        fn agent(&self, config: AgentConfig) -> QueryAgent {
            QueryAgent::new(
                self.chat.clone(),
                self.retriever.clone(),
                self.messenger.clone(),
                config,
            )
        }
    }

    #[tokio::test]
    async fn test_search_then_final_answer() {
        let harness = Harness::new(ScriptedChatModel::new([
            ScriptedChatModel::search("refund window"),
            ScriptedChatModel::final_answer("30 days"),
        ]));

        let outcome = harness
            .agent(AgentConfig::default())
            .run("How long do refunds take?")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "30 days");
        assert_eq!(outcome.termination, Termination::FinalAnswer);
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.searches, 1);
        assert_eq!(harness.retriever.queries(), vec!["refund window"]);
        assert_eq!(harness.messenger.post_count(), 0);

        let prompts = harness.chat.prompts();
        assert!(prompts[0].contains("**Search Completed:** False"));
        assert!(prompts[1].contains("**Search Completed:** True"));
        assert!(prompts[1].contains("Refunds are issued within 30 days."));
    }

    #[tokio::test]
    async fn test_iteration_budget_exceeded() {
        let harness = Harness::new(ScriptedChatModel::repeating(ScriptedChatModel::search(
            "again",
        )));

        let result = harness.agent(AgentConfig::default()).run("loop forever").await;

        assert!(matches!(result, Err(AgentError::IterationBudgetExceeded(10))));
        assert_eq!(harness.chat.call_count(), 10);
        assert_eq!(harness.retriever.search_count(), 10);
        assert_eq!(harness.messenger.post_count(), 0);
    }

    #[tokio::test]
    async fn test_post_is_terminal() {
        let harness = Harness::new(ScriptedChatModel::new([
            ScriptedChatModel::post("hello"),
            ScriptedChatModel::final_answer("never reached"),
        ]));

        let outcome = harness
            .agent(AgentConfig::default())
            .run("Say hello in Slack")
            .await
            .unwrap();

        assert_eq!(
            harness.messenger.posts(),
            vec![("#testchannel".to_string(), "hello".to_string())]
        );
        assert_eq!(outcome.answer, "Message posted to #testchannel");
        assert_eq!(
            outcome.termination,
            Termination::Posted {
                channel: "#testchannel".to_string(),
                delivered: true
            }
        );
        assert_eq!(harness.chat.call_count(), 1);
    }

    #[tokio::test]
    async fn test_post_failure_becomes_answer() {
        let harness = Harness::with_messenger(
            ScriptedChatModel::new([ScriptedChatModel::post_to("hello", "#ops")]),
            RecordingMessenger::failing(ProviderError::MissingCredential(
                "SLACK_BOT_TOKEN".to_string(),
            )),
        );

        let outcome = harness
            .agent(AgentConfig::default())
            .run("post it")
            .await
            .unwrap();

        assert!(outcome.answer.starts_with("Failed to post message:"));
        assert_eq!(
            outcome.termination,
            Termination::Posted {
                channel: "#ops".to_string(),
                delivered: false
            }
        );
    }

    #[tokio::test]
    async fn test_post_continues_when_not_terminal() {
        let harness = Harness::new(ScriptedChatModel::new([
            ScriptedChatModel::post("summary"),
            ScriptedChatModel::final_answer("posted and done"),
        ]));
        let config = AgentConfig {
            post_terminates: false,
            ..AgentConfig::default()
        };

        let outcome = harness.agent(config).run("post a summary").await.unwrap();

        assert_eq!(outcome.answer, "posted and done");
        assert_eq!(outcome.iterations, 2);
        assert_eq!(harness.messenger.post_count(), 1);
        assert!(harness.chat.prompts()[1].contains("Post result: Message posted to #testchannel"));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let harness = Harness::new(ScriptedChatModel::new(["I think the answer is 42"]));
        let result = harness.agent(AgentConfig::default()).run("q").await;
        assert!(matches!(result, Err(AgentError::MalformedResponse(_))));
        assert_eq!(harness.chat.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_action() {
        let harness = Harness::new(ScriptedChatModel::new([
            r#"{"thoughts": "", "action": "Email", "action_input": "x"}"#,
        ]));
        let result = harness.agent(AgentConfig::default()).run("q").await;
        assert!(matches!(result, Err(AgentError::InvalidAction(_))));
        assert_eq!(harness.messenger.post_count(), 0);
    }

    #[tokio::test]
    async fn test_chat_failure_propagates() {
        let harness = Harness::new(ScriptedChatModel::new(Vec::<String>::new()));
        let result = harness.agent(AgentConfig::default()).run("q").await;
        assert!(matches!(result, Err(AgentError::Provider(_))));
    }

    #[tokio::test]
    async fn test_top_k_passed_to_retriever() {
        let harness = Harness::new(ScriptedChatModel::new([
            ScriptedChatModel::search("anything"),
            ScriptedChatModel::final_answer("ok"),
        ]));
        let config = AgentConfig {
            top_k: 1,
            ..AgentConfig::default()
        };

        harness.agent(config).run("q").await.unwrap();

        let prompts = harness.chat.prompts();
        assert!(prompts[1].contains("[1] Refunds are issued"));
        assert!(!prompts[1].contains("[2]"));
    }
}
