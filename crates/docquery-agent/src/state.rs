//! Per-query agent state.

use crate::retriever::RetrievedChunk;

/// Control loop position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingDecision,
    Searching,
    Posting,
    Finalized,
    Failed,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Finalized | LoopState::Failed)
    }
}

/// Mutable state owned by a single query run.
#[derive(Debug, Clone)]
pub struct AgentState {
    context: String,
    search_completed: bool,
    iteration: usize,
    searches: usize,
    loop_state: LoopState,
}

impl AgentState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            context: query.into(),
            search_completed: false,
            iteration: 0,
            searches: 0,
            loop_state: LoopState::AwaitingDecision,
        }
    }

    /// Query text plus everything appended so far.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn search_completed(&self) -> bool {
        self.search_completed
    }

    /// Iterations started so far (1-based once the loop is running).
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn searches(&self) -> usize {
        self.searches
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Start the next iteration and wait for a decision.
    pub fn begin_iteration(&mut self) {
        self.iteration += 1;
        self.loop_state = LoopState::AwaitingDecision;
    }

    pub fn transition(&mut self, next: LoopState) {
        self.loop_state = next;
    }

    /// Append search results to the context and mark search as done.
    pub fn record_search(&mut self, results: &[RetrievedChunk]) {
        self.context.push_str("\n\nSearch results:");
        if results.is_empty() {
            self.context.push_str(" none");
        }
        for (rank, chunk) in results.iter().enumerate() {
            self.context
                .push_str(&format!("\n[{}] {}", rank + 1, chunk.content));
        }
        self.search_completed = true;
        self.searches += 1;
    }

    /// Append the outcome of a non-terminal post.
    pub fn record_post(&mut self, result: &str) {
        self.context.push_str("\n\nPost result: ");
        self.context.push_str(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(position: usize, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            position,
            distance: 0.0,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_initial_state() {
        let state = AgentState::new("question");
        assert_eq!(state.context(), "question");
        assert!(!state.search_completed());
        assert_eq!(state.iteration(), 0);
        assert_eq!(state.loop_state(), LoopState::AwaitingDecision);
    }

    #[test]
    fn test_record_search_appends_in_rank_order() {
        let mut state = AgentState::new("question");
        state.record_search(&[chunk(4, "first hit"), chunk(1, "second hit")]);

        assert_eq!(
            state.context(),
            "question\n\nSearch results:\n[1] first hit\n[2] second hit"
        );
        assert!(state.search_completed());
        assert_eq!(state.searches(), 1);
    }

    #[test]
    fn test_terminal_states() {
        assert!(LoopState::Finalized.is_terminal());
        assert!(LoopState::Failed.is_terminal());
        assert!(!LoopState::Searching.is_terminal());
        assert!(!LoopState::Posting.is_terminal());
    }
}
