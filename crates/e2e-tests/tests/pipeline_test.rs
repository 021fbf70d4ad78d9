//! End-to-end pipeline tests for docquery.
//!
//! Document file -> staging -> extraction -> chunking -> embedding -> index
//! -> agent loop -> answer or post.

use pretty_assertions::assert_eq;

use docquery_agent::{AgentError, ScriptedChatModel, Termination};
use docquery_session::SessionError;
use e2e_tests::{TestHarness, HANDBOOK};

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Full pipeline: load a staged document, search it, answer from the results.
#[tokio::test]
async fn test_full_pipeline_search_then_answer() {
    let harness = TestHarness::new([
        ScriptedChatModel::search("how many unused vacation days roll over"),
        ScriptedChatModel::final_answer("Up to five days roll over."),
    ]);
    let path = harness.staged_document("handbook.txt", HANDBOOK);

    let mut session = harness.session(150);
    let loaded = session.load_document(&path).await.unwrap();
    assert!(!loaded.reused);
    assert!(loaded.index.len() > 1);

    let outcome = session
        .query("How many vacation days can I carry over?")
        .await
        .unwrap();

    assert_eq!(outcome.answer, "Up to five days roll over.");
    assert_eq!(outcome.termination, Termination::FinalAnswer);
    assert_eq!(outcome.searches, 1);
    assert_eq!(outcome.iterations, 2);

    // Best match is ranked first in the context handed back to the model
    let prompts = harness.chat.prompts();
    let results = prompts[1]
        .split("Search results:")
        .nth(1)
        .expect("search results in second prompt");
    let first_hit = results.split("\n[2] ").next().unwrap();
    assert!(first_hit.trim_start().starts_with("[1] "));
    assert!(first_hit.contains("roll over"), "first hit: {first_hit}");
    assert_eq!(harness.messenger.post_count(), 0);
}

/// Search followed by a post ends the run with the delivery result.
#[tokio::test]
async fn test_search_then_post() {
    let harness = TestHarness::new([
        ScriptedChatModel::search("lost laptop"),
        ScriptedChatModel::post_to("Report lost laptops within one hour.", "#security"),
        ScriptedChatModel::final_answer("never reached"),
    ]);
    let mut session = harness.session(150);
    session.build_index(HANDBOOK).await.unwrap();

    let outcome = session
        .query("Tell #security what to do about lost laptops")
        .await
        .unwrap();

    assert_eq!(
        harness.messenger.posts(),
        vec![(
            "#security".to_string(),
            "Report lost laptops within one hour.".to_string()
        )]
    );
    assert_eq!(outcome.answer, "Message posted to #security");
    assert_eq!(
        outcome.termination,
        Termination::Posted {
            channel: "#security".to_string(),
            delivered: true
        }
    );
    assert_eq!(harness.chat.call_count(), 2);
}

/// Chunks cover the whole document, in order, and respect the size bound.
#[tokio::test]
async fn test_chunks_cover_document() {
    let harness = TestHarness::new(Vec::<String>::new());
    let mut session = harness.session(120);
    let document = session.build_index(HANDBOOK).await.unwrap();

    let chunks = document.chunks();
    let joined: String = chunks.iter().map(|c| c.content()).collect();
    assert_eq!(strip_whitespace(&joined), strip_whitespace(HANDBOOK));

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index(), i);
        assert_eq!(HANDBOOK[chunk.span()].trim(), chunk.content());
        assert!(chunk.char_len() <= 120);
    }
    for pair in chunks.windows(2) {
        assert!(pair[0].span().end < pair[1].span().start);
    }
}

/// Loading the same document twice reuses the index; batches run in order.
#[tokio::test]
async fn test_batch_queries_reuse_index() {
    let harness = TestHarness::new([
        ScriptedChatModel::final_answer("fifteen"),
        ScriptedChatModel::final_answer("thirty days"),
    ]);
    let path = harness.staged_document("handbook.txt", HANDBOOK);
    let mut session = harness.session(150);

    session.load_document(&path).await.unwrap();
    let again = session.load_document(&path).await.unwrap();
    assert!(again.reused);
    assert_eq!(harness.embedder.call_count(), 1);

    let answers = session
        .query_batch("How many vacation days?; ; When are expenses due?")
        .await
        .unwrap();

    let summary: Vec<(&str, &str)> = answers
        .iter()
        .map(|a| (a.query.as_str(), a.outcome.as_ref().unwrap().answer.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("How many vacation days?", "fifteen"),
            ("When are expenses due?", "thirty days"),
        ]
    );
}

/// A model that never stops searching exhausts the iteration budget.
#[tokio::test]
async fn test_iteration_budget_exhausted() {
    let harness = TestHarness::with_chat(ScriptedChatModel::repeating(
        ScriptedChatModel::search("vacation"),
    ));
    let mut session = harness.session(150);
    session.build_index(HANDBOOK).await.unwrap();

    let result = session.query("loop").await;

    assert!(matches!(
        result,
        Err(SessionError::Agent(AgentError::IterationBudgetExceeded(10)))
    ));
    assert_eq!(harness.chat.call_count(), 10);
    assert_eq!(harness.messenger.post_count(), 0);
    // One build batch plus one query embedding per search
    assert_eq!(harness.embedder.call_count(), 11);
}
