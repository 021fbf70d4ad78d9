//! Reasoning prompt for one agent iteration.

use crate::tools::Tool;

/// Build the prompt for the next decision.
///
/// `context` is the user's query plus everything appended by earlier
/// iterations. `search_completed` is advisory: the model is told whether a
/// search already ran but may search again.
pub fn build_prompt(context: &str, search_completed: bool, default_channel: &str) -> String {
    let tools: String = Tool::ALL
        .iter()
        .map(|tool| format!("{}: {}", tool.name(), tool.description()))
        .collect::<Vec<_>>()
        .join("\n");

    let search_tool = Tool::Search.name();
    let post_tool = Tool::Post.name();
    let search_completed = if search_completed { "True" } else { "False" };

    format!(
        r#"You are an AI assistant that answers questions about a document and can post results to Slack.
Use the following tools to help you:

{tools}

User Query: {context}

**Search Completed:** {search_completed}

Follow these steps carefully:
1) If `Search Completed` is False, start by using {search_tool} to gather relevant information.
2) If `Search Completed` is True, answer from the search results, or use {post_tool} if the user asked for a message to be posted.
3) When you have the answer, respond with FinalAnswer.

Your response must be a single JSON object:
{{
  "thoughts": "Your step-by-step reasoning",
  "action": "{search_tool}, {post_tool}, or FinalAnswer",
  "action_input": "The query for the tool, the message to post, or the final answer",
  "channel": "Optional channel for {post_tool} (default {default_channel})"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_tools_and_flag() {
        let prompt = build_prompt("What is the refund window?", false, "#testchannel");
        assert!(prompt.contains("SearchTool: Searches and returns relevant text chunks"));
        assert!(prompt.contains("SlackTool: Posts a message"));
        assert!(prompt.contains("User Query: What is the refund window?"));
        assert!(prompt.contains("**Search Completed:** False"));
        assert!(prompt.contains("#testchannel"));
    }

    #[test]
    fn test_prompt_reflects_completed_search() {
        let prompt = build_prompt("q\n\nSearch results:\n[1] text", true, "#c");
        assert!(prompt.contains("**Search Completed:** True"));
        assert!(prompt.contains("[1] text"));
    }
}
