//! The agent's tool set.

/// Tools the model may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Search,
    Post,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Search, Tool::Post];

    /// Name the model uses to select the tool.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Search => "SearchTool",
            Tool::Post => "SlackTool",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::Search => "Searches and returns relevant text chunks for a given query.",
            Tool::Post => "Posts a message to a specified Slack channel.",
        }
    }
}
