use ratatui::text::Line;

use crate::api::{FileDescriptor, SearchDocument, SubQuestionDetail, ToolCallMetadata};

/// Message body as handed to the answer view. `Rendered` content was
/// produced elsewhere and is displayed as is.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayContent {
    Text(String),
    Rendered(Vec<Line<'static>>),
}

impl DisplayContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DisplayContent::Text(text) => Some(text),
            DisplayContent::Rendered(_) => None,
        }
    }
}

impl Default for DisplayContent {
    fn default() -> Self {
        DisplayContent::Text(String::new())
    }
}

impl From<String> for DisplayContent {
    fn from(text: String) -> Self {
        DisplayContent::Text(text)
    }
}

impl From<&str> for DisplayContent {
    fn from(text: &str) -> Self {
        DisplayContent::Text(text.to_string())
    }
}

/// Everything the backend reports about one assistant message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantMessage {
    pub message_id: Option<i64>,
    pub content: DisplayContent,
    pub is_complete: bool,
    pub is_generating: bool,
    pub files: Vec<FileDescriptor>,
    pub documents: Vec<SearchDocument>,
    /// Documents gathered by agentic sub-question searches. Used for
    /// citations when the main search returned nothing.
    pub agentic_documents: Vec<SearchDocument>,
    pub sub_questions: Vec<SubQuestionDetail>,
    pub second_level_sub_questions: Vec<SubQuestionDetail>,
    /// `(citation key, document)` pairs the answer actually cites.
    pub cited_documents: Vec<(String, SearchDocument)>,
    pub tool_call: Option<ToolCallMetadata>,
    pub query: Option<String>,
    pub error: Option<String>,
    /// Ids of all regenerations of this turn, including this one.
    pub sibling_message_ids: Vec<i64>,
    pub overridden_model: Option<String>,
}

impl AssistantMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: DisplayContent::Text(content.into()),
            ..Self::default()
        }
    }

    pub fn complete(mut self) -> Self {
        self.is_complete = true;
        self
    }
}

/// Which actions the host can perform for this message. Controls whose
/// action is unavailable are not shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageAffordances {
    pub feedback: bool,
    pub regenerate: bool,
    pub continue_generating: bool,
    pub resubmit: bool,
    pub message_selection: bool,
}

/// User intents raised by the answer view for the host to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerAction {
    Like,
    Dislike,
    CopyAll(String),
    Regenerate { model_override: Option<String> },
    ContinueGenerating,
    Resubmit,
    SelectMessage(i64),
}
