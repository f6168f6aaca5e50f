//! View model for one assistant answer.
//!
//! Combines the backend's message data with the normalizer and the revealer
//! to decide what is on screen at any moment. Rendering lives in
//! [`crate::ui::answer`].

use crate::core::citation::CitationLookup;
use crate::core::message::{AnswerAction, AssistantMessage, DisplayContent, MessageAffordances};
use crate::core::normalize::display_text;
use crate::core::reveal::{RevealPhase, Revealer};
use crate::core::thinking::{self, ThinkingSummary};
use crate::api::SearchDocument;

/// Appended to the visible markdown while the backend is still writing.
/// Renders as an empty link labelled `*`.
pub const STREAMING_CURSOR: &str = " [*]() ";

/// Tool name for which "continue generating" stays available.
pub const SEARCH_TOOL_NAME: &str = "run_search";

/// Content shorter than this is not worth showing as an answer yet.
const MIN_ANSWER_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    pub can_retry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSwitcher {
    /// 1-based.
    pub current: usize,
    pub total: usize,
    pub previous: Option<i64>,
    pub next: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AnswerView {
    message: AssistantMessage,
    affordances: MessageAffordances,
    final_content: String,
    revealer: Revealer,
    allow_documents: bool,
    thinking: Option<ThinkingSummary>,
}

impl AnswerView {
    pub fn new(message: AssistantMessage, affordances: MessageAffordances, reveal_step: usize) -> Self {
        let final_content = final_content_of(&message);
        let revealer = if message.is_complete {
            Revealer::settled(final_content.clone(), reveal_step)
        } else {
            Revealer::new(final_content.clone(), reveal_step)
        };

        let mut view = Self {
            allow_documents: message.is_complete,
            thinking: None,
            message,
            affordances,
            final_content,
            revealer,
        };
        view.refresh_thinking();
        view
    }

    /// Feeds a newer snapshot of the message. A different message id starts
    /// over; otherwise the revealer keeps its prefix and chases the new
    /// content.
    pub fn update(&mut self, message: AssistantMessage) {
        if message.message_id != self.message.message_id {
            *self = Self::new(message, self.affordances, self.revealer.step());
            return;
        }

        self.final_content = final_content_of(&message);
        self.message = message;
        self.revealer.set_target(self.final_content.clone());
        self.refresh_thinking();
    }

    fn refresh_thinking(&mut self) {
        let raw = self.message.content.as_text().unwrap_or_default();
        self.thinking = thinking::extract(raw);
        if thinking::has_thinking(raw) {
            self.revealer.activate();
        }
    }

    pub fn message(&self) -> &AssistantMessage {
        &self.message
    }

    pub fn affordances(&self) -> MessageAffordances {
        self.affordances
    }

    pub fn allow_streaming(&mut self) {
        self.revealer.activate();
    }

    pub fn streaming_allowed(&self) -> bool {
        self.revealer.phase() != RevealPhase::Idle
    }

    pub fn allow_documents(&mut self) {
        self.allow_documents = true;
    }

    /// Documents listed next to the answer. Empty until documents are
    /// allowed.
    pub fn visible_documents(&self) -> &[SearchDocument] {
        if self.allow_documents {
            &self.message.documents
        } else {
            &[]
        }
    }

    pub fn tick(&mut self) -> Option<usize> {
        self.revealer.tick()
    }

    pub fn advance_to(&mut self, visible: usize) {
        self.revealer.advance_to(visible);
    }

    pub fn revealer(&self) -> &Revealer {
        &self.revealer
    }

    pub fn final_content(&self) -> &str {
        &self.final_content
    }

    pub fn streamed_content(&self) -> &str {
        self.revealer.visible_text()
    }

    /// Markdown for the current frame, with the cursor placeholder while the
    /// message is incomplete.
    pub fn visible_markdown(&self) -> String {
        let mut markdown = self.streamed_content().to_string();
        if !self.message.is_complete {
            markdown.push_str(STREAMING_CURSOR);
        }
        markdown
    }

    /// Pre-rendered content, shown instead of markdown.
    pub fn rendered_content(&self) -> Option<&DisplayContent> {
        match &self.message.content {
            DisplayContent::Rendered(_) => Some(&self.message.content),
            DisplayContent::Text(_) => None,
        }
    }

    pub fn show_answer_section(&self) -> bool {
        let has_content = match self.message.content {
            DisplayContent::Text(_) => self.final_content.chars().count() > MIN_ANSWER_CHARS,
            DisplayContent::Rendered(_) => true,
        };
        (self.streaming_allowed() && has_content) || !self.message.files.is_empty()
    }

    pub fn finished_generating(&self) -> bool {
        self.revealer.is_fully_visible() && !self.message.is_generating
    }

    pub fn thinking(&self) -> Option<&ThinkingSummary> {
        self.thinking.as_ref()
    }

    /// Thinking is still streaming until both the block and the message are
    /// complete.
    pub fn thinking_streaming(&self) -> bool {
        self.thinking
            .as_ref()
            .is_some_and(|t| !t.complete || !self.message.is_complete)
    }

    pub fn citation_lookup(&self) -> CitationLookup {
        let documents = if self.message.documents.is_empty() {
            self.message.agentic_documents.clone()
        } else {
            self.message.documents.clone()
        };
        let sub_questions = self
            .message
            .sub_questions
            .iter()
            .chain(&self.message.second_level_sub_questions)
            .cloned()
            .collect();
        CitationLookup::new(documents, sub_questions)
    }

    pub fn cited_document_ids(&self) -> Vec<&str> {
        self.message
            .cited_documents
            .iter()
            .map(|(_, document)| document.document_id.as_str())
            .collect()
    }

    pub fn error_banner(&self) -> Option<ErrorBanner> {
        self.message.error.as_ref().map(|message| ErrorBanner {
            message: message.clone(),
            can_retry: self.affordances.resubmit,
        })
    }

    pub fn message_switcher(&self) -> Option<MessageSwitcher> {
        let siblings = &self.message.sibling_message_ids;
        if !self.affordances.message_selection || siblings.len() < 2 {
            return None;
        }
        let id = self.message.message_id?;
        let index = siblings.iter().position(|&sibling| sibling == id)?;

        Some(MessageSwitcher {
            current: index + 1,
            total: siblings.len(),
            previous: index.checked_sub(1).map(|i| siblings[i]),
            next: siblings.get(index + 1).copied(),
        })
    }

    pub fn show_continue_generating(&self) -> bool {
        let tool_allows = self
            .message
            .tool_call
            .as_ref()
            .is_none_or(|call| call.tool_name == SEARCH_TOOL_NAME);
        let no_query = self.message.query.as_deref().is_none_or(str::is_empty);
        self.affordances.continue_generating && tool_allows && no_query
    }

    pub fn copy_text(&self) -> &str {
        &self.final_content
    }

    /// The feedback bar, in display order. Empty when feedback is not
    /// available.
    pub fn controls(&self) -> Vec<AnswerAction> {
        if !self.affordances.feedback {
            return Vec::new();
        }
        let mut controls = vec![
            AnswerAction::CopyAll(self.final_content.clone()),
            AnswerAction::Like,
            AnswerAction::Dislike,
        ];
        if self.affordances.regenerate {
            controls.push(AnswerAction::Regenerate {
                model_override: self.message.overridden_model.clone(),
            });
        }
        controls
    }
}

fn final_content_of(message: &AssistantMessage) -> String {
    match &message.content {
        DisplayContent::Text(raw) => display_text(raw, message.is_complete),
        DisplayContent::Rendered(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FileDescriptor, ToolCallMetadata};

    fn incomplete(text: &str) -> AssistantMessage {
        AssistantMessage {
            message_id: Some(1),
            is_generating: true,
            ..AssistantMessage::text(text)
        }
    }

    fn affordances() -> MessageAffordances {
        MessageAffordances {
            feedback: true,
            regenerate: true,
            continue_generating: true,
            resubmit: true,
            message_selection: true,
        }
    }

    #[test]
    fn complete_message_is_fully_visible_at_once() {
        let view = AnswerView::new(
            AssistantMessage::text("The answer cites [D1].").complete(),
            affordances(),
            5,
        );
        assert!(view.streaming_allowed());
        assert_eq!(view.streamed_content(), "The answer cites [[D1]]().");
        assert_eq!(view.visible_markdown(), "The answer cites [[D1]]().");
        assert!(view.show_answer_section());
    }

    #[test]
    fn incomplete_message_waits_for_activation() {
        let mut view = AnswerView::new(incomplete("Streaming answer text"), affordances(), 5);
        assert!(!view.streaming_allowed());
        assert!(!view.show_answer_section());
        assert_eq!(view.tick(), None);

        view.allow_streaming();
        assert_eq!(view.tick(), Some(5));
        assert_eq!(view.visible_markdown(), "Strea [*]() ");
        assert!(view.show_answer_section());
    }

    #[test]
    fn short_content_hides_answer_section_unless_files_exist() {
        let mut message = AssistantMessage::text("tiny").complete();
        assert!(!AnswerView::new(message.clone(), affordances(), 5).show_answer_section());

        message.files.push(FileDescriptor {
            id: "f1".into(),
            file_type: "image".into(),
            name: None,
        });
        assert!(AnswerView::new(message, affordances(), 5).show_answer_section());
    }

    #[test]
    fn thinking_tokens_enable_streaming() {
        let view = AnswerView::new(
            incomplete("<think>planning</think>The real answer"),
            affordances(),
            5,
        );
        assert!(view.streaming_allowed());
        assert_eq!(view.thinking().map(|t| t.content.as_str()), Some("planning"));
        assert!(view.thinking_streaming());
        assert_eq!(view.final_content(), "The real answer");
    }

    #[test]
    fn update_keeps_prefix_and_new_id_starts_over() {
        let mut view = AnswerView::new(incomplete("First part of it"), affordances(), 5);
        view.allow_streaming();
        view.tick();
        view.tick();

        view.update(incomplete("First part of it, and more"));
        assert_eq!(view.streamed_content(), "First part");

        let mut other = incomplete("Another message");
        other.message_id = Some(2);
        view.update(other);
        assert_eq!(view.streamed_content(), "");
        assert!(!view.streaming_allowed());
    }

    #[test]
    fn finished_generating_requires_full_reveal_and_idle_backend() {
        let mut message = incomplete("Twelve chars");
        let mut view = AnswerView::new(message.clone(), affordances(), 100);
        view.allow_streaming();
        view.tick();
        assert!(!view.finished_generating());

        message.is_generating = false;
        view.update(message);
        assert!(view.finished_generating());
    }

    #[test]
    fn message_switcher_pages_between_siblings() {
        let mut message = AssistantMessage::text("done").complete();
        message.message_id = Some(20);
        message.sibling_message_ids = vec![10, 20, 30];
        let view = AnswerView::new(message.clone(), affordances(), 5);
        assert_eq!(
            view.message_switcher(),
            Some(MessageSwitcher {
                current: 2,
                total: 3,
                previous: Some(10),
                next: Some(30),
            })
        );

        message.message_id = Some(10);
        let first = AnswerView::new(message, affordances(), 5).message_switcher().unwrap();
        assert_eq!(first.previous, None);
        assert_eq!(first.next, Some(20));
    }

    #[test]
    fn continue_generating_rules() {
        let mut message = AssistantMessage::text("partial").complete();
        assert!(AnswerView::new(message.clone(), affordances(), 5).show_continue_generating());

        message.tool_call = Some(ToolCallMetadata {
            tool_name: "run_image_generation".into(),
            tool_args: serde_json::Value::Null,
        });
        assert!(!AnswerView::new(message.clone(), affordances(), 5).show_continue_generating());

        message.tool_call = Some(ToolCallMetadata {
            tool_name: SEARCH_TOOL_NAME.into(),
            tool_args: serde_json::Value::Null,
        });
        message.query = Some("rust lifetimes".into());
        assert!(!AnswerView::new(message, affordances(), 5).show_continue_generating());
    }

    #[test]
    fn citation_lookup_falls_back_to_agentic_documents() {
        let mut message = AssistantMessage::text("x").complete();
        message.agentic_documents.push(SearchDocument {
            document_id: "agentic".into(),
            semantic_identifier: "Agentic doc".into(),
            link: None,
            blurb: None,
        });
        let lookup = AnswerView::new(message, affordances(), 5).citation_lookup();
        assert_eq!(lookup.documents[0].document_id, "agentic");
    }

    #[test]
    fn error_banner_and_controls_follow_affordances() {
        let mut message = AssistantMessage::text("answer").complete();
        message.error = Some("Model overloaded".into());
        let view = AnswerView::new(message.clone(), MessageAffordances::default(), 5);
        assert_eq!(
            view.error_banner(),
            Some(ErrorBanner {
                message: "Model overloaded".into(),
                can_retry: false,
            })
        );
        assert!(view.controls().is_empty());

        let view = AnswerView::new(message, affordances(), 5);
        assert_eq!(view.controls().len(), 4);
    }
}
