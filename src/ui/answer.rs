//! Terminal rendering of an [`AnswerView`].

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::core::answer::AnswerView;
use crate::core::message::{AnswerAction, DisplayContent};
use crate::ui::markdown::{render_markdown, render_plain, SourceNote, TerminalHandlers};
use crate::ui::theme::Theme;

const THINKING_PREFIX: &str = "│ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub markdown: bool,
    pub syntax: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            markdown: true,
            syntax: true,
        }
    }
}

pub fn action_label(action: &AnswerAction) -> &'static str {
    match action {
        AnswerAction::Like => "Like",
        AnswerAction::Dislike => "Dislike",
        AnswerAction::CopyAll(_) => "Copy",
        AnswerAction::Regenerate { .. } => "Regenerate",
        AnswerAction::ContinueGenerating => "Continue Generating",
        AnswerAction::Resubmit => "Retry",
        AnswerAction::SelectMessage(_) => "Select",
    }
}

/// Lines for one frame of the answer, top to bottom: reasoning, answer body,
/// error banner, cited sources, sibling switcher and the feedback bar.
pub fn render_answer(view: &AnswerView, theme: &Theme, options: RenderOptions) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(thinking) = view.thinking() {
        let title = if view.thinking_streaming() {
            "Thinking..."
        } else {
            "Thought"
        };
        lines.push(Line::from(Span::styled(
            title,
            theme.muted_style.add_modifier(Modifier::BOLD),
        )));
        for text in thinking.content.trim().lines() {
            lines.push(Line::from(vec![
                Span::styled(THINKING_PREFIX, theme.muted_style),
                Span::styled(text.to_string(), theme.muted_style),
            ]));
        }
        lines.push(Line::default());
    }

    let mut sources = Vec::new();
    if view.show_answer_section() {
        lines.push(Line::from(Span::styled("Answer", theme.heading_style)));
        match view.rendered_content() {
            Some(DisplayContent::Rendered(rendered)) => lines.extend(rendered.iter().cloned()),
            _ if options.markdown => {
                let mut handlers =
                    TerminalHandlers::new(theme.clone(), view.citation_lookup(), options.syntax);
                lines.extend(render_markdown(&view.visible_markdown(), theme, &mut handlers));
                sources = handlers.sources().to_vec();
            }
            _ => lines.extend(render_plain(view.streamed_content(), theme)),
        }
    }

    if let Some(banner) = view.error_banner() {
        lines.push(Line::default());
        let mut spans = vec![Span::styled(format!("Error: {}", banner.message), theme.error_style)];
        if banner.can_retry {
            spans.push(Span::styled(
                format!("  [{}]", action_label(&AnswerAction::Resubmit)),
                theme.muted_style,
            ));
        }
        lines.push(Line::from(spans));
    }

    if view.finished_generating() {
        lines.extend(sources_footer(&sources, theme));
        lines.extend(footer_bar(view, theme));
    }

    lines
}

fn sources_footer(sources: &[SourceNote], theme: &Theme) -> Vec<Line<'static>> {
    if sources.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled("Sources", theme.muted_style.add_modifier(Modifier::BOLD))),
    ];
    for source in sources {
        let mut spans = vec![
            Span::styled(format!("[{}] ", source.marker), theme.citation_style),
            Span::styled(source.title.clone(), theme.text_style),
        ];
        if let Some(link) = &source.link {
            spans.push(Span::styled(format!(" <{link}>"), theme.muted_style));
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn footer_bar(view: &AnswerView, theme: &Theme) -> Vec<Line<'static>> {
    let mut spans = Vec::new();

    if let Some(switcher) = view.message_switcher() {
        let arrow = |enabled: bool, glyph: &'static str| {
            let style = if enabled {
                theme.text_style
            } else {
                theme.muted_style
            };
            Span::styled(glyph, style)
        };
        spans.push(arrow(switcher.previous.is_some(), "<"));
        spans.push(Span::styled(
            format!(" {}/{} ", switcher.current, switcher.total),
            theme.text_style,
        ));
        spans.push(arrow(switcher.next.is_some(), ">"));
    }

    let mut controls = view.controls();
    if view.show_continue_generating() {
        controls.push(AnswerAction::ContinueGenerating);
    }
    for action in &controls {
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("[{}]", action_label(action)),
            theme.list_marker_style,
        ));
    }

    if spans.is_empty() {
        Vec::new()
    } else {
        vec![Line::default(), Line::from(spans)]
    }
}
