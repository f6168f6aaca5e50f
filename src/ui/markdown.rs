//! Markdown to styled terminal lines.
//!
//! [`render_markdown`] walks pulldown-cmark events and keeps the block
//! structure (headings, lists, quotes, tables) itself, but hands links,
//! paragraphs and fenced code to a [`MarkdownHandlers`] implementation. The
//! answer view plugs in [`TerminalHandlers`], which turns citation
//! placeholders into numbered references.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::core::citation::{CitationLookup, CitationMarker, ResolvedCitation};
use crate::ui::highlight::highlight_code_block;
use crate::ui::theme::Theme;

/// Link text of the streaming cursor placeholder.
const CURSOR_LABEL: &str = "*";
const CURSOR_GLYPH: &str = "▍";
const QUOTE_PREFIX: &str = "│ ";
const RULE_WIDTH: usize = 40;

/// Overrides for the nodes whose presentation depends on the host.
pub trait MarkdownHandlers {
    /// Spans for a link whose visible text is `text`. `dest` may be empty.
    fn link(&mut self, dest: &str, text: &str, style: Style) -> Vec<Span<'static>>;

    /// Final lines of a paragraph. The default keeps them as they are.
    fn paragraph(&mut self, lines: Vec<Line<'static>>) -> Vec<Line<'static>> {
        lines
    }

    fn code_block(&mut self, language: &str, code: &str) -> Vec<Line<'static>>;
}

pub fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);
    options.insert(Options::ENABLE_GFM);
    options
}

pub fn render_markdown(
    markdown: &str,
    theme: &Theme,
    handlers: &mut dyn MarkdownHandlers,
) -> Vec<Line<'static>> {
    MarkdownRenderer::new(theme, handlers).render(markdown)
}

/// Unstyled rendering for when markdown is turned off.
pub fn render_plain(text: &str, theme: &Theme) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::from(Span::styled(line.to_string(), theme.text_style)))
        .collect()
}

#[derive(Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

struct PendingLink {
    dest: String,
    text: String,
    style: Style,
}

#[derive(Default)]
struct TableBuffer {
    rows: Vec<Vec<String>>,
    header_rows: usize,
    current_row: Vec<String>,
    current_cell: String,
}

impl TableBuffer {
    fn finish_row(&mut self) {
        let row = std::mem::take(&mut self.current_row);
        self.rows.push(row);
    }

    fn render(self, theme: &Theme) -> Vec<Line<'static>> {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        for (index, row) in self.rows.iter().enumerate() {
            let is_header = index < self.header_rows;
            let style = if is_header {
                theme.text_style.add_modifier(Modifier::BOLD)
            } else {
                theme.text_style
            };
            let mut spans = vec![Span::styled("│", theme.muted_style)];
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let padding = width.saturating_sub(cell.width());
                spans.push(Span::styled(
                    format!(" {cell}{} ", " ".repeat(padding)),
                    style,
                ));
                spans.push(Span::styled("│", theme.muted_style));
            }
            lines.push(Line::from(spans));

            if is_header && index + 1 == self.header_rows {
                let rule = widths
                    .iter()
                    .map(|w| "─".repeat(w + 2))
                    .collect::<Vec<_>>()
                    .join("┼");
                lines.push(Line::from(Span::styled(
                    format!("├{rule}┤"),
                    theme.muted_style,
                )));
            }
        }
        lines
    }
}

struct MarkdownRenderer<'a> {
    theme: &'a Theme,
    handlers: &'a mut dyn MarkdownHandlers,
    lines: Vec<Line<'static>>,
    paragraph: Option<Vec<Line<'static>>>,
    current_spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    /// Width of the text column of each open list item.
    item_indents: Vec<usize>,
    quote_depth: usize,
    code_block: Option<(String, String)>,
    link: Option<PendingLink>,
    table: Option<TableBuffer>,
}

impl<'a> MarkdownRenderer<'a> {
    fn new(theme: &'a Theme, handlers: &'a mut dyn MarkdownHandlers) -> Self {
        Self {
            theme,
            handlers,
            lines: Vec::new(),
            paragraph: None,
            current_spans: Vec::new(),
            style_stack: vec![theme.text_style],
            list_stack: Vec::new(),
            item_indents: Vec::new(),
            quote_depth: 0,
            code_block: None,
            link: None,
            table: None,
        }
    }

    fn render(mut self, markdown: &str) -> Vec<Line<'static>> {
        for event in Parser::new_ext(markdown, markdown_options()) {
            match event {
                Event::Start(tag) => self.start(tag),
                Event::End(tag) => self.end(tag),
                Event::Text(text) => self.text(&text),
                Event::Code(code) => {
                    let style = self.theme.inline_code_style;
                    self.inline(code.to_string(), style);
                }
                Event::InlineMath(math) => {
                    let style = self.theme.inline_code_style;
                    self.inline(math.to_string(), style);
                }
                Event::DisplayMath(math) => {
                    self.flush_line();
                    let style = self.theme.inline_code_style;
                    for line in math.trim().lines() {
                        self.inline(format!("  {line}"), style);
                        self.flush_line();
                    }
                }
                Event::SoftBreak => self.text(" "),
                Event::HardBreak => self.flush_line(),
                Event::Rule => {
                    self.flush_line();
                    self.push_line(Line::from(Span::styled(
                        "─".repeat(RULE_WIDTH),
                        self.theme.muted_style,
                    )));
                    self.push_blank();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    let style = self.theme.list_marker_style;
                    self.inline(marker.to_string(), style);
                }
                Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
                Event::FootnoteReference(label) => self.text(&format!("[^{label}]")),
            }
        }

        self.flush_line();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }

    fn current_style(&self) -> Style {
        self.style_stack
            .last()
            .copied()
            .unwrap_or(self.theme.text_style)
    }

    fn push_style(&mut self, modify: impl FnOnce(Style) -> Style) {
        let style = modify(self.current_style());
        self.style_stack.push(style);
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.table.is_none() {
                    self.paragraph = Some(Vec::new());
                }
            }
            Tag::Heading { level, .. } => {
                self.flush_line();
                let marker = heading_marker(level);
                let style = self.theme.heading_style;
                self.style_stack.push(style);
                self.inline(marker.to_string(), style);
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
                let style = self.theme.blockquote_style;
                self.style_stack.push(style);
            }
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush_line();
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let current = *n;
                        *n += 1;
                        format!("{current}. ")
                    }
                    _ => "- ".to_string(),
                };
                let parent = self.item_indents.last().copied().unwrap_or(0);
                self.item_indents.push(parent + marker.width());
                if parent > 0 {
                    self.current_spans.push(Span::raw(" ".repeat(parent)));
                }
                self.current_spans
                    .push(Span::styled(marker, self.theme.list_marker_style));
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_ascii_whitespace().next().unwrap_or("").to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_block = Some((language, String::new()));
            }
            Tag::Emphasis => self.push_style(|s| s.add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(|s| s.add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(|s| s.add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.link = Some(PendingLink {
                    dest: dest_url.to_string(),
                    text: String::new(),
                    style: self.theme.link_style,
                });
            }
            Tag::Table(_) => {
                self.flush_line();
                self.table = Some(TableBuffer::default());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_line();
                if let Some(lines) = self.paragraph.take() {
                    let lines = self.handlers.paragraph(lines);
                    self.lines.extend(lines);
                }
                if self.list_stack.is_empty() {
                    self.push_blank();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.style_stack.pop();
                self.push_blank();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.style_stack.pop();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.push_blank();
                }
            }
            TagEnd::Item => {
                self.flush_line();
                self.item_indents.pop();
            }
            TagEnd::CodeBlock => {
                if let Some((language, code)) = self.code_block.take() {
                    let code = code.strip_suffix('\n').unwrap_or(&code);
                    let rendered = self.handlers.code_block(&language, code);
                    for line in rendered {
                        self.push_line(line);
                    }
                    self.push_blank();
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                if let Some(link) = self.link.take() {
                    let spans = self.handlers.link(&link.dest, &link.text, link.style);
                    for span in spans {
                        self.push_span(span);
                    }
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = std::mem::take(&mut table.current_cell);
                    table.current_row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row();
                    table.header_rows = table.rows.len();
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row();
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    for line in table.render(self.theme) {
                        self.push_line(line);
                    }
                    self.push_blank();
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, code)) = self.code_block.as_mut() {
            code.push_str(text);
            return;
        }
        let style = self.current_style();
        self.inline(text.replace('\t', "    "), style);
    }

    /// Routes inline content to the open link, table cell, or current line.
    fn inline(&mut self, content: String, style: Style) {
        if let Some(link) = self.link.as_mut() {
            link.text.push_str(&content);
        } else if let Some(table) = self.table.as_mut() {
            table.current_cell.push_str(&content);
        } else {
            self.push_span(Span::styled(content, style));
        }
    }

    fn push_span(&mut self, span: Span<'static>) {
        if let Some(table) = self.table.as_mut() {
            table.current_cell.push_str(&span.content);
            return;
        }
        if self.current_spans.is_empty() {
            let indent = self.item_indents.last().copied().unwrap_or(0);
            if indent > 0 {
                self.current_spans.push(Span::raw(" ".repeat(indent)));
            }
        }
        self.current_spans.push(span);
    }

    fn flush_line(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current_spans);
        self.push_line(Line::from(spans));
    }

    fn push_line(&mut self, mut line: Line<'static>) {
        if self.quote_depth > 0 {
            line.spans.insert(
                0,
                Span::styled(QUOTE_PREFIX.repeat(self.quote_depth), self.theme.muted_style),
            );
        }
        match self.paragraph.as_mut() {
            Some(paragraph) => paragraph.push(line),
            None => self.lines.push(line),
        }
    }

    fn push_blank(&mut self) {
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }
}

fn heading_marker(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "# ",
        HeadingLevel::H2 => "## ",
        HeadingLevel::H3 => "### ",
        _ => "#### ",
    }
}

/// A citation rendered in the answer, for the sources footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNote {
    pub marker: CitationMarker,
    pub title: String,
    pub link: Option<String>,
}

/// Handlers for the terminal answer view: citations become `[n]` references,
/// the cursor placeholder becomes a block glyph, and fenced code is syntax
/// highlighted.
pub struct TerminalHandlers {
    theme: Theme,
    lookup: CitationLookup,
    syntax: bool,
    sources: Vec<SourceNote>,
}

impl TerminalHandlers {
    pub fn new(theme: Theme, lookup: CitationLookup, syntax: bool) -> Self {
        Self {
            theme,
            lookup,
            syntax,
            sources: Vec::new(),
        }
    }

    /// Cited sources in order of first appearance.
    pub fn sources(&self) -> &[SourceNote] {
        &self.sources
    }

    fn note_source(&mut self, note: SourceNote) {
        if !self.sources.iter().any(|s| s.marker == note.marker) {
            self.sources.push(note);
        }
    }
}

impl MarkdownHandlers for TerminalHandlers {
    fn link(&mut self, dest: &str, text: &str, style: Style) -> Vec<Span<'static>> {
        if dest.is_empty() && text == CURSOR_LABEL {
            return vec![Span::styled(CURSOR_GLYPH, self.theme.cursor_style)];
        }

        if dest.is_empty() {
            if let Some(resolved) = self.lookup.resolve_label(text) {
                let marker = resolved.marker();
                let note = match &resolved {
                    ResolvedCitation::Unresolved(_) => None,
                    found => Some(SourceNote {
                        marker,
                        title: found.title().unwrap_or_default(),
                        link: found.link().map(str::to_owned),
                    }),
                };
                let label = format!("[{marker}]");
                return match note {
                    Some(note) => {
                        self.note_source(note);
                        vec![Span::styled(label, self.theme.citation_style)]
                    }
                    None => vec![Span::styled(label, self.theme.muted_style)],
                };
            }
        }

        let mut spans = vec![Span::styled(text.to_string(), style)];
        if !dest.is_empty() && dest != text {
            spans.push(Span::styled(format!(" <{dest}>"), self.theme.muted_style));
        }
        spans
    }

    fn code_block(&mut self, language: &str, code: &str) -> Vec<Line<'static>> {
        if self.syntax {
            if let Some(lines) = highlight_code_block(language, code, &self.theme) {
                return lines;
            }
        }
        let style = self.theme.codeblock_style();
        code.lines()
            .map(|line| Line::from(Span::styled(line.replace('\t', "    "), style)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SearchDocument;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(line_text).collect()
    }

    fn handlers() -> TerminalHandlers {
        let documents = vec![SearchDocument {
            document_id: "doc-1".into(),
            semantic_identifier: "Onboarding guide".into(),
            link: Some("https://wiki.example.com/onboarding".into()),
            blurb: None,
        }];
        TerminalHandlers::new(
            Theme::monochrome(),
            CitationLookup::new(documents, Vec::new()),
            false,
        )
    }

    #[test]
    fn citations_render_as_references_and_are_collected() {
        let mut handlers = handlers();
        let lines = render_markdown(
            "See the guide [[D1]]() and [[D4]]().",
            &Theme::monochrome(),
            &mut handlers,
        );
        assert_eq!(texts(&lines), vec!["See the guide [D1] and [D4]."]);
        assert_eq!(
            handlers.sources(),
            &[SourceNote {
                marker: CitationMarker::parse_label("D1").unwrap(),
                title: "Onboarding guide".into(),
                link: Some("https://wiki.example.com/onboarding".into()),
            }]
        );
    }

    #[test]
    fn cursor_placeholder_becomes_glyph() {
        let mut handlers = handlers();
        let lines = render_markdown("Thinking about it [*]() ", &Theme::monochrome(), &mut handlers);
        assert_eq!(texts(&lines), vec![format!("Thinking about it {CURSOR_GLYPH}")]);
    }

    #[test]
    fn code_blocks_go_through_the_handler() {
        let mut handlers = handlers();
        let lines = render_markdown(
            "Intro\n\n```plaintext\nlet x = 1;\n\tindented\n```\n\nAfter",
            &Theme::monochrome(),
            &mut handlers,
        );
        assert_eq!(
            texts(&lines),
            vec!["Intro", "", "let x = 1;", "    indented", "", "After"]
        );
    }

    #[test]
    fn nested_lists_indent_under_their_marker() {
        let mut handlers = handlers();
        let lines = render_markdown(
            "1. first\n2. second\n   - inner\n",
            &Theme::monochrome(),
            &mut handlers,
        );
        assert_eq!(texts(&lines), vec!["1. first", "2. second", "   - inner"]);
    }

    #[test]
    fn tables_are_aligned() {
        let mut handlers = handlers();
        let lines = render_markdown(
            "| Name | Qty |\n|---|---|\n| apple | 3 |\n",
            &Theme::monochrome(),
            &mut handlers,
        );
        assert_eq!(
            texts(&lines),
            vec![
                "│ Name  │ Qty │",
                "├───────┼─────┤",
                "│ apple │ 3   │",
            ]
        );
    }

    #[test]
    fn ordinary_links_show_destination() {
        let mut handlers = handlers();
        let lines = render_markdown(
            "[docs](https://docs.example.com)",
            &Theme::monochrome(),
            &mut handlers,
        );
        assert_eq!(texts(&lines), vec!["docs <https://docs.example.com>"]);
    }

    struct ShoutingParagraphs;

    impl MarkdownHandlers for ShoutingParagraphs {
        fn link(&mut self, _dest: &str, text: &str, style: Style) -> Vec<Span<'static>> {
            vec![Span::styled(text.to_string(), style)]
        }

        fn paragraph(&mut self, lines: Vec<Line<'static>>) -> Vec<Line<'static>> {
            lines
                .into_iter()
                .map(|line| Line::from(line_text(&line).to_uppercase()))
                .collect()
        }

        fn code_block(&mut self, _language: &str, code: &str) -> Vec<Line<'static>> {
            vec![Line::from(code.to_string())]
        }
    }

    #[test]
    fn paragraph_handler_can_rewrite_lines() {
        let lines = render_markdown("quiet words", &Theme::monochrome(), &mut ShoutingParagraphs);
        assert_eq!(texts(&lines), vec!["QUIET WORDS"]);
    }
}
