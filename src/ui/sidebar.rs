use chrono::{DateTime, Utc};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::api::{ChatBackend, ChatSession, Folder};
use crate::core::folders::{FolderPanel, SessionGroup, EMPTY_HISTORY_HINT};
use crate::ui::theme::Theme;

const UNTITLED_CHAT: &str = "Unnamed Chat";

fn session_line(session: &ChatSession, indent: &str, theme: &Theme) -> Line<'static> {
    let name = if session.name.trim().is_empty() {
        UNTITLED_CHAT
    } else {
        session.name.trim()
    };
    Line::from(vec![
        Span::raw(indent.to_string()),
        Span::styled(name.to_string(), theme.text_style),
        Span::styled(format!("  {}", session.id), theme.muted_style),
    ])
}

/// Folders with their chats, followed by the unfiled chats grouped by age.
pub fn render_history(
    folders: &[Folder],
    groups: &[SessionGroup<'_>],
    history_empty: bool,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if !folders.is_empty() {
        lines.push(Line::from(Span::styled("Folders", theme.heading_style)));
        for folder in folders {
            lines.push(Line::from(vec![
                Span::styled("▸ ", theme.list_marker_style),
                Span::styled(
                    folder.folder_name.clone(),
                    theme.text_style.add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  #{}", folder.folder_id), theme.muted_style),
            ]));
            for session in &folder.chat_sessions {
                lines.push(session_line(session, "    ", theme));
            }
        }
    }

    for group in groups {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(group.range.label(), theme.heading_style)));
        for session in &group.sessions {
            lines.push(session_line(session, "  ", theme));
        }
    }

    if history_empty {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(EMPTY_HISTORY_HINT, theme.muted_style)));
    }

    lines
}

pub fn render_panel<B: ChatBackend>(
    panel: &FolderPanel<B>,
    now: DateTime<Utc>,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let groups = panel.grouped_sessions(now);
    render_history(panel.folders(), &groups, panel.is_history_empty(), theme)
}
