use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::api::{Notification, User};
use crate::core::user_menu::{avatar_initial, has_badge, MenuEntry, MenuIcon, MenuView};
use crate::ui::theme::Theme;

/// The avatar button: the user's initial with a dot while notifications wait.
pub fn avatar_line(user: Option<&User>, notifications: &[Notification], theme: &Theme) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("({})", avatar_initial(user)),
        theme.text_style.add_modifier(Modifier::BOLD),
    )];
    if has_badge(notifications) {
        spans.push(Span::styled("●", theme.badge_style));
    }
    Line::from(spans)
}

fn notification_line(notification: &Notification, theme: &Theme) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("#{} ", notification.id), theme.muted_style),
        Span::styled(notification.notif_type.replace('_', " "), theme.text_style),
    ];
    if let Some(shown) = &notification.first_shown {
        spans.push(Span::styled(format!("  {shown}"), theme.muted_style));
    }
    Line::from(spans)
}

pub fn render_menu(view: &MenuView<'_>, theme: &Theme) -> Vec<Line<'static>> {
    match view {
        MenuView::Notifications(notifications) if notifications.is_empty() => {
            vec![Line::from(Span::styled(
                "No notifications",
                theme.muted_style,
            ))]
        }
        MenuView::Notifications(notifications) => notifications
            .iter()
            .map(|notification| notification_line(notification, theme))
            .collect(),
        MenuView::Entries(entries) => entries
            .iter()
            .map(|entry| match entry {
                MenuEntry::Separator => {
                    Line::from(Span::styled("─".repeat(16), theme.muted_style))
                }
                MenuEntry::Item { label, icon, .. } => {
                    let mut spans = Vec::new();
                    match icon {
                        // Inline SVG cannot be drawn in a terminal cell.
                        Some(MenuIcon::Svg(_)) => {
                            spans.push(Span::styled("◆ ", theme.list_marker_style));
                        }
                        Some(MenuIcon::Named(name)) => {
                            spans.push(Span::styled(format!("{name} "), theme.list_marker_style));
                        }
                        None => {}
                    }
                    spans.push(Span::styled(label.clone(), theme.text_style));
                    Line::from(spans)
                }
            })
            .collect(),
    }
}
