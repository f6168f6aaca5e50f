//! Account dropdown: which entries to show for the current session, the
//! notification feed behind it, and logout.

use tracing::{error, info};

use crate::api::{BackendError, ChatBackend, NavigationItem, Notification, User, UserRole};
use crate::core::config::Settings;
use crate::core::popup::Popup;

/// Id of the placeholder user reported when authentication is disabled.
pub const NO_AUTH_USER_ID: &str = "__no_auth_user__";
pub const ADMIN_PANEL_PATH: &str = "/admin/indexing/status";
pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Chat,
    Search,
    Admin,
}

/// Session and settings the menu is built from.
#[derive(Debug, Clone, Copy)]
pub struct MenuContext<'a> {
    pub user: Option<&'a User>,
    pub is_curator: bool,
    pub custom_nav_items: &'a [NavigationItem],
    pub logout_disabled: bool,
    pub notifications: &'a [Notification],
    pub page: Page,
    pub has_user_settings: bool,
    /// Anonymous browsing: the menu offers nothing but "Log In".
    pub hide_user_dropdown: bool,
}

impl<'a> MenuContext<'a> {
    pub fn new(
        user: Option<&'a User>,
        settings: &'a Settings,
        notifications: &'a [Notification],
    ) -> Self {
        Self {
            user,
            is_curator: user.is_some_and(|u| u.role.is_curator()),
            custom_nav_items: &settings.custom_nav_items,
            logout_disabled: settings.logout_disabled,
            notifications,
            page: Page::default(),
            has_user_settings: true,
            hide_user_dropdown: false,
        }
    }

    pub fn show_admin_panel(&self) -> bool {
        self.user.is_none_or(|user| user.role == UserRole::Admin)
    }

    pub fn show_curator_panel(&self) -> bool {
        self.user.is_some() && self.is_curator
    }

    pub fn show_logout(&self) -> bool {
        self.user
            .is_some_and(|user| !is_no_auth_user(&user.id))
            && !self.logout_disabled
    }
}

pub fn is_no_auth_user(user_id: &str) -> bool {
    user_id == NO_AUTH_USER_ID
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Link { href: String, new_tab: bool },
    OpenUserSettings,
    ShowNotifications,
    Logout,
    LogIn,
}

/// Icon of a custom navigation entry. An inline SVG logo wins over a named
/// icon when both are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuIcon {
    Named(String),
    Svg(String),
}

impl MenuIcon {
    pub fn for_nav_item(item: &NavigationItem) -> Option<Self> {
        match (&item.svg_logo, &item.icon) {
            (Some(svg), _) => Some(MenuIcon::Svg(svg.clone())),
            (None, Some(name)) => Some(MenuIcon::Named(name.clone())),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Item {
        label: String,
        icon: Option<MenuIcon>,
        action: MenuAction,
    },
    Separator,
}

impl MenuEntry {
    fn item(label: impl Into<String>, action: MenuAction) -> Self {
        MenuEntry::Item {
            label: label.into(),
            icon: None,
            action,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            MenuEntry::Item { label, .. } => Some(label),
            MenuEntry::Separator => None,
        }
    }
}

/// What the open dropdown shows.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuView<'a> {
    Notifications(&'a [Notification]),
    Entries(Vec<MenuEntry>),
}

/// Open/closed state of the dropdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserMenuState {
    pub open: bool,
    pub show_notifications: bool,
}

impl UserMenuState {
    /// Opening or closing always returns to the entry list.
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
        self.show_notifications = false;
    }

    pub fn toggle(&mut self) {
        self.set_open(!self.open);
    }

    pub fn open_notifications(&mut self) {
        self.open = true;
        self.show_notifications = true;
    }

    pub fn back_to_menu(&mut self) {
        self.show_notifications = false;
    }
}

pub fn build_menu<'a>(ctx: &MenuContext<'a>, state: &UserMenuState) -> MenuView<'a> {
    if ctx.page != Page::Admin && state.show_notifications {
        return MenuView::Notifications(ctx.notifications);
    }
    if ctx.hide_user_dropdown {
        return MenuView::Entries(vec![MenuEntry::item("Log In", MenuAction::LogIn)]);
    }

    let mut entries: Vec<MenuEntry> = ctx
        .custom_nav_items
        .iter()
        .map(|item| MenuEntry::Item {
            label: item.title.clone(),
            icon: MenuIcon::for_nav_item(item),
            action: MenuAction::Link {
                href: item.link.clone(),
                new_tab: true,
            },
        })
        .collect();

    let panel_link = MenuAction::Link {
        href: ADMIN_PANEL_PATH.to_string(),
        new_tab: false,
    };
    if ctx.show_admin_panel() {
        entries.push(MenuEntry::item("Admin Panel", panel_link));
    } else if ctx.show_curator_panel() {
        entries.push(MenuEntry::item("Curator Panel", panel_link));
    }

    if ctx.has_user_settings {
        entries.push(MenuEntry::item("User Settings", MenuAction::OpenUserSettings));
    }

    entries.push(MenuEntry::item(
        notifications_label(ctx.notifications.len()),
        MenuAction::ShowNotifications,
    ));

    if ctx.show_logout() {
        let has_links_above = ctx.show_admin_panel()
            || ctx.show_curator_panel()
            || !ctx.custom_nav_items.is_empty();
        if has_links_above {
            entries.push(MenuEntry::Separator);
        }
        entries.push(MenuEntry::item("Log out", MenuAction::Logout));
    }

    MenuView::Entries(entries)
}

fn notifications_label(count: usize) -> String {
    if count > 0 {
        format!("Notifications ({count})")
    } else {
        "Notifications".to_string()
    }
}

/// Upper-cased first letter of the email, or `A` when there is none.
pub fn avatar_initial(user: Option<&User>) -> String {
    user.and_then(|u| u.email.chars().next())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "A".to_string())
}

pub fn has_badge(notifications: &[Notification]) -> bool {
    !notifications.is_empty()
}

/// Login URL that returns to `path` (and its query) afterwards.
pub fn login_redirect_url(path: &str, query: Option<&str>) -> String {
    let current = match query.filter(|q| !q.is_empty()) {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(&current))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    Redirect(String),
    Failed(Popup),
}

pub async fn perform_logout<B: ChatBackend + ?Sized>(
    backend: &B,
    path: &str,
    query: Option<&str>,
) -> LogoutOutcome {
    match backend.logout().await {
        Ok(()) => {
            info!("Logged out");
            LogoutOutcome::Redirect(login_redirect_url(path, query))
        }
        Err(err) => {
            error!(error = %err, "Logout failed");
            LogoutOutcome::Failed(Popup::error("Failed to logout"))
        }
    }
}

/// Notifications behind the dropdown badge.
#[derive(Debug, Clone, Default)]
pub struct NotificationFeed {
    notifications: Vec<Notification>,
}

impl NotificationFeed {
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub async fn refresh<B: ChatBackend + ?Sized>(&mut self, backend: &B) -> Result<(), BackendError> {
        self.notifications = backend
            .list_notifications()
            .await?
            .into_iter()
            .filter(|notification| !notification.dismissed)
            .collect();
        Ok(())
    }

    /// Dismisses one notification, then reloads the feed.
    pub async fn dismiss<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        notification_id: i64,
    ) -> Result<(), BackendError> {
        backend.dismiss_notification(notification_id).await?;
        self.refresh(backend).await
    }
}
