use std::error::Error;

use clap::{Args, ValueEnum};

use crate::api::{ChatBackend, FeedbackRequest, FeedbackType};
use crate::cli::CliContext;
use crate::core::user_menu::{
    build_menu, perform_logout, LogoutOutcome, MenuContext, NotificationFeed, Page,
    UserMenuState,
};
use crate::ui::theme::Theme;
use crate::ui::user_menu::{avatar_line, render_menu};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Rating {
    Like,
    Dislike,
}

impl From<Rating> for FeedbackType {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Like => FeedbackType::Like,
            Rating::Dislike => FeedbackType::Dislike,
        }
    }
}

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    /// Id of the assistant message being rated
    pub message_id: i64,
    #[arg(value_enum)]
    pub rating: Rating,
    /// Optional free-form comment
    #[arg(short, long)]
    pub text: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PageArg {
    #[default]
    Chat,
    Search,
    Admin,
}

impl From<PageArg> for Page {
    fn from(page: PageArg) -> Self {
        match page {
            PageArg::Chat => Page::Chat,
            PageArg::Search => Page::Search,
            PageArg::Admin => Page::Admin,
        }
    }
}

#[derive(Args, Debug)]
pub struct MenuArgs {
    /// Page the menu is opened from
    #[arg(long, value_enum, default_value_t = PageArg::Chat)]
    pub page: PageArg,
    /// Show the notifications panel instead of the entries
    #[arg(long)]
    pub notifications: bool,
}

#[derive(Args, Debug)]
pub struct LogoutArgs {
    /// Path to come back to after logging in again
    #[arg(long, default_value = "/chat")]
    pub path: String,
    /// Query string of that path
    #[arg(long)]
    pub query: Option<String>,
}

pub async fn run_notifications(dismiss: Option<i64>, ctx: &CliContext) -> Result<(), Box<dyn Error>> {
    let backend = ctx.backend();
    let mut feed = NotificationFeed::default();
    match dismiss {
        Some(id) => {
            feed.dismiss(&backend, id).await?;
            println!("✅ Dismissed notification {id}");
        }
        None => feed.refresh(&backend).await?,
    }

    let theme = Theme::from_name(&ctx.settings.theme);
    let mut state = UserMenuState::default();
    state.open_notifications();
    let menu_ctx = MenuContext::new(None, &ctx.settings, feed.notifications());
    for line in render_menu(&build_menu(&menu_ctx, &state), &theme) {
        println!("{}", line);
    }
    Ok(())
}

pub async fn run_feedback(args: FeedbackArgs, ctx: &CliContext) -> Result<(), Box<dyn Error>> {
    let request = FeedbackRequest::new(args.message_id, args.rating.into()).with_text(args.text);
    ctx.backend().submit_feedback(&request).await?;
    println!("✅ Feedback recorded for message {}", args.message_id);
    Ok(())
}

pub async fn run_menu(args: MenuArgs, ctx: &CliContext) -> Result<(), Box<dyn Error>> {
    let backend = ctx.backend();
    let user = backend.current_user().await?;
    let mut feed = NotificationFeed::default();
    feed.refresh(&backend).await?;

    let mut menu_ctx = MenuContext::new(user.as_ref(), &ctx.settings, feed.notifications());
    menu_ctx.page = args.page.into();
    menu_ctx.hide_user_dropdown = user.is_none();
    // No user settings screen in the terminal client.
    menu_ctx.has_user_settings = false;

    let mut state = UserMenuState::default();
    if args.notifications {
        state.open_notifications();
    } else {
        state.set_open(true);
    }

    let theme = Theme::from_name(&ctx.settings.theme);
    println!("{}", avatar_line(user.as_ref(), feed.notifications(), &theme));
    for line in render_menu(&build_menu(&menu_ctx, &state), &theme) {
        println!("  {}", line);
    }
    Ok(())
}

pub async fn run_logout(args: LogoutArgs, ctx: &CliContext) -> Result<(), Box<dyn Error>> {
    match perform_logout(&ctx.backend(), &args.path, args.query.as_deref()).await {
        LogoutOutcome::Redirect(url) => {
            println!("✅ Logged out. Log in again at {url}");
            Ok(())
        }
        LogoutOutcome::Failed(popup) => Err(popup.message.into()),
    }
}
