//! Command-line interface parsing and handling
//!
//! Parses arguments, installs logging, resolves settings, and dispatches to
//! the subcommand modules.

pub mod account;
pub mod config;
pub mod folders;
pub mod render;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::HttpBackend;
use crate::core::config::{ConfigOrchestrator, Settings};
use crate::utils::logging::init_tracing;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ")"
);

#[derive(Parser)]
#[command(name = "threadline")]
#[command(version = VERSION)]
#[command(about = "Terminal client for a chat backend that answers with cited documents")]
#[command(
    long_about = "Threadline renders assistant answers (citations, math, code, a timed reveal) \
in the terminal and manages chat folders, notifications and the account session against \
the chat backend.\n\n\
Environment Variables (fallback if not configured):\n\
  THREADLINE_BACKEND_URL   Backend base URL (defaults to http://localhost:8080)\n\
  THREADLINE_API_KEY       Bearer token sent with every request\n\
  RUST_LOG                 Log filter when --log-filter is not given"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL, overriding the config file and environment
    #[arg(short = 'b', long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Log filter directive for stderr diagnostics (e.g. threadline=debug)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Config file to use instead of the platform default
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize and render an assistant message
    Render(render::RenderArgs),
    /// Manage chat folders
    Folders {
        #[command(subcommand)]
        command: folders::FolderCommand,
    },
    /// List notifications, or dismiss one
    Notifications {
        /// Notification id to dismiss
        #[arg(long, value_name = "ID")]
        dismiss: Option<i64>,
    },
    /// Rate an assistant message
    Feedback(account::FeedbackArgs),
    /// Show the account menu for the current user
    Menu(account::MenuArgs),
    /// End the backend session
    Logout(account::LogoutArgs),
    /// Show or change configuration values
    Config {
        #[command(subcommand)]
        command: config::ConfigCommand,
    },
}

/// Resolved configuration shared by the subcommands.
pub struct CliContext {
    pub orchestrator: ConfigOrchestrator,
    pub settings: Settings,
}

impl CliContext {
    fn from_args(args: &Args) -> Result<Self, Box<dyn Error>> {
        let orchestrator = match &args.config_path {
            Some(path) => ConfigOrchestrator::new(path.clone()),
            None => ConfigOrchestrator::for_default_path()?,
        };
        let mut settings = Settings::resolve(&orchestrator.load()?);
        if let Some(url) = &args.backend_url {
            settings.backend_url = url.clone();
        }
        Ok(Self {
            orchestrator,
            settings,
        })
    }

    pub fn backend(&self) -> HttpBackend {
        HttpBackend::from_settings(&self.settings)
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref());

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let ctx = CliContext::from_args(&args)?;

    match args.command {
        Commands::Render(render_args) => render::run_render(render_args, &ctx.settings).await,
        Commands::Folders { command } => folders::run_folders(command, &ctx).await,
        Commands::Notifications { dismiss } => account::run_notifications(dismiss, &ctx).await,
        Commands::Feedback(feedback) => account::run_feedback(feedback, &ctx).await,
        Commands::Menu(menu) => account::run_menu(menu, &ctx).await,
        Commands::Logout(logout) => account::run_logout(logout, &ctx).await,
        Commands::Config { command } => config::run_config(command, &ctx.orchestrator),
    }
}
