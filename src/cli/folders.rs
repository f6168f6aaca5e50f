use std::error::Error;
use std::io::{self, BufRead, Write};

use chrono::Utc;
use clap::Subcommand;

use crate::api::{ChatBackend, FolderId};
use crate::cli::CliContext;
use crate::core::folders::{DragEnd, FolderPanel};
use crate::core::popup::Popup;
use crate::ui::sidebar::render_panel;
use crate::ui::theme::Theme;

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum FolderCommand {
    /// Show folders and their chats
    List,
    /// Create a folder
    Create { name: String },
    /// Rename a folder
    Rename { folder_id: FolderId, name: String },
    /// Delete a folder
    Delete {
        folder_id: FolderId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Move a folder to the position of another one
    Move { folder_id: FolderId, over: FolderId },
    /// File a chat under a folder
    AddChat {
        folder_id: FolderId,
        chat_session_id: String,
    },
}

fn report(popup: Option<Popup>) -> Result<(), Box<dyn Error>> {
    match popup {
        Some(popup) if popup.is_error() => Err(popup.message.into()),
        Some(popup) => {
            println!("✅ {}", popup.message);
            Ok(())
        }
        None => Ok(()),
    }
}

fn confirm_on_terminal(question: &str) -> bool {
    print!("{question} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub async fn run_folders(command: FolderCommand, ctx: &CliContext) -> Result<(), Box<dyn Error>> {
    let mut panel = FolderPanel::new(ctx.backend());
    panel.refresh_folders().await?;
    execute(command, &mut panel, &Theme::from_name(&ctx.settings.theme)).await
}

pub async fn execute<B: ChatBackend>(
    command: FolderCommand,
    panel: &mut FolderPanel<B>,
    theme: &Theme,
) -> Result<(), Box<dyn Error>> {
    match command {
        FolderCommand::List => {
            let sessions = panel
                .folders()
                .iter()
                .flat_map(|folder| folder.chat_sessions.iter().cloned())
                .collect();
            panel.set_chat_sessions(sessions);
            for line in render_panel(panel, Utc::now(), theme) {
                println!("{}", line);
            }
            Ok(())
        }
        FolderCommand::Create { name } => report(panel.create_folder(&name).await),
        FolderCommand::Rename { folder_id, name } => {
            report(Some(panel.rename_folder(folder_id, &name).await))
        }
        FolderCommand::Delete { folder_id, yes } => {
            let popup = panel
                .delete_folder(folder_id, |question| yes || confirm_on_terminal(question))
                .await;
            report(popup)
        }
        FolderCommand::Move { folder_id, over } => {
            let event = DragEnd::new(folder_id.to_string(), Some(over.to_string()));
            report(panel.handle_drag_end(&event).await)?;
            let order = panel
                .folders()
                .iter()
                .map(|folder| folder.folder_name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!("Folder order: {order}");
            Ok(())
        }
        FolderCommand::AddChat {
            folder_id,
            chat_session_id,
        } => report(Some(
            panel.add_chat_to_folder(folder_id, &chat_session_id).await,
        )),
    }
}
