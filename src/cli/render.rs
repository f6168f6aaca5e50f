//! TUI-less rendering of an assistant message

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::api::{SearchDocument, SubQuestionDetail};
use crate::core::answer::AnswerView;
use crate::core::config::Settings;
use crate::core::message::{AssistantMessage, MessageAffordances};
use crate::core::normalize::display_text;
use crate::core::reveal::{RevealPhase, RevealTicker, Revealer};
use crate::ui::answer::{render_answer, RenderOptions};
use crate::ui::theme::Theme;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Message file to render; reads stdin when omitted
    pub file: Option<PathBuf>,

    /// Treat the message as still being generated
    #[arg(long)]
    pub incomplete: bool,

    /// Print the normalized markdown instead of rendering it
    #[arg(long, conflicts_with = "animate")]
    pub raw: bool,

    /// Reveal the answer progressively, as it would appear while streaming
    #[arg(long)]
    pub animate: bool,

    /// JSON file with the retrieved documents that citations point at
    #[arg(long, value_name = "PATH")]
    pub documents: Option<PathBuf>,

    /// JSON file with the sub-questions that question citations point at
    #[arg(long, value_name = "PATH")]
    pub sub_questions: Option<PathBuf>,

    /// Theme to render with (dark, light, monochrome)
    #[arg(long)]
    pub theme: Option<String>,
}

async fn read_message(file: Option<&Path>) -> Result<String, Box<dyn Error>> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut content = String::new();
            tokio::io::stdin().read_to_string(&mut content).await?;
            Ok(content)
        }
    }
}

fn read_json_list<T: serde::de::DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>, Box<dyn Error>> {
    match path {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(Vec::new()),
    }
}

pub async fn run_render(args: RenderArgs, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let raw = read_message(args.file.as_deref()).await?;
    let is_complete = !args.incomplete;

    if args.raw {
        println!("{}", display_text(&raw, is_complete));
        return Ok(());
    }

    if args.animate {
        return animate(&display_text(&raw, is_complete), settings).await;
    }

    let documents: Vec<SearchDocument> = read_json_list(args.documents.as_deref())?;
    let sub_questions: Vec<SubQuestionDetail> = read_json_list(args.sub_questions.as_deref())?;
    debug!(
        documents = documents.len(),
        sub_questions = sub_questions.len(),
        "Rendering message"
    );

    let message = AssistantMessage {
        is_complete,
        is_generating: !is_complete,
        documents,
        sub_questions,
        ..AssistantMessage::text(raw)
    };
    let mut view = AnswerView::new(message, MessageAffordances::default(), settings.reveal_step);
    view.allow_streaming();
    view.advance_to(usize::MAX);

    let theme = Theme::from_name(args.theme.as_deref().unwrap_or(&settings.theme));
    let options = RenderOptions {
        markdown: settings.markdown,
        syntax: settings.syntax,
    };
    for line in render_answer(&view, &theme, options) {
        println!("{}", line);
    }
    Ok(())
}

/// Streams the normalized text to stdout on the reveal cadence.
async fn animate(text: &str, settings: &Settings) -> Result<(), Box<dyn Error>> {
    if text.is_empty() {
        return Ok(());
    }

    let (handle, mut events) =
        RevealTicker::spawn(Revealer::new(text, settings.reveal_step), settings.reveal_interval);
    handle.activate();

    let mut printed = 0;
    let mut stdout = io::stdout();
    while let Some(event) = events.recv().await {
        if let Some(delta) = event.text.get(printed..) {
            print!("{delta}");
            stdout.flush()?;
        }
        printed = event.text.len();
        if event.phase == RevealPhase::Settled {
            break;
        }
    }
    println!();
    Ok(())
}
