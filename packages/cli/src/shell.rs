//! Interactive shell using Reedline.

use std::borrow::Cow;
use std::path::PathBuf;

use nu_ansi_term::{Color, Style};
use reedline::{
    DefaultHinter, FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, Reedline, Signal,
};
use remirror_core::Session;
use tracing::warn;

use crate::commands::{self, CommandResult};
use crate::error::Error;

const HISTORY_SIZE: usize = 1000;

/// Run the shell until the user exits.
pub fn run(session: &Session, location: &str) -> Result<(), Error> {
    let mut line_editor = Reedline::create().with_hinter(Box::new(
        DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
    ));

    if let Some(history_path) = history_path() {
        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_SIZE, history_path) {
            Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
            Err(error) => warn!(%error, "history unavailable"),
        }
    }

    let prompt = ShellPrompt {
        location: location.to_string(),
    };
    println!(
        "{}",
        Color::Cyan.paint("Connected. Type 'help' for available commands, 'exit' to quit.")
    );

    loop {
        let line = match line_editor.read_line(&prompt)? {
            Signal::Success(line) => line,
            Signal::CtrlC => {
                println!("{}", Color::Cyan.paint("^C (use 'exit' to quit)"));
                continue;
            }
            Signal::CtrlD => break,
        };

        // Apply anything pushed since the last command before reading.
        if let Err(error) = session.pump() {
            println!("{} {}", Color::Red.bold().paint("Error:"), error);
        }

        match commands::execute(&line, session) {
            CommandResult::Ok { display: None } => {}
            CommandResult::Ok {
                display: Some(output),
            } => println!("{}", output),
            CommandResult::Error(message) => {
                println!("{} {}", Color::Red.bold().paint("Error:"), message)
            }
            CommandResult::Help => println!("{}", commands::format_help()),
            CommandResult::Exit => break,
        }
    }

    println!("{}", Color::Cyan.paint("Goodbye!"));
    Ok(())
}

struct ShellPrompt {
    location: String,
}

impl Prompt for ShellPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(Color::Blue.bold().paint(&self.location).to_string())
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Owned(format!(" {} ", Color::Green.bold().paint(">")))
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(": ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("remirror").join("history.txt"))
}
