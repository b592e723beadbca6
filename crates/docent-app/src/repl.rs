//! Prompt commands and incremental transcript rendering.

use std::path::PathBuf;

use docent_core::events::LogUpdate;
use docent_core::types::{ExchangeId, Role};

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Document,
    Conversation,
    NewChat,
    Reset,
    Load(PathBuf),
    Summary,
    Export,
    History,
    Help,
    Quit,
    Ask(String),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match (name, arg) {
            ("doc", _) => Command::Document,
            ("chat", _) => Command::Conversation,
            ("new", _) => Command::NewChat,
            ("reset", _) => Command::Reset,
            ("load", path) if !path.is_empty() => Command::Load(PathBuf::from(path)),
            ("summary", _) => Command::Summary,
            ("export", _) => Command::Export,
            ("history", _) => Command::History,
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            _ => Command::Unknown(trimmed.to_string()),
        }
    }
}

pub const HELP: &str = "\
/doc            ask about the loaded document
/chat           open conversation
/new            start a new conversation
/reset          clear the current log
/load <path>    load a text document
/summary        show the backend summary of the loaded document
/export         publish the summary and print its link
/history        print the current log
/quit           leave";

/// Split a text document into paragraph chunks on blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                chunks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    chunks
}

/// Turns the stream of log updates into text to append to the terminal.
///
/// Only the tail of the log is rendered: the placeholder once, then each
/// new suffix of the growing answer.
#[derive(Debug, Default)]
pub struct Transcript {
    exchange: Option<ExchangeId>,
    printed: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, update: &LogUpdate) -> Option<String> {
        let Some(exchange) = update.exchange else {
            self.exchange = None;
            self.printed = 0;
            return None;
        };
        let last = update.last()?;
        match last.role {
            Role::User => None,
            Role::Pending => {
                self.exchange = Some(exchange);
                self.printed = 0;
                Some(format!("… {}\r", last.content))
            }
            Role::Assistant => {
                let fresh = self.exchange != Some(exchange) || self.printed == 0;
                let start = if self.exchange == Some(exchange)
                    && last.content.is_char_boundary(self.printed)
                {
                    self.printed
                } else {
                    0
                };
                self.exchange = Some(exchange);
                self.printed = last.content.len();
                let delta = &last.content[start..];
                if fresh {
                    // Overwrite the placeholder line.
                    Some(format!("\x1b[2K{delta}"))
                } else if delta.is_empty() {
                    None
                } else {
                    Some(delta.to_string())
                }
            }
        }
    }
}
