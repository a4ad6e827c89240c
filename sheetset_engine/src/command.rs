//! Command module
//!
//! Describes the commands recognized at the prompt: the two chat commands
//! that drive the engine, plus the utility commands for inspecting and
//! persisting the store.

use crate::engine::CommandMode;

/// Commands that can be executed from the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!setattr ...` or `!delattr ...`, carrying the full command text.
    Attr { mode: CommandMode, content: String },
    /// Create a character controlled by everyone.
    AddChar(String),
    /// List all characters.
    Chars,
    /// Show one character's attributes.
    Attrs(String),
    Save(String),
    Load(String),
    Help,
    Quit,
    Unknown,
}

/// Parses an input line and returns a corresponding `Command` if recognized.
pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if let Some(word) = trimmed.split_whitespace().next() {
        match word {
            "!setattr" => {
                return Command::Attr {
                    mode: CommandMode::Set,
                    content: trimmed.to_string(),
                };
            },
            "!delattr" => {
                return Command::Attr {
                    mode: CommandMode::Delete,
                    content: trimmed.to_string(),
                };
            },
            _ => {},
        }
    }
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    match words.as_slice() {
        ["chars" | "characters"] => Command::Chars,
        ["attrs", rest @ ..] if !rest.is_empty() => Command::Attrs(rest.join(" ")),
        ["addchar", rest @ ..] if !rest.is_empty() => Command::AddChar(rest.join(" ")),
        ["save", file] => Command::Save((*file).to_string()),
        ["load", file] => Command::Load((*file).to_string()),
        ["help" | "?"] => Command::Help,
        ["quit" | "exit"] => Command::Quit,
        _ => Command::Unknown,
    }
}
