//! Error collection and chat-panel reporting.
//!
//! Every non-fatal problem found while processing a command lands in a shared
//! `Vec<CmdError>` and is reported once per batch; individual failures never
//! interrupt processing of other characters or fields. Output takes the form
//! of [`Message`] panels addressed privately to the invoking actor, collected
//! in an [`Outbox`] and flushed by the REPL (or inspected directly by tests).

use std::fmt::Write as _;

use textwrap::{fill, termwidth};
use thiserror::Error;

use crate::specifier::REPLACERS;
use crate::style::ChatStyle;

/// Everything that can go wrong while resolving and applying attributes.
///
/// `Display` strings are the user-facing error texts, reported verbatim in
/// the Errors panel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CmdError {
    #[error("Could not understand repeating attribute name {0}.")]
    MalformedRepeatingName(String),
    #[error("Row number {row} invalid for character {character} and repeating section {section}.")]
    RowIndexInvalid {
        row: usize,
        character: String,
        section: String,
    },
    #[error("Repeating section id {row_id} invalid for character {character} and repeating section {section}.")]
    RowIdInvalid {
        row_id: String,
        character: String,
        section: String,
    },
    #[error("Missing attribute {name} not created for character {character}.")]
    MissingAttribute { name: String, character: String },
    #[error("Permission error for character {0}.")]
    PermissionDenied(String),
    #[error("Invalid character id {0}.")]
    InvalidCharacterId(String),
    #[error("No character named {0} found.")]
    UnknownCharacterName(String),
    #[error("The --evaluate option is only available to the GM.")]
    EvaluateRequiresGm,
    #[error("Something went wrong with --evaluate. You were warned. The error message was: {0}.")]
    EvaluateFailed(String),
    #[error(
        "Attribute {prefix}{name} is not number-valued for character {character}. Attribute {prefix}left unchanged."
    )]
    NotNumberValued {
        prefix: &'static str,
        name: String,
        character: String,
    },
    #[error("Placeholder expansion limit exceeded for attribute {0}.")]
    FillInLimitExceeded(String),
    #[error("You need to supply one of --all, --allgm, --charid, or --name.")]
    NoTargetOption,
    #[error("No target characters.")]
    NoTargets,
    #[error("No attributes supplied.")]
    NoAttributes,
}

/// The two message kinds produced by a batch, plus deletion feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Errors,
    Feedback,
    Deletion,
}

/// A formatted panel addressed privately to one actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub to: String,
    pub kind: MessageKind,
    pub title: String,
    pub paragraphs: Vec<String>,
}

impl Message {
    /// Build the Errors panel and clear the error list. `None` when there is
    /// nothing to report.
    pub fn errors(to: &str, errors: &mut Vec<CmdError>) -> Option<Message> {
        if errors.is_empty() {
            return None;
        }
        let paragraphs = errors.drain(..).map(|e| e.to_string()).collect();
        Some(Message {
            to: to.to_string(),
            kind: MessageKind::Errors,
            title: "Errors".to_string(),
            paragraphs,
        })
    }

    /// Build the success-feedback panel, one line per character processed.
    ///
    /// With `replace` set, a footer reminds the actor which characters were
    /// substituted on the way out.
    pub fn feedback(to: &str, feedback: &[String], replace: bool) -> Message {
        let mut paragraphs = vec![if feedback.is_empty() {
            "Nothing to do.".to_string()
        } else {
            feedback.join("\n")
        }];
        if replace {
            let from: Vec<String> = REPLACERS.iter().map(|(safe, _)| safe.to_string()).collect();
            let into: Vec<String> = REPLACERS.iter().map(|(_, unsafe_c)| unsafe_c.to_string()).collect();
            paragraphs.push(format!("(replacing {} by {})", from.join(","), into.join(",")));
        }
        Message {
            to: to.to_string(),
            kind: MessageKind::Feedback,
            title: "Setting attributes".to_string(),
            paragraphs,
        }
    }

    /// Build the deletion-feedback panel. Characters with zero removals are
    /// omitted entirely rather than shown as empty lines.
    pub fn deletion(to: &str, lines: &[String]) -> Message {
        let paragraphs = if lines.is_empty() {
            vec!["Nothing to do.".to_string()]
        } else {
            lines.to_vec()
        };
        Message {
            to: to.to_string(),
            kind: MessageKind::Deletion,
            title: "Deleting attributes".to_string(),
            paragraphs,
        }
    }

    /// Render the panel as plain bordered text, paragraphs wrapped to the
    /// terminal. Styling is applied when the outbox flushes, so rendered
    /// text stays directly comparable in tests.
    pub fn render(&self) -> String {
        let max_width = termwidth().saturating_sub(4).clamp(20, 76);
        // wrap line by line; paragraph-internal newlines are intentional
        let wrapped: Vec<String> = self
            .paragraphs
            .iter()
            .map(|p| p.lines().map(|l| fill(l, max_width)).collect::<Vec<_>>().join("\n"))
            .collect();
        let width = wrapped
            .iter()
            .flat_map(|p| p.lines())
            .map(str::len)
            .chain([self.title.len(), 20])
            .max()
            .unwrap_or(20);
        let border = format!("+{}+", "-".repeat(width + 2));

        let mut out = String::new();
        let _ = writeln!(out, "(to {})", self.to);
        let _ = writeln!(out, "{border}");
        let _ = writeln!(out, "| {:<width$} |", self.title);
        let _ = writeln!(out, "{border}");
        for paragraph in &wrapped {
            for line in paragraph.lines() {
                let _ = writeln!(out, "| {line:<width$} |");
            }
            let _ = writeln!(out, "{border}");
        }
        out
    }
}

/// Collects outgoing messages during a command; the REPL flushes them to the
/// terminal once the command completes.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Message>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Remove and return everything queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    /// Print all queued panels to stdout and clear the queue.
    pub fn flush(&mut self) {
        for message in self.drain() {
            let rendered = message.render();
            match message.kind {
                MessageKind::Errors => println!("{}", rendered.error_style()),
                MessageKind::Feedback | MessageKind::Deletion => println!("{}", rendered.panel_style()),
            }
        }
    }
}
