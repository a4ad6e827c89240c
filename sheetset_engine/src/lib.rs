#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const SHEETSET_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod apply;
pub mod batch;
pub mod character;
pub mod command;
pub mod engine;
pub mod eval;
pub mod opts;
pub mod repeating;
pub mod repl;
pub mod report;
pub mod resolve;
pub mod save_files;
pub mod sheets;
pub mod specifier;
pub mod style;

// Re-exports for convenience
pub use character::{Actor, Attribute, Character, Field};
pub use engine::{CommandMode, run_chat_command};
pub use report::{CmdError, Message, Outbox};
pub use repl::run_repl;
pub use sheets::Sheets;
pub use specifier::{SpecifierSet, ValueSpec, parse_specifiers};
