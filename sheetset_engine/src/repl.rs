//! Interactive prompt.
//!
//! Reads lines with rustyline, dispatches chat commands into the engine, and
//! flushes the resulting panels to the terminal. The prompt session acts as
//! the GM; characters added here are controlled by everyone so permission
//! paths stay exercisable from tests and macros.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use log::info;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::character::{Actor, Character, Controller};
use crate::command::{Command, parse_command};
use crate::engine::run_chat_command;
use crate::report::Outbox;
use crate::save_files::{load_sheets, save_sheets};
use crate::sheets::Sheets;
use crate::style::ChatStyle;

const HELP_TEXT: &str = "\
Commands:
  !setattr --<targets> [--mod|--modb] [--evaluate] [--replace] [--nocreate] [--silent] --name|value|max ...
  !delattr --<targets> [--silent] --name ...
      targets: --all | --allgm | --charid <ids> | --name <names>
  addchar <name>     create a character
  chars              list characters
  attrs <name>       show a character's attributes
  save <file>        write a snapshot
  load <file>        read a snapshot
  help, ?            this text
  quit, exit         leave";

/// Run the prompt loop until the user quits.
///
/// # Errors
/// - Propagates editor construction failures and snapshot I/O errors worth
///   surfacing; per-command problems are reported inline instead.
pub fn run_repl(sheets: &mut Sheets) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let actor = Actor::new("GM (GM)", true);
    let mut outbox = Outbox::new();
    let prompt = "sheetset>> ".prompt_style().to_string();

    loop {
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(e) => {
                println!("{}", "Failed to read input. Try again.".error_style());
                info!("readline error: {e}");
                continue;
            },
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&line);

        match parse_command(&line) {
            Command::Attr { mode, content } => {
                run_chat_command(sheets, &actor, &content, mode, &mut outbox);
                outbox.flush();
            },
            Command::AddChar(name) => {
                let mut character = Character::new(&name);
                character.controlled_by.push(Controller::All);
                sheets.add_character(character);
                println!("Added character {}.", name.character_style());
            },
            Command::Chars => list_characters(sheets),
            Command::Attrs(name) => list_attributes(sheets, &name),
            Command::Save(file) => match save_sheets(Path::new(&file), sheets) {
                Ok(()) => println!("Saved to {file}."),
                Err(e) => println!("{}", format!("Save failed: {e:#}").error_style()),
            },
            Command::Load(file) => match load_sheets(Path::new(&file)) {
                Ok(loaded) => {
                    *sheets = loaded;
                    println!("Loaded {file}.");
                },
                Err(e) => println!("{}", format!("Load failed: {e:#}").error_style()),
            },
            Command::Help => println!("{HELP_TEXT}"),
            Command::Quit => break,
            Command::Unknown => {
                println!("{}", "Unrecognized command. Try 'help'.".error_style());
            },
        }
    }
    Ok(())
}

fn list_characters(sheets: &Sheets) {
    if sheets.characters.is_empty() {
        println!("No characters yet. Try 'addchar <name>'.");
        return;
    }
    println!("{}", "Characters".heading_style());
    for id in sheets.all_character_ids() {
        let character = &sheets.characters[&id];
        let rows = sheets.attrs_of(id).count();
        println!(
            "  {} {} ({rows} attribute{})",
            character.name.character_style(),
            format!("[{id}]").dimmed(),
            if rows == 1 { "" } else { "s" }
        );
    }
}

fn list_attributes(sheets: &Sheets, name: &str) {
    let Some(char_id) = sheets.find_character_by_name(name) else {
        println!("{}", format!("No character named {name} found.").error_style());
        return;
    };
    println!("{}", sheets.character_name(char_id).heading_style());
    let mut any = false;
    for attr in sheets.attrs_of(char_id) {
        any = true;
        println!("  {} = {:?} / {:?}", attr.name.attr_style(), attr.current, attr.max);
    }
    if !any {
        println!("  (no attributes)");
    }
}
