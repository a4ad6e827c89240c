#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** sheetset **
//! Chat-command character-attribute engine and prompt.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use log::info;

use sheetset_engine::save_files::{DEFAULT_SNAPSHOT, load_or_default, save_sheets};
use sheetset_engine::{SHEETSET_VERSION, run_repl};

fn main() -> Result<()> {
    env_logger::init();
    info!("-=> sheetset v{SHEETSET_VERSION} <=-");

    let snapshot = Path::new(DEFAULT_SNAPSHOT);
    let mut sheets = load_or_default(snapshot);
    info!("store ready with {} character(s)", sheets.characters.len());

    println!("{}", format!("{:^60}", "SHEETSET: ATTRIBUTES FROM CHAT").bright_yellow().underline());
    println!(
        "\n{} character(s) loaded. Type {} for commands.\n",
        sheets.characters.len(),
        "help".bold()
    );

    run_repl(&mut sheets)?;

    save_sheets(snapshot, &sheets)?;
    println!("Saved {}. Goodbye.", snapshot.display());
    Ok(())
}
