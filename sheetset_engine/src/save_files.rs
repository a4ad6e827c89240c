//! Store snapshot persistence.
//!
//! The whole [`Sheets`] store serializes to a single JSON file, written and
//! read on demand from the REPL.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::sheets::Sheets;

/// Default snapshot path used when the REPL is started without one.
pub const DEFAULT_SNAPSHOT: &str = "sheets.json";

/// Write a snapshot of the store.
pub fn save_sheets(path: &Path, sheets: &Sheets) -> Result<()> {
    let json = serde_json::to_string_pretty(sheets).context("serializing sheets store")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!("saved sheets snapshot to {}", path.display());
    Ok(())
}

/// Read a snapshot back into a store.
pub fn load_sheets(path: &Path) -> Result<Sheets> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let sheets: Sheets = serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    info!(
        "loaded sheets snapshot from {} ({} characters)",
        path.display(),
        sheets.characters.len()
    );
    Ok(sheets)
}

/// Load the default snapshot if present, otherwise start empty.
pub fn load_or_default(path: &Path) -> Sheets {
    if path.exists() {
        match load_sheets(path) {
            Ok(sheets) => return sheets,
            Err(e) => warn!("ignoring unreadable snapshot {}: {e:#}", path.display()),
        }
    }
    Sheets::new_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Character, Field};

    #[test]
    fn snapshot_roundtrip_preserves_rows_and_order() {
        let mut sheets = Sheets::new_empty();
        let char_id = sheets.add_character(Character::new("Brutus"));
        let hp = sheets.create_attr(char_id, "hp");
        sheets.attr_mut(hp).unwrap().set(Field::Current, "10");
        sheets.create_attr(char_id, "mana");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        save_sheets(&path, &sheets).unwrap();

        let restored = load_sheets(&path).unwrap();
        let names: Vec<String> = restored.attrs_of(char_id).map(|a| a.name.clone()).collect();
        assert_eq!(names, vec!["hp", "mana"]);
        assert_eq!(restored.attr(hp).unwrap().current, "10");
    }

    #[test]
    fn load_or_default_starts_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let sheets = load_or_default(&dir.path().join("nope.json"));
        assert!(sheets.characters.is_empty());
    }
}
