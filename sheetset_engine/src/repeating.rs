//! Repeating-section name resolution.
//!
//! Repeating attributes are stored under names of the form
//! `repeating_<section>_<rowid>_<field>`, where row ids are opaque tokens
//! minted when a row is created. Commands may address a row either by its
//! literal id or positionally with `_$N_` (zero-based). Positional
//! addressing resolves against the row ids discovered for that section on
//! that character, in first-seen store order. That order is stable within a
//! single resolution pass only: resolving index 0 before and after a row is
//! inserted is not guaranteed to yield the same id.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder, escape};
use uuid::Uuid;

use crate::report::CmdError;
use crate::sheets::Sheets;

lazy_static! {
    /// Positional row address: `_$N_`.
    static ref INDEX_RE: Regex = Regex::new(r"_\$(\d+)_").expect("row index regex");
    /// Literal row address: `_-xyz_` (negative-prefixed token) or `_12_`.
    static ref ID_RE: Regex = Regex::new(r"_(-[-A-Za-z0-9]+?|\d+)_").expect("row id regex");
}

/// How one specifier addresses a repeating-section row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAddress {
    /// Zero-based position among the rows currently present.
    Index(usize),
    /// Literal row id, matched case-insensitively.
    Id(String),
}

/// A logical repeating-attribute name split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatingName {
    /// Everything before the row address, e.g. `repeating_inventory`.
    pub section: String,
    /// Everything after the row address, e.g. `item`.
    pub suffix: String,
    pub address: RowAddress,
}

impl RepeatingName {
    /// Extract the row address from a logical name. Index addressing is
    /// checked first; the two forms are mutually exclusive per specifier.
    pub fn parse(logical: &str) -> Result<RepeatingName, CmdError> {
        if let Some(caps) = INDEX_RE.captures(logical) {
            let whole = caps.get(0).expect("match");
            let row: usize = caps[1].parse().map_err(|_| CmdError::MalformedRepeatingName(logical.to_string()))?;
            return Ok(RepeatingName {
                section: logical[..whole.start()].to_string(),
                suffix: logical[whole.end()..].to_string(),
                address: RowAddress::Index(row),
            });
        }
        if let Some(caps) = ID_RE.captures(logical) {
            let whole = caps.get(0).expect("match");
            return Ok(RepeatingName {
                section: logical[..whole.start()].to_string(),
                suffix: logical[whole.end()..].to_string(),
                address: RowAddress::Id(caps[1].to_lowercase()),
            });
        }
        Err(CmdError::MalformedRepeatingName(logical.to_string()))
    }

    /// Real stored name for a discovered row id.
    pub fn realize(&self, row_id: &str) -> String {
        format!("{}_{}_{}", self.section, row_id, self.suffix)
    }
}

/// Case-insensitive matcher for stored names belonging to this section:
/// `^<section>_(<rowid>)_`.
pub fn section_matcher(section: &str) -> Regex {
    RegexBuilder::new(&format!("^{}_(-[-A-Za-z0-9]+?|\\d+)_", escape(section)))
        .case_insensitive(true)
        .build()
        .expect("section matcher regex")
}

/// Row ids currently present for a section on one character, deduplicated,
/// in first-seen store order.
pub fn discover_row_ids(sheets: &Sheets, character_id: Uuid, matcher: &Regex) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for attr in sheets.attrs_of(character_id) {
        if let Some(caps) = matcher.captures(&attr.name) {
            let row_id = caps[1].to_string();
            if !ids.iter().any(|known| known.eq_ignore_ascii_case(&row_id)) {
                ids.push(row_id);
            }
        }
    }
    ids
}

/// Resolve a row address against the discovered ids, producing the real row
/// id or the appropriate invalid-row error.
pub fn resolve_row<'a>(
    name: &RepeatingName,
    row_ids: &'a [String],
    character_name: &str,
) -> Result<&'a str, CmdError> {
    match &name.address {
        RowAddress::Index(row) => row_ids.get(*row).map(String::as_str).ok_or_else(|| CmdError::RowIndexInvalid {
            row: *row,
            character: character_name.to_string(),
            section: name.section.clone(),
        }),
        RowAddress::Id(row_id) => row_ids
            .iter()
            .find(|known| known.to_lowercase() == *row_id)
            .map(String::as_str)
            .ok_or_else(|| CmdError::RowIdInvalid {
                row_id: row_id.clone(),
                character: character_name.to_string(),
                section: name.section.clone(),
            }),
    }
}
