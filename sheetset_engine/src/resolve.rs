//! Attribute resolution: logical specifier names to concrete store rows.
//!
//! Resolution happens eagerly for every target character before any mutation
//! is scheduled. Standard names are matched case-insensitively through a
//! lowercased-name index built once per character; `repeating_*` names go
//! through the row-address machinery in [`crate::repeating`] and then feed
//! the same lookup/create/error policy as standard names.

use std::collections::HashMap;

use log::debug;
use uuid::Uuid;

use crate::repeating::{RepeatingName, discover_row_ids, resolve_row, section_matcher};
use crate::report::CmdError;
use crate::sheets::Sheets;
use crate::specifier::SpecifierSet;

/// What to do when a named attribute does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvePolicy {
    /// Create the attribute (set-mode without `--nocreate`).
    pub create_missing: bool,
    /// Omit it without recording an error (delete-mode).
    pub fail_silently: bool,
}

/// Per-character mapping from logical specifier name to resolved attribute
/// row. Absent entries are resolution failures already recorded (or silently
/// skipped) according to policy.
pub type AttrMap = HashMap<Uuid, HashMap<String, Uuid>>;

/// Resolve every specifier against every target character.
pub fn resolve_all(
    sheets: &mut Sheets,
    characters: &[Uuid],
    specs: &SpecifierSet,
    policy: ResolvePolicy,
    errors: &mut Vec<CmdError>,
) -> AttrMap {
    let mut map: AttrMap = characters.iter().map(|id| (*id, HashMap::new())).collect();

    let (repeating, standard): (Vec<&str>, Vec<&str>) =
        specs.names().partition(|name| name.starts_with("repeating_"));

    resolve_standard(sheets, characters, &standard, policy, errors, &mut map);
    resolve_repeating(sheets, characters, &repeating, policy, errors, &mut map);
    map
}

fn resolve_standard(
    sheets: &mut Sheets,
    characters: &[Uuid],
    names: &[&str],
    policy: ResolvePolicy,
    errors: &mut Vec<CmdError>,
    map: &mut AttrMap,
) {
    for &char_id in characters {
        // one lowercased-name index per character, not a rescan per name
        let index: HashMap<String, Uuid> = sheets
            .attrs_of(char_id)
            .map(|attr| (attr.name.to_lowercase(), attr.id))
            .collect();
        for &name in names {
            match index.get(&name.to_lowercase()) {
                Some(attr_id) => {
                    map.entry(char_id).or_default().insert(name.to_string(), *attr_id);
                },
                None if policy.create_missing => {
                    let attr_id = sheets.create_attr(char_id, name);
                    map.entry(char_id).or_default().insert(name.to_string(), attr_id);
                },
                None if policy.fail_silently => {
                    debug!("skipping missing attribute '{name}' for {char_id}");
                },
                None => {
                    errors.push(CmdError::MissingAttribute {
                        name: name.to_string(),
                        character: sheets.character_name(char_id),
                    });
                },
            }
        }
    }
}

fn resolve_repeating(
    sheets: &mut Sheets,
    characters: &[Uuid],
    names: &[&str],
    policy: ResolvePolicy,
    errors: &mut Vec<CmdError>,
    map: &mut AttrMap,
) {
    for &logical in names {
        let parsed = match RepeatingName::parse(logical) {
            Ok(parsed) => parsed,
            Err(err) => {
                // one error per specifier, not per character
                errors.push(err);
                continue;
            },
        };
        let matcher = section_matcher(&parsed.section);

        for &char_id in characters {
            let row_ids = discover_row_ids(sheets, char_id, &matcher);
            let row_id = match resolve_row(&parsed, &row_ids, &sheets.character_name(char_id)) {
                Ok(row_id) => row_id.to_string(),
                Err(err) => {
                    errors.push(err);
                    continue;
                },
            };
            let real_name = parsed.realize(&row_id);

            let existing = sheets
                .attrs_of(char_id)
                .find(|attr| attr.name.eq_ignore_ascii_case(&real_name))
                .map(|attr| attr.id);
            match existing {
                Some(attr_id) => {
                    map.entry(char_id).or_default().insert(logical.to_string(), attr_id);
                },
                None if policy.create_missing => {
                    let attr_id = sheets.create_attr(char_id, &real_name);
                    map.entry(char_id).or_default().insert(logical.to_string(), attr_id);
                },
                None if policy.fail_silently => {
                    debug!("skipping missing repeating attribute '{real_name}' for {char_id}");
                },
                None => {
                    errors.push(CmdError::MissingAttribute {
                        name: real_name,
                        character: sheets.character_name(char_id),
                    });
                },
            }
        }
    }
}
