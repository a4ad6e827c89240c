//! The attribute store.
//!
//! [`Sheets`] owns every character and attribute row known to the engine. It
//! is created by the caller (the REPL or a test) and passed `&mut` into the
//! command flow; the engine itself never holds on to it. Attribute iteration
//! order is creation order, which is what gives repeating-section row
//! discovery its stable first-seen ordering within a single resolution pass.

use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SHEETSET_VERSION;
use crate::character::{Actor, Attribute, Character, Field};
use crate::report::CmdError;

/// Every character and attribute currently known.
///
/// `attr_order` tracks attribute creation order; `attributes` is keyed by id
/// for direct access. The two are kept in sync by `create_attr` /
/// `remove_attr`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheets {
    pub characters: HashMap<Uuid, Character>,
    pub attributes: HashMap<Uuid, Attribute>,
    attr_order: Vec<Uuid>,
    pub version: String,
}

impl Sheets {
    /// Create a new empty store.
    pub fn new_empty() -> Self {
        let sheets = Self {
            characters: HashMap::new(),
            attributes: HashMap::new(),
            attr_order: Vec::new(),
            version: SHEETSET_VERSION.to_string(),
        };
        info!("new, empty 'Sheets' store created");
        sheets
    }

    /// Add a character and return its id.
    pub fn add_character(&mut self, character: Character) -> Uuid {
        let id = character.id;
        info!("adding character '{}' ({id})", character.name);
        self.characters.insert(id, character);
        id
    }

    /// All character ids, ordered by character name for stable output.
    pub fn all_character_ids(&self) -> Vec<Uuid> {
        let mut chars: Vec<&Character> = self.characters.values().collect();
        chars.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        chars.iter().map(|c| c.id).collect()
    }

    /// Ids of characters with an empty controller list, ordered by name.
    pub fn gm_only_character_ids(&self) -> Vec<Uuid> {
        self.all_character_ids()
            .into_iter()
            .filter(|id| self.characters[id].controlled_by.is_empty())
            .collect()
    }

    /// Case-insensitive character lookup by name.
    pub fn find_character_by_name(&self, name: &str) -> Option<Uuid> {
        let lower = name.to_lowercase();
        let mut matches: Vec<&Character> = self
            .characters
            .values()
            .filter(|c| c.name.to_lowercase() == lower)
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        matches.first().map(|c| c.id)
    }

    /// Display name for a character id, with a fallback for dangling ids.
    pub fn character_name(&self, id: Uuid) -> String {
        self.characters
            .get(&id)
            .map_or_else(|| "<unknown>".to_string(), |c| c.name.clone())
    }

    /// The character's attribute rows in creation order.
    pub fn attrs_of(&self, character_id: Uuid) -> impl Iterator<Item = &Attribute> {
        self.attr_order
            .iter()
            .filter_map(move |id| self.attributes.get(id))
            .filter(move |a| a.character_id == character_id)
    }

    /// Create an empty attribute row with the given exact name.
    pub fn create_attr(&mut self, character_id: Uuid, name: &str) -> Uuid {
        let attr = Attribute::new_empty(character_id, name);
        let id = attr.id;
        info!(
            "creating attribute '{name}' for character {}",
            self.character_name(character_id)
        );
        self.attributes.insert(id, attr);
        self.attr_order.push(id);
        id
    }

    /// Remove an attribute row. Unknown ids are ignored.
    pub fn remove_attr(&mut self, id: Uuid) {
        if self.attributes.remove(&id).is_some() {
            self.attr_order.retain(|a| *a != id);
        }
    }

    pub fn attr(&self, id: Uuid) -> Option<&Attribute> {
        self.attributes.get(&id)
    }

    pub fn attr_mut(&mut self, id: Uuid) -> Option<&mut Attribute> {
        self.attributes.get_mut(&id)
    }

    /// Current value of a named field on a character, for placeholder
    /// fill-in. Name matching is case-insensitive, consistent with attribute
    /// lookup.
    pub fn resolve_named_value(&self, character_id: Uuid, name: &str, field: Field) -> Option<String> {
        let lower = name.to_lowercase();
        self.attrs_of(character_id)
            .find(|a| a.name.to_lowercase() == lower)
            .map(|a| a.get(field).to_string())
    }

    /// Drop characters the actor does not control, recording one error per
    /// character dropped and one per id that names no character at all.
    pub fn check_permissions(&self, list: Vec<Uuid>, actor: &Actor, errors: &mut Vec<CmdError>) -> Vec<Uuid> {
        list.into_iter()
            .filter(|id| match self.characters.get(id) {
                Some(character) => {
                    if character.is_controlled_by(actor) {
                        true
                    } else {
                        errors.push(CmdError::PermissionDenied(character.name.clone()));
                        false
                    }
                },
                None => {
                    errors.push(CmdError::InvalidCharacterId(id.to_string()));
                    false
                },
            })
            .collect()
    }
}
