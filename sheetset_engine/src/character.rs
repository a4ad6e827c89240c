//! Characters, their attributes, and the acting player.
//!
//! A [`Character`] is little more than a named bag of [`Attribute`] rows owned
//! by the [`Sheets`](crate::sheets::Sheets) store. Attributes carry two string
//! fields, `current` and `max`; any string name is acceptable, including the
//! `repeating_<section>_<rowid>_<field>` names used by repeating sections.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of an attribute's two value fields an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Current,
    Max,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Current => "current",
            Field::Max => "max",
        }
    }

    /// Error messages prefix max-field failures with "maximum ".
    pub fn error_prefix(self) -> &'static str {
        match self {
            Field::Current => "",
            Field::Max => "maximum ",
        }
    }
}

/// Who may issue commands against a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    /// Any player controls this character.
    All,
    /// A specific player controls this character.
    Player(Uuid),
}

/// A character entry in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: Uuid,
    pub name: String,
    pub controlled_by: Vec<Controller>,
}

impl Character {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            controlled_by: Vec::new(),
        }
    }

    /// Whether `actor` may modify this character's attributes.
    pub fn is_controlled_by(&self, actor: &Actor) -> bool {
        actor.is_gm
            || self.controlled_by.iter().any(|c| match c {
                Controller::All => true,
                Controller::Player(id) => *id == actor.id,
            })
    }
}

/// One `name`/`current`/`max` row on a character sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: Uuid,
    pub character_id: Uuid,
    pub name: String,
    pub current: String,
    pub max: String,
}

impl Attribute {
    /// Create an empty attribute row for a character.
    pub fn new_empty(character_id: Uuid, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            character_id,
            name: name.to_string(),
            current: String::new(),
            max: String::new(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Current => &self.current,
            Field::Max => &self.max,
        }
    }

    pub fn set(&mut self, field: Field, value: &str) {
        match field {
            Field::Current => self.current = value.to_string(),
            Field::Max => self.max = value.to_string(),
        }
    }
}

/// The player issuing a command.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub is_gm: bool,
}

impl Actor {
    pub fn new(name: &str, is_gm: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_gm,
        }
    }

    /// Name used when addressing replies to this actor.
    ///
    /// Chat surfaces decorate GM names as `"Name (GM)"`; replies go to the
    /// undecorated name. A bare `" (GM)"` falls back to `"GM"`.
    pub fn display_name(&self) -> String {
        match self.name.strip_suffix(" (GM)") {
            Some(base) if base.is_empty() => "GM".to_string(),
            Some(base) => base.to_string(),
            None => self.name.clone(),
        }
    }
}
