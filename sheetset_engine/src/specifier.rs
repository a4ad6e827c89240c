//! Parsing of attribute specifier tokens.
//!
//! Each raw token has the shape `name`, `name|value`, `name||max`, or
//! `name|value|max`. Tokens with more than three fields are silently
//! truncated to the first three, matching long-standing behavior that macros
//! in the wild depend on. Quoted values (`'...'`) have the surrounding quotes
//! stripped, and `''` in the middle slot explicitly clears `current` while
//! also setting `max`.
//!
//! Parsing also records, per specifier, whether any value text contains a
//! `%name%` / `%name_max%` placeholder that must be filled in from the target
//! character before use.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::character::Field;

/// Substitution pairs for `--replace`: display-unsafe character on the left,
/// chat-safe stand-in on the right. Inbound parsing maps left to right;
/// feedback formatting inverts the mapping.
pub const REPLACERS: [(char, char); 6] = [
    ('<', '['),
    ('>', ']'),
    ('#', '|'),
    ('~', '-'),
    (';', '?'),
    ('`', '@'),
];

lazy_static! {
    /// `%name%` or `%name_max%`, name starting with non-whitespace.
    pub static ref FILL_IN_RE: Regex = Regex::new(r"%(\S.*?)(?:_(max))?%").expect("fill-in regex");
}

/// Desired new values for one attribute: either or both fields may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSpec {
    pub current: Option<String>,
    pub max: Option<String>,
}

impl ValueSpec {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Current => self.current.as_deref(),
            Field::Max => self.max.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Current => self.current = Some(value),
            Field::Max => self.max = Some(value),
        }
    }

    pub fn clear(&mut self, field: Field) {
        match field {
            Field::Current => self.current = None,
            Field::Max => self.max = None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.max.is_none()
    }

    /// Fields present in this spec, `current` first.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.current.is_some() {
            fields.push(Field::Current);
        }
        if self.max.is_some() {
            fields.push(Field::Max);
        }
        fields
    }

    /// Later tokens naming the same attribute overwrite earlier ones field
    /// by field.
    fn merge_from(&mut self, other: ValueSpec) {
        if let Some(current) = other.current {
            self.current = Some(current);
        }
        if let Some(max) = other.max {
            self.max = Some(max);
        }
    }

    fn has_placeholder(&self) -> bool {
        self.current.as_deref().is_some_and(|v| FILL_IN_RE.is_match(v))
            || self.max.as_deref().is_some_and(|v| FILL_IN_RE.is_match(v))
    }
}

/// The parsed setting mapping for one command: logical attribute names in
/// first-seen order, each with its merged [`ValueSpec`], plus the set of
/// names whose values need placeholder fill-in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecifierSet {
    entries: Vec<(String, ValueSpec)>,
    fill_in: HashSet<String>,
}

impl SpecifierSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Logical names with their value specs, in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ValueSpec)> {
        self.entries.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&ValueSpec> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, spec)| spec)
    }

    /// Whether the named specifier's value text contains a fill-in
    /// placeholder.
    pub fn needs_fill_in(&self, name: &str) -> bool {
        self.fill_in.contains(name)
    }

    fn insert(&mut self, name: String, spec: ValueSpec) {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            existing.merge_from(spec);
        } else {
            self.entries.push((name, spec));
        }
    }
}

/// Parse the raw specifier tokens of one command.
///
/// With `replace` set, the inbound substitution table is applied to every
/// value string before placeholders are detected, so `--replace` macros can
/// carry characters the chat surface would otherwise eat.
pub fn parse_specifiers(tokens: &[String], replace: bool) -> SpecifierSet {
    let mut set = SpecifierSet::default();
    for token in tokens {
        let fields: Vec<&str> = token.split('|').map(str::trim).collect();
        let (name, mut spec) = parse_fields(&fields);
        if replace {
            if let Some(current) = spec.current.take() {
                spec.current = Some(replace_inbound(&current));
            }
            if let Some(max) = spec.max.take() {
                spec.max = Some(replace_inbound(&max));
            }
        }
        set.insert(name, spec);
    }
    for (name, spec) in &set.entries {
        if spec.has_placeholder() {
            set.fill_in.insert(name.clone());
        }
    }
    set
}

/// Per-arity rules for one `|`-split token. More than three fields truncates
/// to the first three.
fn parse_fields(fields: &[&str]) -> (String, ValueSpec) {
    let fields = if fields.len() > 3 { &fields[..3] } else { fields };
    let name = fields[0].to_string();
    let spec = match fields {
        [_] => ValueSpec {
            current: Some(String::new()),
            max: None,
        },
        [_, value] => ValueSpec {
            current: Some(unquote(value)),
            max: None,
        },
        [_, "", max] => ValueSpec {
            current: None,
            max: Some(unquote(max)),
        },
        [_, "''", max] => ValueSpec {
            current: Some(String::new()),
            max: Some(unquote(max)),
        },
        [_, value, max] => ValueSpec {
            current: Some(unquote(value)),
            max: Some(unquote(max)),
        },
        _ => ValueSpec::default(),
    };
    (name, spec)
}

/// Strip one pair of surrounding single quotes, if present.
fn unquote(value: &str) -> String {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value)
        .to_string()
}

/// Map display-unsafe characters to their chat-safe stand-ins.
pub fn replace_inbound(text: &str) -> String {
    text.chars()
        .map(|c| {
            REPLACERS
                .iter()
                .find(|(display, _)| *display == c)
                .map_or(c, |(_, safe)| *safe)
        })
        .collect()
}

/// Invert [`replace_inbound`] for feedback text.
pub fn replace_outbound(text: &str) -> String {
    text.chars()
        .map(|c| {
            REPLACERS
                .iter()
                .find(|(_, safe)| *safe == c)
                .map_or(c, |(display, _)| *display)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn one_field_sets_empty_current() {
        let set = parse_specifiers(&toks(&["hp"]), false);
        assert_eq!(
            set.get("hp"),
            Some(&ValueSpec {
                current: Some(String::new()),
                max: None
            })
        );
    }

    #[test]
    fn two_fields_set_current() {
        let set = parse_specifiers(&toks(&["hp|5"]), false);
        assert_eq!(
            set.get("hp"),
            Some(&ValueSpec {
                current: Some("5".into()),
                max: None
            })
        );
    }

    #[test]
    fn empty_middle_sets_only_max() {
        let set = parse_specifiers(&toks(&["hp||20"]), false);
        assert_eq!(
            set.get("hp"),
            Some(&ValueSpec {
                current: None,
                max: Some("20".into())
            })
        );
    }

    #[test]
    fn empty_quote_middle_clears_current_and_sets_max() {
        let set = parse_specifiers(&toks(&["hp|''|20"]), false);
        assert_eq!(
            set.get("hp"),
            Some(&ValueSpec {
                current: Some(String::new()),
                max: Some("20".into())
            })
        );
    }

    #[test]
    fn three_fields_set_both() {
        let set = parse_specifiers(&toks(&["hp|5|20"]), false);
        assert_eq!(
            set.get("hp"),
            Some(&ValueSpec {
                current: Some("5".into()),
                max: Some("20".into())
            })
        );
    }

    #[test]
    fn extra_fields_truncate_silently() {
        let set = parse_specifiers(&toks(&["hp|5|20|99|junk"]), false);
        assert_eq!(
            set.get("hp"),
            Some(&ValueSpec {
                current: Some("5".into()),
                max: Some("20".into())
            })
        );
    }

    #[test]
    fn quotes_are_stripped_from_values() {
        let set = parse_specifiers(&toks(&["title|'Grand Vizier'"]), false);
        assert_eq!(set.get("title").unwrap().current.as_deref(), Some("Grand Vizier"));
    }

    #[test]
    fn repeated_names_merge_with_later_fields_winning() {
        let set = parse_specifiers(&toks(&["hp|5", "hp||20"]), false);
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get("hp"),
            Some(&ValueSpec {
                current: Some("5".into()),
                max: Some("20".into())
            })
        );

        let set = parse_specifiers(&toks(&["hp|5", "hp|7"]), false);
        assert_eq!(set.get("hp").unwrap().current.as_deref(), Some("7"));
    }

    #[test]
    fn fields_trim_surrounding_whitespace() {
        let set = parse_specifiers(&toks(&["hp | 5 | 20"]), false);
        assert_eq!(
            set.get("hp"),
            Some(&ValueSpec {
                current: Some("5".into()),
                max: Some("20".into())
            })
        );
    }

    #[test]
    fn replace_applies_inbound_table_to_values() {
        let set = parse_specifiers(&toks(&["note|a<b>c#d~e;f`g"]), true);
        assert_eq!(set.get("note").unwrap().current.as_deref(), Some("a[b]c|d-e?f@g"));
    }

    #[test]
    fn replace_tables_invert() {
        let original = "a<b>c#d~e;f`g";
        assert_eq!(replace_outbound(&replace_inbound(original)), original);
    }

    #[test]
    fn fill_in_flag_set_for_placeholder_values() {
        let set = parse_specifiers(&toks(&["hp|%strength%", "mana|3", "stam||%hp_max%"]), false);
        assert!(set.needs_fill_in("hp"));
        assert!(!set.needs_fill_in("mana"));
        assert!(set.needs_fill_in("stam"));
    }

    #[test]
    fn entries_preserve_first_seen_order() {
        let set = parse_specifiers(&toks(&["b|1", "a|2", "b|3"]), false);
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
