//! Staggered per-character batch processing.
//!
//! Attribute resolution for the whole batch has already happened by the time
//! a [`BatchRun`] is built; what remains is mutation and feedback, which run
//! one character per tick with a short pause between ticks so a large batch
//! never monopolizes the host. Deletion has no per-row work left at this
//! point and runs synchronously in a single pass.

use std::collections::VecDeque;
use std::time::Duration;

use log::info;
use uuid::Uuid;

use crate::apply::apply_to_character;
use crate::opts::Opts;
use crate::report::{CmdError, Message};
use crate::resolve::AttrMap;
use crate::sheets::Sheets;
use crate::specifier::SpecifierSet;

#[cfg(test)]
const TICK_DELAY: Duration = Duration::ZERO;
#[cfg(not(test))]
const TICK_DELAY: Duration = Duration::from_millis(50);

/// Where a batch currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    /// Characters remain to be processed.
    Pending,
    /// A character was just processed this tick.
    Processing(Uuid),
    /// Queue exhausted; aggregated messages are ready.
    Done,
}

/// One staggered set-attributes batch over a list of characters.
#[derive(Debug)]
pub struct BatchRun {
    queue: VecDeque<Uuid>,
    errors: Vec<CmdError>,
    feedback: Vec<String>,
    delay: Duration,
}

impl BatchRun {
    pub fn new(characters: &[Uuid]) -> Self {
        Self {
            queue: characters.iter().copied().collect(),
            errors: Vec::new(),
            feedback: Vec::new(),
            delay: TICK_DELAY,
        }
    }

    /// Process exactly one character. Returns `Processing` for the character
    /// just handled, or `Done` once the queue was already empty.
    pub fn tick(&mut self, sheets: &mut Sheets, specs: &SpecifierSet, attrs: &AttrMap, opts: &Opts) -> BatchState {
        let Some(char_id) = self.queue.pop_front() else {
            return BatchState::Done;
        };
        info!("batch tick: applying attributes for character {char_id}");
        let empty = std::collections::HashMap::new();
        let resolved = attrs.get(&char_id).unwrap_or(&empty);
        apply_to_character(sheets, char_id, specs, resolved, opts, &mut self.errors, &mut self.feedback);
        BatchState::Processing(char_id)
    }

    pub fn state(&self) -> BatchState {
        if self.queue.is_empty() {
            BatchState::Done
        } else {
            BatchState::Pending
        }
    }

    /// Drain the queue, pausing between characters, then build the final
    /// messages: the errors panel (if anything accumulated) followed by the
    /// feedback panel unless the command was silent.
    pub fn run(
        mut self,
        sheets: &mut Sheets,
        specs: &SpecifierSet,
        attrs: &AttrMap,
        opts: &Opts,
        who: &str,
    ) -> Vec<Message> {
        while self.tick(sheets, specs, attrs, opts) != BatchState::Done {
            if self.state() == BatchState::Pending {
                std::thread::sleep(self.delay);
            }
        }
        info!("batch complete: {} feedback line(s), {} error(s)", self.feedback.len(), self.errors.len());

        let mut messages = Vec::new();
        if let Some(errors) = Message::errors(who, &mut self.errors) {
            messages.push(errors);
        }
        if !opts.silent {
            messages.push(Message::feedback(who, &self.feedback, opts.replace));
        }
        messages
    }
}

/// Remove every resolved attribute in one synchronous pass and build the
/// deletion feedback message (unless silent). Characters with nothing
/// removed are omitted from the feedback entirely.
pub fn delete_attributes(
    sheets: &mut Sheets,
    characters: &[Uuid],
    specs: &SpecifierSet,
    attrs: &AttrMap,
    opts: &Opts,
    who: &str,
) -> Option<Message> {
    let mut lines = Vec::new();
    for &char_id in characters {
        let Some(resolved) = attrs.get(&char_id) else {
            continue;
        };
        let removed: Vec<&str> = specs
            .names()
            .filter(|name| resolved.contains_key(*name))
            .collect();
        for name in &removed {
            sheets.remove_attr(resolved[*name]);
        }
        if !removed.is_empty() {
            lines.push(format!(
                "Deleting attribute(s) {} for character {}.",
                removed.join(", "),
                sheets.character_name(char_id)
            ));
        }
    }
    info!("deleted attributes for {} character(s)", lines.len());

    if opts.silent {
        None
    } else {
        Some(Message::deletion(who, &lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Character, Field};
    use crate::resolve::{ResolvePolicy, resolve_all};
    use crate::specifier::parse_specifiers;

    fn specs(raw: &[&str]) -> SpecifierSet {
        let tokens: Vec<String> = raw.iter().map(|s| (*s).to_string()).collect();
        parse_specifiers(&tokens, false)
    }

    fn setup(names: &[&str]) -> (Sheets, Vec<Uuid>) {
        let mut sheets = Sheets::new_empty();
        let ids = names
            .iter()
            .map(|n| sheets.add_character(Character::new(n)))
            .collect();
        (sheets, ids)
    }

    fn resolve(sheets: &mut Sheets, chars: &[Uuid], specs: &SpecifierSet, create: bool, silent: bool) -> AttrMap {
        let mut errors = Vec::new();
        let map = resolve_all(
            sheets,
            chars,
            specs,
            ResolvePolicy {
                create_missing: create,
                fail_silently: silent,
            },
            &mut errors,
        );
        assert!(errors.is_empty(), "unexpected: {errors:?}");
        map
    }

    #[test]
    fn tick_processes_one_character_at_a_time() {
        let (mut sheets, ids) = setup(&["Abel", "Brutus"]);
        let specs = specs(&["hp|5"]);
        let attrs = resolve(&mut sheets, &ids, &specs, true, false);
        let opts = Opts::default();
        let mut run = BatchRun::new(&ids);

        assert_eq!(run.tick(&mut sheets, &specs, &attrs, &opts), BatchState::Processing(ids[0]));
        assert_eq!(run.state(), BatchState::Pending);
        assert_eq!(run.tick(&mut sheets, &specs, &attrs, &opts), BatchState::Processing(ids[1]));
        assert_eq!(run.state(), BatchState::Done);
        assert_eq!(run.tick(&mut sheets, &specs, &attrs, &opts), BatchState::Done);
    }

    #[test]
    fn run_aggregates_feedback_per_character_in_order() {
        let (mut sheets, ids) = setup(&["Abel", "Brutus"]);
        let specs = specs(&["hp|5"]);
        let attrs = resolve(&mut sheets, &ids, &specs, true, false);
        let opts = Opts::default();

        let messages = BatchRun::new(&ids).run(&mut sheets, &specs, &attrs, &opts, "GM");
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].paragraphs[0],
            "Setting hp to 5 for character Abel.\nSetting hp to 5 for character Brutus."
        );
    }

    #[test]
    fn run_emits_error_panel_before_feedback() {
        let (mut sheets, ids) = setup(&["Abel"]);
        let attr_id = sheets.create_attr(ids[0], "hp");
        sheets.attr_mut(attr_id).unwrap().set(Field::Current, "high");

        let specs = specs(&["hp|3"]);
        let attrs = resolve(&mut sheets, &ids, &specs, true, false);
        let opts = Opts {
            modify: true,
            ..Opts::default()
        };

        let messages = BatchRun::new(&ids).run(&mut sheets, &specs, &attrs, &opts, "GM");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].title, "Errors");
        assert_eq!(messages[1].title, "Setting attributes");
    }

    #[test]
    fn silent_run_suppresses_feedback_but_not_errors() {
        let (mut sheets, ids) = setup(&["Abel"]);
        let attr_id = sheets.create_attr(ids[0], "hp");
        sheets.attr_mut(attr_id).unwrap().set(Field::Current, "high");

        let specs = specs(&["hp|3"]);
        let attrs = resolve(&mut sheets, &ids, &specs, true, false);
        let opts = Opts {
            modify: true,
            silent: true,
            ..Opts::default()
        };

        let messages = BatchRun::new(&ids).run(&mut sheets, &specs, &attrs, &opts, "GM");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].title, "Errors");
    }

    #[test]
    fn delete_removes_rows_and_reports_logical_names() {
        let (mut sheets, ids) = setup(&["Abel"]);
        sheets.create_attr(ids[0], "HP");
        sheets.create_attr(ids[0], "mana");

        let specs = specs(&["hp", "mana"]);
        let attrs = resolve(&mut sheets, &ids, &specs, false, true);
        let message = delete_attributes(&mut sheets, &ids, &specs, &attrs, &Opts::default(), "GM").unwrap();

        assert_eq!(sheets.attrs_of(ids[0]).count(), 0);
        assert_eq!(
            message.paragraphs,
            vec!["Deleting attribute(s) hp, mana for character Abel."]
        );
    }

    #[test]
    fn delete_omits_characters_with_no_matches() {
        let (mut sheets, ids) = setup(&["Abel", "Brutus"]);
        sheets.create_attr(ids[0], "hp");

        let specs = specs(&["hp"]);
        let attrs = resolve(&mut sheets, &ids, &specs, false, true);
        let message = delete_attributes(&mut sheets, &ids, &specs, &attrs, &Opts::default(), "GM").unwrap();

        assert_eq!(message.paragraphs.len(), 1);
        assert!(message.paragraphs[0].contains("Abel"));
    }

    #[test]
    fn delete_with_nothing_matching_says_nothing_to_do() {
        let (mut sheets, ids) = setup(&["Abel"]);
        let specs = specs(&["hp"]);
        let attrs = resolve(&mut sheets, &ids, &specs, false, true);
        let message = delete_attributes(&mut sheets, &ids, &specs, &attrs, &Opts::default(), "GM").unwrap();
        assert_eq!(message.paragraphs, vec!["Nothing to do."]);
    }

    #[test]
    fn silent_delete_sends_nothing() {
        let (mut sheets, ids) = setup(&["Abel"]);
        sheets.create_attr(ids[0], "hp");
        let specs = specs(&["hp"]);
        let attrs = resolve(&mut sheets, &ids, &specs, false, true);
        let opts = Opts {
            silent: true,
            ..Opts::default()
        };
        assert!(delete_attributes(&mut sheets, &ids, &specs, &attrs, &opts, "GM").is_none());
        assert_eq!(sheets.attrs_of(ids[0]).count(), 0);
    }
}
