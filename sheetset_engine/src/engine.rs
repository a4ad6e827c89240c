//! Top-level command flow for `!setattr` / `!delattr`.
//!
//! Validates the request, builds the permission-filtered character list,
//! parses specifiers, resolves every attribute eagerly, then hands off to
//! the batch runner (set) or the synchronous delete pass. All outgoing
//! panels land in the caller's [`Outbox`].

use log::info;
use uuid::Uuid;

use crate::batch::{BatchRun, delete_attributes};
use crate::character::Actor;
use crate::opts::{Opts, parse_opts};
use crate::report::{CmdError, Message, Outbox};
use crate::resolve::{ResolvePolicy, resolve_all};
use crate::sheets::Sheets;
use crate::specifier::parse_specifiers;

/// Whether a command sets or deletes attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    Set,
    Delete,
}

/// Run one chat command body against the store.
///
/// `content` is the full command text, command word included. Fatal
/// conditions (no targets, no specifiers, `--evaluate` without privilege)
/// abort before any mutation; everything else degrades to per-item errors in
/// the final panels.
pub fn run_chat_command(sheets: &mut Sheets, actor: &Actor, content: &str, mode: CommandMode, outbox: &mut Outbox) {
    let who = actor.display_name();
    let mut errors: Vec<CmdError> = Vec::new();

    let (opts, tokens) = parse_opts(content);
    let specs = parse_specifiers(&tokens, opts.replace);

    if opts.evaluate && !actor.is_gm {
        errors.push(CmdError::EvaluateRequiresGm);
        if let Some(message) = Message::errors(&who, &mut errors) {
            outbox.push(message);
        }
        return;
    }

    let characters = build_character_list(sheets, actor, &opts, &mut errors);
    if characters.is_empty() {
        errors.push(CmdError::NoTargets);
    }
    if specs.is_empty() {
        errors.push(CmdError::NoAttributes);
    }

    let policy = ResolvePolicy {
        create_missing: !opts.nocreate && mode == CommandMode::Set,
        fail_silently: mode == CommandMode::Delete,
    };
    let attrs = resolve_all(sheets, &characters, &specs, policy, &mut errors);
    if let Some(message) = Message::errors(&who, &mut errors) {
        outbox.push(message);
    }

    if characters.is_empty() || specs.is_empty() {
        return;
    }
    info!(
        "{} {} specifier(s) for {} character(s)",
        if mode == CommandMode::Set { "setting" } else { "deleting" },
        specs.len(),
        characters.len()
    );
    match mode {
        CommandMode::Delete => {
            if let Some(message) = delete_attributes(sheets, &characters, &specs, &attrs, &opts, &who) {
                outbox.push(message);
            }
        },
        CommandMode::Set => {
            for message in BatchRun::new(&characters).run(sheets, &specs, &attrs, &opts, &who) {
                outbox.push(message);
            }
        },
    }
}

/// Build the permission-filtered list of target character ids from the
/// targeting options, in option-precedence order.
fn build_character_list(sheets: &Sheets, actor: &Actor, opts: &Opts, errors: &mut Vec<CmdError>) -> Vec<Uuid> {
    if opts.all && actor.is_gm {
        return sheets.all_character_ids();
    }
    if opts.allgm && actor.is_gm {
        return sheets.gm_only_character_ids();
    }
    if let Some(raw) = &opts.charid {
        let mut ids = Vec::new();
        for piece in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match piece.parse::<Uuid>() {
                Ok(id) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                },
                Err(_) => errors.push(CmdError::InvalidCharacterId(piece.to_string())),
            }
        }
        return sheets.check_permissions(ids, actor, errors);
    }
    if let Some(raw) = &opts.name {
        let mut ids = Vec::new();
        for piece in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match sheets.find_character_by_name(piece) {
                Some(id) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                },
                None => errors.push(CmdError::UnknownCharacterName(piece.to_string())),
            }
        }
        return sheets.check_permissions(ids, actor, errors);
    }
    errors.push(CmdError::NoTargetOption);
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Character, Controller, Field};

    fn gm() -> Actor {
        Actor::new("Gail (GM)", true)
    }

    fn setup(names: &[&str]) -> (Sheets, Vec<Uuid>) {
        let mut sheets = Sheets::new_empty();
        let ids = names
            .iter()
            .map(|n| sheets.add_character(Character::new(n)))
            .collect();
        (sheets, ids)
    }

    fn run(sheets: &mut Sheets, actor: &Actor, content: &str, mode: CommandMode) -> Vec<Message> {
        let mut outbox = Outbox::new();
        run_chat_command(sheets, actor, content, mode, &mut outbox);
        outbox.drain()
    }

    #[test]
    fn end_to_end_set_creates_and_reports() {
        let (mut sheets, ids) = setup(&["Brutus"]);
        let messages = run(&mut sheets, &gm(), "!setattr --name Brutus --hp|5 --hp||20", CommandMode::Set);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to, "Gail");
        assert_eq!(messages[0].paragraphs[0], "Setting hp to 5 / 20 for character Brutus.");
        let attr = sheets.attrs_of(ids[0]).next().unwrap();
        assert_eq!((attr.current.as_str(), attr.max.as_str()), ("5", "20"));
    }

    #[test]
    fn missing_target_option_is_fatal() {
        let (mut sheets, ids) = setup(&["Brutus"]);
        let messages = run(&mut sheets, &gm(), "!setattr --hp|5", CommandMode::Set);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].title, "Errors");
        assert!(
            messages[0]
                .paragraphs
                .contains(&"You need to supply one of --all, --allgm, --charid, or --name.".to_string())
        );
        assert!(messages[0].paragraphs.contains(&"No target characters.".to_string()));
        assert_eq!(sheets.attrs_of(ids[0]).count(), 0);
    }

    #[test]
    fn no_specifiers_is_fatal() {
        let (mut sheets, ids) = setup(&["Brutus"]);
        let messages = run(&mut sheets, &gm(), "!setattr --name Brutus", CommandMode::Set);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].paragraphs.contains(&"No attributes supplied.".to_string()));
        assert_eq!(sheets.attrs_of(ids[0]).count(), 0);
    }

    #[test]
    fn evaluate_requires_gm_and_aborts_everything() {
        let (mut sheets, ids) = setup(&["Brutus"]);
        sheets
            .characters
            .get_mut(&ids[0])
            .unwrap()
            .controlled_by
            .push(Controller::All);
        let player = Actor::new("Pat", false);

        let messages = run(&mut sheets, &player, "!setattr --name Brutus --evaluate --hp|2+2", CommandMode::Set);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].paragraphs,
            vec!["The --evaluate option is only available to the GM."]
        );
        assert_eq!(sheets.attrs_of(ids[0]).count(), 0);
    }

    #[test]
    fn all_targets_every_character_for_gm_only() {
        let (mut sheets, _) = setup(&["Abel", "Brutus"]);
        let messages = run(&mut sheets, &gm(), "!setattr --all --hp|1", CommandMode::Set);
        assert_eq!(
            messages[0].paragraphs[0],
            "Setting hp to 1 for character Abel.\nSetting hp to 1 for character Brutus."
        );

        let player = Actor::new("Pat", false);
        let messages = run(&mut sheets, &player, "!setattr --all --hp|1", CommandMode::Set);
        assert_eq!(messages[0].title, "Errors");
    }

    #[test]
    fn allgm_targets_only_uncontrolled_characters() {
        let (mut sheets, ids) = setup(&["Abel", "Brutus"]);
        sheets
            .characters
            .get_mut(&ids[0])
            .unwrap()
            .controlled_by
            .push(Controller::All);

        let messages = run(&mut sheets, &gm(), "!setattr --allgm --hp|1", CommandMode::Set);
        assert_eq!(messages[0].paragraphs[0], "Setting hp to 1 for character Brutus.");
    }

    #[test]
    fn charid_targeting_accepts_comma_separated_ids() {
        let (mut sheets, ids) = setup(&["Abel", "Brutus"]);
        let content = format!("!setattr --charid {}, {} --hp|1", ids[0], ids[1]);
        let messages = run(&mut sheets, &gm(), &content, CommandMode::Set);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].paragraphs[0].lines().count(), 2);
    }

    #[test]
    fn bad_charid_reports_but_good_ones_proceed() {
        let (mut sheets, ids) = setup(&["Abel"]);
        let content = format!("!setattr --charid not-a-uuid,{} --hp|1", ids[0]);
        let messages = run(&mut sheets, &gm(), &content, CommandMode::Set);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].paragraphs, vec!["Invalid character id not-a-uuid."]);
        assert_eq!(messages[1].paragraphs[0], "Setting hp to 1 for character Abel.");
    }

    #[test]
    fn permission_filtered_characters_are_skipped_with_error() {
        let (mut sheets, ids) = setup(&["Abel", "Brutus"]);
        let player = Actor::new("Pat", false);
        sheets
            .characters
            .get_mut(&ids[0])
            .unwrap()
            .controlled_by
            .push(Controller::Player(player.id));

        let messages = run(&mut sheets, &player, "!setattr --name Abel, Brutus --hp|1", CommandMode::Set);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].paragraphs, vec!["Permission error for character Brutus."]);
        assert_eq!(messages[1].paragraphs[0], "Setting hp to 1 for character Abel.");
    }

    #[test]
    fn unknown_name_reported_alongside_results() {
        let (mut sheets, _) = setup(&["Abel"]);
        let messages = run(&mut sheets, &gm(), "!setattr --name Abel,Nobody --hp|1", CommandMode::Set);
        assert_eq!(messages[0].paragraphs, vec!["No character named Nobody found."]);
    }

    #[test]
    fn nocreate_reports_missing_instead_of_creating() {
        let (mut sheets, ids) = setup(&["Abel"]);
        let messages = run(&mut sheets, &gm(), "!setattr --name Abel --nocreate --hp|5", CommandMode::Set);
        assert_eq!(messages[0].paragraphs, vec!["Missing attribute hp not created for character Abel."]);
        assert_eq!(sheets.attrs_of(ids[0]).count(), 0);
    }

    #[test]
    fn delete_flow_removes_and_reports() {
        let (mut sheets, ids) = setup(&["Abel"]);
        let hp = sheets.create_attr(ids[0], "hp");
        sheets.attr_mut(hp).unwrap().set(Field::Current, "5");

        let messages = run(&mut sheets, &gm(), "!delattr --name Abel --hp --mana", CommandMode::Delete);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].title, "Deleting attributes");
        assert_eq!(messages[0].paragraphs, vec!["Deleting attribute(s) hp for character Abel."]);
        assert_eq!(sheets.attrs_of(ids[0]).count(), 0);
    }

    #[test]
    fn silent_set_reports_errors_only() {
        let (mut sheets, _) = setup(&["Abel"]);
        let messages = run(&mut sheets, &gm(), "!setattr --name Abel --silent --hp|5", CommandMode::Set);
        assert!(messages.is_empty());
    }
}
