//! Chat-command option parsing.
//!
//! Command bodies look like `!setattr --name Brutus --mod --hp|3`: segments
//! are separated by ` --`, recognized segment names become option flags
//! (`charid` and `name` carry a value after the first whitespace), and every
//! unrecognized segment is an attribute specifier token passed on to the
//! name parser verbatim.

/// Recognized boolean flags.
const FLAG_OPTS: &[&str] = &[
    "all", "allgm", "silent", "sel", "replace", "nocreate", "mod", "modb", "evaluate",
];

/// Recognized value-carrying flags.
const VALUE_OPTS: &[&str] = &["charid", "name"];

/// Parsed options for one command. Everything defaults to off/absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opts {
    /// Target every character (GM only).
    pub all: bool,
    /// Target every character with no controller (GM only).
    pub allgm: bool,
    /// Comma-separated character id list.
    pub charid: Option<String>,
    /// Comma-separated character name list.
    pub name: Option<String>,
    /// Suppress the success-feedback panel.
    pub silent: bool,
    /// Apply the character-replacement table on parse and feedback.
    pub replace: bool,
    /// Never create missing attributes.
    pub nocreate: bool,
    /// Treat values as numeric deltas (`--mod`).
    pub modify: bool,
    /// Treat values as numeric deltas clamped to `[0, max]` (`--modb`).
    pub modify_clamped: bool,
    /// Run values through the expression evaluator (GM only).
    pub evaluate: bool,
    /// Token-selection targeting; accepted so it never becomes a specifier,
    /// but this host has no selection concept and treats it as unset.
    pub sel: bool,
}

/// Split a command body into options and raw specifier tokens.
///
/// The first ` --`-separated segment is the command word itself and is
/// skipped.
pub fn parse_opts(content: &str) -> (Opts, Vec<String>) {
    let mut opts = Opts::default();
    let mut tokens = Vec::new();

    for segment in split_segments(content).into_iter().skip(1) {
        let (head, rest) = match segment.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, Some(rest.trim().to_string())),
            None => (segment.as_str(), None),
        };
        if VALUE_OPTS.contains(&head) {
            match head {
                "charid" => opts.charid = rest.filter(|v| !v.is_empty()),
                "name" => opts.name = rest.filter(|v| !v.is_empty()),
                _ => unreachable!(),
            }
        } else if rest.is_none() && FLAG_OPTS.contains(&head) {
            match head {
                "all" => opts.all = true,
                "allgm" => opts.allgm = true,
                "silent" => opts.silent = true,
                "sel" => opts.sel = true,
                "replace" => opts.replace = true,
                "nocreate" => opts.nocreate = true,
                "mod" => opts.modify = true,
                "modb" => opts.modify_clamped = true,
                "evaluate" => opts.evaluate = true,
                _ => unreachable!(),
            }
        } else {
            tokens.push(segment);
        }
    }
    (opts, tokens)
}

/// Split on ` --` boundaries, trimming trailing whitespace from each
/// segment.
fn split_segments(content: &str) -> Vec<String> {
    content
        .trim_end()
        .split(" --")
        .map(|s| s.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_and_values_parse() {
        let (opts, tokens) = parse_opts("!setattr --name Brutus --mod --silent --hp|3");
        assert_eq!(opts.name.as_deref(), Some("Brutus"));
        assert!(opts.modify);
        assert!(opts.silent);
        assert!(!opts.modify_clamped);
        assert_eq!(tokens, vec!["hp|3"]);
    }

    #[test]
    fn value_flags_keep_internal_whitespace() {
        let (opts, _) = parse_opts("!setattr --name Marcus Junius Brutus --hp|1");
        assert_eq!(opts.name.as_deref(), Some("Marcus Junius Brutus"));
    }

    #[test]
    fn value_flag_without_value_stays_unset() {
        let (opts, _) = parse_opts("!setattr --charid --hp|1");
        assert_eq!(opts.charid, None);
    }

    #[test]
    fn unrecognized_segments_become_specifier_tokens() {
        let (opts, tokens) = parse_opts("!setattr --all --hp|5|20 --strength|18");
        assert!(opts.all);
        assert_eq!(tokens, vec!["hp|5|20", "strength|18"]);
    }

    #[test]
    fn specifier_tokens_may_contain_spaces() {
        let (_, tokens) = parse_opts("!setattr --all --title|'Grand Vizier'");
        assert_eq!(tokens, vec!["title|'Grand Vizier'"]);
    }

    #[test]
    fn flag_name_with_trailing_text_is_a_specifier() {
        // "mod" alone is a flag; "mod other" is not a recognized value flag
        let (opts, tokens) = parse_opts("!setattr --all --mod other");
        assert!(!opts.modify);
        assert_eq!(tokens, vec!["mod other"]);
    }

    #[test]
    fn command_word_is_skipped() {
        let (opts, tokens) = parse_opts("!delattr --name Brutus --hp");
        assert_eq!(opts.name.as_deref(), Some("Brutus"));
        assert_eq!(tokens, vec!["hp"]);
    }

    #[test]
    fn sel_is_consumed_but_not_a_specifier() {
        let (opts, tokens) = parse_opts("!setattr --sel --hp|1");
        assert!(opts.sel);
        assert_eq!(tokens, vec!["hp|1"]);
    }
}
