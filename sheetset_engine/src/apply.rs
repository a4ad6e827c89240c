//! Applying resolved value specs to one character's attributes.
//!
//! Per specifier, in order: placeholder fill-in, optional expression
//! evaluation, mod / clamped-mod reinterpretation, then the write. Failures
//! affect only the field they occur on; everything else in the batch
//! proceeds. Feedback is accumulated as one human-readable line per
//! character.

use log::debug;
use regex::Captures;
use uuid::Uuid;

use crate::character::Field;
use crate::eval;
use crate::opts::Opts;
use crate::report::CmdError;
use crate::sheets::Sheets;
use crate::specifier::{FILL_IN_RE, SpecifierSet, ValueSpec, replace_outbound};

/// Upper bound on full placeholder expansion passes. Substituted text can
/// itself introduce placeholders; a self-referential chain would otherwise
/// loop forever. Each pass expands every placeholder present, so the cap
/// never limits how many placeholders one value may carry.
pub const FILL_IN_LIMIT: usize = 16;

/// Marker shown in feedback for a field that was set to the empty string.
const EMPTY_MARKER: &str = "(empty)";

/// Apply every resolved specifier to one character, appending feedback and
/// errors. Exactly one feedback line is produced per call.
pub fn apply_to_character(
    sheets: &mut Sheets,
    char_id: Uuid,
    specs: &SpecifierSet,
    resolved: &std::collections::HashMap<String, Uuid>,
    opts: &Opts,
    errors: &mut Vec<CmdError>,
    feedback: &mut Vec<String>,
) {
    let character_name = sheets.character_name(char_id);
    let mut touched: Vec<(String, String)> = Vec::new();

    for (logical, spec) in specs.entries() {
        let Some(&attr_id) = resolved.get(logical) else {
            continue; // resolution failed earlier; error already recorded
        };

        let mut new_values = spec.clone();

        if specs.needs_fill_in(logical) {
            for field in new_values.fields() {
                let text = new_values.get(field).unwrap_or_default();
                let (expanded, hit_limit) = fill_in_values(sheets, char_id, text);
                if hit_limit {
                    errors.push(CmdError::FillInLimitExceeded(logical.to_string()));
                }
                new_values.set(field, expanded);
            }
        }

        if opts.evaluate {
            evaluate_fields(&mut new_values, errors);
        }

        if opts.modify || opts.modify_clamped {
            apply_mod(sheets, attr_id, logical, &character_name, &mut new_values, opts, errors);
        }

        if let Some(attr) = sheets.attr_mut(attr_id) {
            for field in new_values.fields() {
                attr.set(field, new_values.get(field).unwrap_or_default());
            }
        }
        debug!("set {logical} on {character_name}: {new_values:?}");

        if let Some(line) = feedback_value_line(&new_values, opts.replace) {
            touched.push((logical.to_string(), line));
        }
    }

    if touched.is_empty() {
        feedback.push(format!("Nothing to do for character {character_name}."));
    } else {
        let names: Vec<&str> = touched.iter().map(|(name, _)| name.as_str()).collect();
        let values: Vec<&str> = touched.iter().map(|(_, value)| value.as_str()).collect();
        feedback.push(format!(
            "Setting {} to {} for character {character_name}.",
            names.join(", "),
            values.join(", ")
        ));
    }
}

/// Expand `%name%` / `%name_max%` placeholders against the same character,
/// substituting the empty string for anything unresolvable. Returns the
/// expanded text and whether the expansion limit was hit.
pub fn fill_in_values(sheets: &Sheets, char_id: Uuid, text: &str) -> (String, bool) {
    let mut expanded = text.to_string();
    for _ in 0..FILL_IN_LIMIT {
        if !FILL_IN_RE.is_match(&expanded) {
            return (expanded, false);
        }
        // one pass expands every placeholder currently present
        expanded = FILL_IN_RE
            .replace_all(&expanded, |caps: &Captures<'_>| {
                let field = if caps.get(2).is_some() { Field::Max } else { Field::Current };
                sheets
                    .resolve_named_value(char_id, &caps[1], field)
                    .unwrap_or_default()
            })
            .into_owned();
    }
    let hit_limit = FILL_IN_RE.is_match(&expanded);
    (expanded, hit_limit)
}

/// Run each present field through the arithmetic evaluator. Numeric results
/// replace the text; evaluator failures leave the text unmodified and are
/// recorded at most once per specifier. Blank text is passed through
/// untouched.
fn evaluate_fields(values: &mut ValueSpec, errors: &mut Vec<CmdError>) {
    let mut reported = false;
    for field in values.fields() {
        let text = values.get(field).unwrap_or_default().to_string();
        if text.trim().is_empty() {
            continue;
        }
        match eval::evaluate(&text) {
            Ok(number) if number.is_finite() => values.set(field, eval::format_number(number)),
            Ok(_) => {},
            Err(err) => {
                if !reported {
                    errors.push(CmdError::EvaluateFailed(err.to_string()));
                    reported = true;
                }
            },
        }
    }
}

/// Reinterpret field values as numeric deltas against the stored values.
/// Non-numeric operands drop the field from the update and record an error;
/// in clamped mode the `current` result is bounded to `[0, stored max]`.
fn apply_mod(
    sheets: &Sheets,
    attr_id: Uuid,
    logical: &str,
    character_name: &str,
    values: &mut ValueSpec,
    opts: &Opts,
    errors: &mut Vec<CmdError>,
) {
    let Some(attr) = sheets.attr(attr_id) else {
        return;
    };
    for field in values.fields() {
        let delta = values.get(field).unwrap_or_default();
        let stored = attr.get(field);
        let modded = parse_numeric(delta).and_then(|d| Some(d + parse_numeric_or_zero(stored)?));
        match modded {
            Some(mut result) => {
                if opts.modify_clamped && field == Field::Current {
                    let upper = parse_numeric(attr.get(Field::Max)).unwrap_or(f64::INFINITY);
                    result = result.max(0.0).min(upper);
                }
                values.set(field, eval::format_number(result));
            },
            None => {
                values.clear(field);
                errors.push(CmdError::NotNumberValued {
                    prefix: field.error_prefix(),
                    name: logical.to_string(),
                    character: character_name.to_string(),
                });
            },
        }
    }
}

fn parse_numeric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Missing stored values count as zero; non-numeric stored values fail the
/// whole field.
fn parse_numeric_or_zero(text: &str) -> Option<f64> {
    if text.trim().is_empty() {
        Some(0.0)
    } else {
        parse_numeric(text)
    }
}

/// Feedback rendering for one specifier's final values. `None` when neither
/// field survived to the write.
fn feedback_value_line(values: &ValueSpec, replace: bool) -> Option<String> {
    let show = |v: &str| {
        if v.is_empty() {
            EMPTY_MARKER.to_string()
        } else if replace {
            replace_outbound(v)
        } else {
            v.to_string()
        }
    };
    match (&values.current, &values.max) {
        (Some(current), Some(max)) => Some(format!("{} / {}", show(current), show(max))),
        (Some(current), None) => Some(show(current)),
        (None, Some(max)) => Some(format!("{} (max)", show(max))),
        (None, None) => None,
    }
}
