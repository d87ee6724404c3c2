//! Ruleset parsing and the tuning engine.
//!
//! A ruleset token embeds a `<rules>…</rules>` markup block that can
//! redefine notation-wide configuration mid-piece: the notation
//! dialect, the reference pitch of the first course, and main/bass
//! tuning overrides (named or listed as interval sequences). Rulesets
//! inherit: a new block starts from the previously active one and
//! overwrites only the fields it names.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::base::{DEFAULT_FULL_TUNING, DEFAULT_PITCH};
use crate::error::TabError;

/// Main-tuning interval tables, keyed by conventional name. Each entry
/// lists the downward interval from one course to the next.
fn named_tuning(name: &str) -> Option<&'static [i32]> {
    match name {
        "renaissance" => Some(&[5, 5, 4, 5, 5]),
        "baroque" => Some(&[3, 5, 4, 3, 5]),
        "harpway-sarabande" => Some(&[5, 3, 4, 5, 5]),
        "gaultier" => Some(&[4, 3, 4, 5, 5]),
        "harpway-flat" => Some(&[5, 4, 3, 5, 5]),
        "french-flat" => Some(&[3, 4, 3, 5, 5]),
        "cordes-avallee" => Some(&[5, 4, 5, 7, 5]),
        _ => None,
    }
}

fn named_bass_tuning(name: &str) -> Option<&'static [i32]> {
    match name {
        "renaissance_minor8" => Some(&[2, 3]),
        "baroque" => Some(&[3, 5, 4, 3, 5]),
        _ => None,
    }
}

/// Notation dialect. Anything that is not Italian behaves as French.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Notation {
    #[default]
    French,
    Italian,
}

impl Notation {
    fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("italian") {
            Notation::Italian
        } else {
            Notation::French
        }
    }
}

/// A fret symbol after notation-dialect resolution: an opaque letter
/// in French notation, a 0-based position in Italian notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FretGlyph {
    Letter(char),
    Position(u8),
}

/// The closed set of recognised rule fields. Unknown markup keys are
/// dropped at parse time rather than carried as an open dictionary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFields {
    pub notation: Notation,
    pub pitch: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuning_named: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bass_tuning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bass_tuning_named: Option<String>,
}

impl Default for RuleFields {
    fn default() -> Self {
        RuleFields {
            notation: Notation::French,
            pitch: DEFAULT_PITCH,
            tuning: None,
            tuning_named: None,
            bass_tuning: None,
            bass_tuning_named: None,
        }
    }
}

/// An immutable, inheritable configuration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ruleset {
    pub code: String,
    pub fields: RuleFields,
}

/// Parse a ruleset token's embedded markup, merging the extracted
/// fields over the inherited ruleset (or the built-in defaults).
pub fn parse_ruleset(code: &str, parent: Option<&Ruleset>) -> Result<Ruleset, TabError> {
    // The markup is case-insensitive; normalise before reading.
    let lowered = code.to_lowercase();
    let start = lowered
        .find("<rules>")
        .ok_or_else(|| TabError::grammar("Invalid ruleset markup", Some(code)))?;
    let end = lowered
        .rfind("</rules>")
        .filter(|&end| end >= start)
        .ok_or_else(|| TabError::grammar("Invalid ruleset markup", Some(code)))?;
    let markup = &lowered[start..end + "</rules>".len()];
    let document = roxmltree::Document::parse(markup)
        .map_err(|e| TabError::grammar(&format!("Invalid ruleset markup ({e})"), Some(code)))?;

    let mut fields = parent
        .map(|p| p.fields.clone())
        .unwrap_or_default();

    for node in document.root_element().children() {
        if !node.is_element() {
            continue;
        }
        let text = node.text().unwrap_or("").trim();
        match node.tag_name().name() {
            "notation" => fields.notation = Notation::from_name(text),
            "pitch" => {
                fields.pitch = text.parse().map_err(|_| {
                    TabError::grammar("Invalid pitch rule", Some(text))
                })?;
            }
            "tuning" => fields.tuning = Some(text.to_string()),
            "tuning_named" => fields.tuning_named = Some(text.to_string()),
            "bass_tuning" => fields.bass_tuning = Some(text.to_string()),
            "bass_tuning_named" => fields.bass_tuning_named = Some(text.to_string()),
            _ => {}
        }
    }

    Ok(Ruleset {
        code: code.to_string(),
        fields,
    })
}

impl Ruleset {
    /// Absolute pitch of every course, main and bass, derived from the
    /// resolved fields. Pure: recomputed on demand, never cached.
    ///
    /// Resolution order matters: the pitch rebase runs first, then the
    /// main-tuning override, then the bass-tuning override, because
    /// the bass walk anchors on the possibly-retuned course values.
    pub fn full_tuning(&self) -> [i32; 13] {
        let mut tuning = DEFAULT_FULL_TUNING;
        let shift = self.fields.pitch - DEFAULT_FULL_TUNING[0];
        for value in &mut tuning {
            *value = (*value + shift).max(0);
        }

        if let Some(name) = &self.fields.tuning_named {
            if let Some(intervals) = named_tuning(name) {
                retune_named(&mut tuning, 0, intervals);
            }
        } else if let Some(list) = &self.fields.tuning {
            retune_listed(&mut tuning, 0, &signed_numbers(list));
        }

        if let Some(name) = &self.fields.bass_tuning_named {
            if let Some(intervals) = named_bass_tuning(name) {
                retune_named(&mut tuning, 6, intervals);
            }
        } else if let Some(list) = &self.fields.bass_tuning {
            retune_listed_bass(&mut tuning, 6, &signed_numbers(list));
        }

        tuning
    }

    /// Resolve a fret symbol for this ruleset's notation dialect.
    pub fn tab_char(&self, fret: char) -> FretGlyph {
        match self.fields.notation {
            Notation::Italian => match crate::base::letter_pitch(fret) {
                Some(position) => FretGlyph::Position(position),
                None => FretGlyph::Letter(fret),
            },
            Notation::French => FretGlyph::Letter(fret),
        }
    }
}

/// Rewrite the courses following `anchor_index` from cumulative
/// interval offsets, anchored on the course at `anchor_index` itself.
fn retune_named(tuning: &mut [i32; 13], anchor_index: usize, intervals: &[i32]) {
    let anchor = tuning[anchor_index];
    let mut offset = 0;
    for (step, interval) in intervals.iter().enumerate() {
        let index = anchor_index + step + 1;
        if index >= tuning.len() {
            break;
        }
        offset += interval;
        tuning[index] = (anchor - offset).max(0);
    }
}

/// Walk outward from `base_index`, deriving each course from the
/// previous already-retuned course plus the next interval.
fn retune_listed(tuning: &mut [i32; 13], base_index: usize, intervals: &[i32]) {
    for (step, interval) in intervals.iter().enumerate() {
        let index = base_index + step + 1;
        if index >= tuning.len() {
            break;
        }
        tuning[index] = (tuning[index - 1] + interval).max(0);
    }
}

/// The bass variant of the listed walk writes one course earlier than
/// the interval list's own indexing, so the first interval derives the
/// course AT `base_index` from the course before it. Asymmetric with
/// the main walk on purpose; see DESIGN.md.
fn retune_listed_bass(tuning: &mut [i32; 13], base_index: usize, intervals: &[i32]) {
    for (step, interval) in intervals.iter().enumerate() {
        let index = base_index + step;
        if index == 0 || index >= tuning.len() {
            break;
        }
        tuning[index] = (tuning[index - 1] + interval).max(0);
    }
}

static SIGNED_NUMBERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?[0-9]+").expect("invalid number pattern"));

/// Extract every signed integer from a listed-tuning string such as
/// `(-5 -5 -4 -5 -5 -2 -1 -2 -2 -1 -2)`.
fn signed_numbers(list: &str) -> Vec<i32> {
    SIGNED_NUMBERS
        .find_iter(list)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}
