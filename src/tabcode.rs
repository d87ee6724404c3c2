//! # Event Data Model
//!
//! Types for the parsed TabCode event stream.
//!
//! ## Type Hierarchy
//! ```text
//! Event (enum, one variant per event kind)
//!   ├── Comment
//!   ├── PageBreak / SystemBreak   (1-based counters)
//!   ├── Barline                   (six independent style flags)
//!   ├── Metre                     (components + vertical separator)
//!   ├── Ruleset                   (notation-wide configuration block)
//!   ├── Rest                      (explicit rhythm flag, no pitches)
//!   └── Chord
//!         ├── duration: Option<Duration>  (explicit or carried forward)
//!         ├── main_courses: Vec<Note>
//!         └── bass_courses: Vec<Note>
//!
//! Note
//!   ├── pitch: Pitch         (fret, course, resolving ruleset)
//!   ├── fingering: Option<Fingering>
//!   ├── ornament: Option<Ornament>
//!   └── line: Option<Line>   (may carry a consumed course reference)
//! ```
//!
//! Every type keeps the raw text it was parsed from in its `code`
//! field, so a serialised event stream can always be traced back to
//! the exact input characters that produced it.

use std::rc::Rc;

use serde::Serialize;

use crate::base::flag_duration;
use crate::rules::{FretGlyph, Ruleset};

/// A parsed TabCode event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    Comment {
        code: String,
    },
    PageBreak {
        code: String,
        page_num: usize,
    },
    SystemBreak {
        code: String,
        sys_num: usize,
    },
    Barline {
        code: String,
        bar_num: usize,
        flags: BarlineFlags,
    },
    Metre {
        code: String,
        components: Vec<String>,
        vertical: bool,
    },
    Ruleset(Ruleset),
    Rest {
        duration: Duration,
    },
    Chord {
        duration: Option<Duration>,
        main_courses: Vec<Note>,
        bass_courses: Vec<Note>,
    },
}

/// Barline styles. Not mutually exclusive: a bar can be, say, both
/// double and left-repeating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BarlineFlags {
    pub double_bar: bool,
    pub l_repeat: bool,
    pub r_repeat: bool,
    pub dashed: bool,
    pub non_counting: bool,
    pub mid_dots: bool,
}

/// A rhythm flag: one duration letter with an optional dot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Duration {
    pub code: String,
}

impl Duration {
    pub fn new(code: &str) -> Self {
        Duration {
            code: code.to_string(),
        }
    }

    pub fn flag(&self) -> Option<char> {
        self.code.chars().next()
    }

    pub fn dotted(&self) -> bool {
        self.code.ends_with('.')
    }

    /// Length in crotchet multiples, if the flag letter is valid.
    pub fn crotchets(&self) -> Option<f64> {
        let base = flag_duration(self.flag()?)?;
        Some(if self.dotted() { base * 1.5 } else { base })
    }
}

/// One sounding note, on either a main or a bass course. Which of the
/// two it is follows from the chord list that owns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub pitch: Pitch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingering: Option<Fingering>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ornament: Option<Ornament>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

impl Note {
    pub fn new(pitch: Pitch) -> Self {
        Note {
            pitch,
            fingering: None,
            ornament: None,
            line: None,
        }
    }
}

/// A fret/course location, together with the ruleset that was active
/// when it was read. The ruleset decides how the fret symbol resolves
/// in the Italian dialect; it is deliberately left out of the
/// serialised form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pitch {
    pub code: String,
    pub fret: char,
    pub course: u8,
    #[serde(skip_serializing)]
    pub ruleset: Option<Rc<Ruleset>>,
}

impl Pitch {
    pub fn new(code: &str, fret: char, course: u8, ruleset: Option<Rc<Ruleset>>) -> Self {
        Pitch {
            code: code.to_string(),
            fret,
            course,
            ruleset,
        }
    }

    /// Resolve the fret symbol through the active ruleset's notation
    /// dialect. Without a ruleset the letter stays opaque.
    pub fn fret_glyph(&self) -> FretGlyph {
        match &self.ruleset {
            Some(ruleset) => ruleset.tab_char(self.fret),
            None => FretGlyph::Letter(self.fret),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fingering {
    pub code: String,
}

impl Fingering {
    pub fn new(code: &str) -> Self {
        Fingering {
            code: code.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ornament {
    pub code: String,
}

impl Ornament {
    pub fn new(code: &str) -> Self {
        Ornament {
            code: code.to_string(),
        }
    }
}

/// A connecting-line annotation. When the line resolves an earlier
/// course reference, the consumed reference travels with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_ref: Option<MainCourseRef>,
}

impl Line {
    pub fn new(code: &str, course_ref: Option<MainCourseRef>) -> Self {
        Line {
            code: code.to_string(),
            course_ref,
        }
    }
}

/// A pitch slot naming a course without a fret letter; resolved by the
/// next line annotation in the same tab word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainCourseRef {
    pub code: String,
    pub course: u8,
}

impl MainCourseRef {
    pub fn new(code: &str, course: u8) -> Self {
        MainCourseRef {
            code: code.to_string(),
            course,
        }
    }
}
