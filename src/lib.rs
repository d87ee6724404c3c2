//! # parsetab
//!
//! A parser for TabCode, an ASCII encoding of historical lute
//! tablature. The library turns TabCode text into an ordered sequence
//! of musical events: chords, rests, barlines, metre changes,
//! page/system breaks, comments and tuning rulesets.
//!
//! ## Pipeline
//! 1. [`lexer::Scanner`] tokenises the input with priority-ordered
//!    pattern matching.
//! 2. [`parser::parse`] folds the token stream into events, tracking
//!    tab-word state, counters and the active ruleset.
//! 3. [`rules`] resolves ruleset blocks and derives the full
//!    per-course tuning.
//!
//! ```
//! use parsetab::{parse, Event};
//!
//! let events = parse("Qa1b2 | c3")?;
//! assert!(matches!(events[0], Event::Chord { .. }));
//! assert!(matches!(events[1], Event::Barline { .. }));
//! # Ok::<(), parsetab::TabError>(())
//! ```

pub mod base;
pub mod error;
pub mod io;
pub mod lexer;
pub mod parser;
pub mod rules;
pub mod tabcode;

pub use error::TabError;
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{parse, parse_with_options, ParseOptions};
pub use rules::{parse_ruleset, FretGlyph, Notation, RuleFields, Ruleset};
pub use tabcode::*;
