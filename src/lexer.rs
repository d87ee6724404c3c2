//! Lexical tokenisation.

use regex::Regex;

use crate::base::DEFAULT_MAIN_COURSE_COUNT;
use crate::error::TabError;

/// Token kinds, in the order their patterns are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Space,
    Page,
    System,
    Bar,
    Metre,
    RhythmFlag,
    Beam,
    Tuple,
    MainCourseRef,
    MainPitch,
    BassPitch,
    Fingering,
    Ornament,
    LineTypeAB,
    LineTypeC,
    LineTypeD,
    Ruleset,
    Comment,
}

/// A token with the raw text it covers. `last_index` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub code: &'a str,
    pub index: usize,
    pub last_index: usize,
}

/// One entry of the rule table. Most rules are anchored regular
/// expressions; beams and fingerings need a following-character check
/// the regex engine cannot express, so they get dedicated matchers
/// occupying the same slot in the trial order.
enum Rule {
    Pattern(Regex),
    Beam,
    Fingering(Regex),
}

impl Rule {
    fn match_len(&self, rest: &str) -> Option<usize> {
        match self {
            Rule::Pattern(re) => re.find(rest).map(|m| m.end()),
            Rule::Beam => beam_len(rest),
            Rule::Fingering(paren) => fingering_len(rest, paren),
        }
    }
}

fn pattern(source: &str) -> Rule {
    // Rule patterns are fixed at compile time apart from the course
    // count digit, so construction cannot fail on valid input.
    Rule::Pattern(Regex::new(source).expect("invalid token pattern"))
}

/// The TabCode grammar. Patterns are tried in declaration order and
/// the first match at the current offset wins; several patterns
/// overlap on purpose, so this order is part of the grammar.
fn make_rules(main_course_count: u8) -> Vec<(TokenKind, Rule)> {
    let n = main_course_count;
    vec![
        (TokenKind::Space, pattern(r"\A\s+")),
        (TokenKind::Page, pattern(r"\A\{>\}")),
        (TokenKind::System, pattern(r"\A\{\^\}")),
        (TokenKind::Bar, pattern(r"\A:?\|[^\s{}]*")),
        (TokenKind::Metre, pattern(r"\AM[^\s{}]*")),
        (TokenKind::RhythmFlag, pattern(r"\A[ZYTSEQHWBF]\.?")),
        (TokenKind::Beam, Rule::Beam),
        (
            TokenKind::Tuple,
            pattern(r"\A(?:\[?\d\]?\(\d?[ZYTSEQHWB]\)|\[\d\]|\d)"),
        ),
        // Course reference, i.e. a pitch slot with no fret letter.
        (TokenKind::MainCourseRef, pattern(&format!(r"\A-[1-{n}]"))),
        // Fret/course tab location.
        (TokenKind::MainPitch, pattern(&format!(r"\A[a-z][1-{n}]"))),
        (TokenKind::BassPitch, pattern(r"\AX(?:[a-z]/*|\d*)")),
        // Performance markings.
        (
            TokenKind::Fingering,
            Rule::Fingering(
                Regex::new(r#"\A\(F[lr]?(?:[1-4!\-"]|\.+):[1-8]\)"#)
                    .expect("invalid fingering pattern"),
            ),
        ),
        (
            TokenKind::Ornament,
            pattern(r"\A(?:\(O[acdefghijkl]\d?(?::\d)?\)|[ux,#<~*])"),
        ),
        (
            TokenKind::LineTypeAB,
            pattern(r"\A\(C[ud]?(?:-?\d+:-?(?:[1-8]{1}|[1-8]{2}))?\)"),
        ),
        (TokenKind::LineTypeC, pattern(r"\A\(E\d*\)")),
        (TokenKind::LineTypeD, pattern(r"\A(?:\(S[ud]?(?::[lr])?\)|/)")),
        // Rule-sets are embedded markup; recognise the whole block as
        // one token and parse it separately.
        (
            TokenKind::Ruleset,
            pattern(r"(?is)\A\{\s*<rules>.*</rules>\s*\}"),
        ),
    ]
}

/// A run of `]` closes beams. A run of `[` opens beams unless the run
/// butts up against a `[n]` tuple opener, in which case the final
/// bracket is left for the tuple pattern.
fn beam_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    match bytes.first() {
        Some(b']') => Some(bytes.iter().take_while(|&&b| b == b']').count()),
        Some(b'[') => {
            let run = bytes.iter().take_while(|&&b| b == b'[').count();
            let tuple_follows = bytes.get(run).is_some_and(|b| b.is_ascii_digit())
                && bytes.get(run + 1) == Some(&b']');
            if tuple_follows {
                if run > 1 {
                    Some(run - 1)
                } else {
                    None
                }
            } else {
                Some(run)
            }
        }
        _ => None,
    }
}

/// Either the full parenthesised fingering form, or a one-character
/// shorthand. The shorthand is only a fingering when the next
/// character is neither a digit nor a barline stroke.
fn fingering_len(rest: &str, paren: &Regex) -> Option<usize> {
    if let Some(m) = paren.find(rest) {
        return Some(m.end());
    }
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !matches!(first, '.' | ':' | '-' | '!' | '"') {
        return None;
    }
    match chars.next() {
        Some(next) if next == '|' || next.is_ascii_digit() => None,
        _ => Some(first.len_utf8()),
    }
}

/// Scan forward from an opening brace, tracking nesting depth, until
/// the braces rebalance. Returns the exclusive end offset.
fn find_comment_end(input: &str, start: usize) -> Result<usize, TabError> {
    let mut level = 0usize;
    for (i, c) in input[start..].char_indices() {
        match c {
            '{' => level += 1,
            '}' => {
                level -= 1;
                if level == 0 {
                    return Ok(start + i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    Err(TabError::UnbalancedComment { index: start })
}

/// A lazy, single-pass tokeniser over a TabCode string.
///
/// Yields tokens that cover the entire input with no gaps, so joining
/// the `code` of every token reproduces the input exactly. Stops after
/// the first error.
pub struct Scanner<'a> {
    input: &'a str,
    index: usize,
    rules: Vec<(TokenKind, Rule)>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_course_count(input, DEFAULT_MAIN_COURSE_COUNT)
    }

    /// The main-course count parameterises the course-reference and
    /// main-pitch patterns.
    pub fn with_course_count(input: &'a str, main_course_count: u8) -> Self {
        Scanner {
            input,
            index: 0,
            rules: make_rules(main_course_count),
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>, TabError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.input.len() {
            return None;
        }
        let rest = &self.input[self.index..];
        for (kind, rule) in &self.rules {
            if let Some(len) = rule.match_len(rest) {
                debug_assert!(len > 0, "token patterns never match empty");
                let index = self.index;
                let last_index = index + len;
                self.index = last_index;
                return Some(Ok(Token {
                    kind: *kind,
                    code: &self.input[index..last_index],
                    index,
                    last_index,
                }));
            }
        }
        if rest.starts_with('{') {
            let index = self.index;
            match find_comment_end(self.input, index) {
                Ok(last_index) => {
                    self.index = last_index;
                    Some(Ok(Token {
                        kind: TokenKind::Comment,
                        code: &self.input[index..last_index],
                        index,
                        last_index,
                    }))
                }
                Err(err) => {
                    self.index = self.input.len();
                    Some(Err(err))
                }
            }
        } else {
            let index = self.index;
            let symbol = rest.chars().next().unwrap_or('\0');
            self.index = self.input.len();
            Some(Err(TabError::Scan { symbol, index }))
        }
    }
}
