//! The context-sensitive parser.
//!
//! Tokens arrive left to right and accumulate into a "tab word": one
//! simultaneous sounding event built from an optional rhythm flag,
//! pitches, and decorations. Any token that cannot extend the current
//! tab word flushes it as a chord or rest before being handled itself.

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::base::DEFAULT_MAIN_COURSE_COUNT;
use crate::error::TabError;
use crate::lexer::{Scanner, Token, TokenKind};
use crate::rules::{parse_ruleset, Ruleset};
use crate::tabcode::{
    BarlineFlags, Duration, Event, Fingering, Line, MainCourseRef, Note, Ornament, Pitch,
};

/// Barline style sub-patterns, each tested independently against the
/// raw bar text; a bar can satisfy several at once.
static BAR_DOUBLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|{2}").expect("bar pattern"));
static BAR_L_REPEAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:\|").expect("bar pattern"));
static BAR_R_REPEAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|:$").expect("bar pattern"));
static BAR_DASHED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\|=").expect("bar pattern"));
static BAR_NON_COUNTING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\|=?0$").expect("bar pattern"));
static BAR_MID_DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\|:\|$").expect("bar pattern"));

static METRE_COMPONENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^M(:;)]+").expect("metre pattern"));

/// Configuration for one parse invocation.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Number of fretted main courses; parameterises two lexer patterns.
    pub main_course_count: u8,
    /// Include comment tokens in the event stream.
    pub comments: bool,
    /// Starting page number.
    pub page_num: usize,
    /// Starting system number.
    pub sys_num: usize,
    /// Starting bar number.
    pub bar_num: usize,
    /// Reserved: do not attempt to resolve encoding irregularities.
    pub strict: bool,
    /// Trace tokens to the log as they are consumed.
    pub debug: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            main_course_count: DEFAULT_MAIN_COURSE_COUNT,
            comments: true,
            page_num: 1,
            sys_num: 1,
            bar_num: 1,
            strict: false,
            debug: false,
        }
    }
}

/// Which accumulator received the most recent note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastNote {
    Main,
    Bass,
}

/// Mutable parse state, owned by exactly one parse invocation and
/// discarded after the final flush.
struct Context {
    comments: bool,
    debug: bool,
    page_num: usize,
    sys_num: usize,
    bar_num: usize,
    cur_rhythm: Option<Duration>,
    prev_rhythm: Option<Duration>,
    cur_notes: Vec<Note>,
    cur_bass_notes: Vec<Note>,
    last_note: Option<LastNote>,
    main_course_ref: Option<MainCourseRef>,
    ruleset: Option<Rc<Ruleset>>,
}

impl Context {
    fn new(options: &ParseOptions) -> Self {
        Context {
            comments: options.comments,
            debug: options.debug,
            page_num: options.page_num,
            sys_num: options.sys_num,
            bar_num: options.bar_num,
            cur_rhythm: None,
            prev_rhythm: None,
            cur_notes: Vec::new(),
            cur_bass_notes: Vec::new(),
            last_note: None,
            main_course_ref: None,
            ruleset: None,
        }
    }

    fn within_chord(&self) -> bool {
        !self.cur_notes.is_empty() || !self.cur_bass_notes.is_empty()
    }

    fn new_rhythm_context(&self) -> bool {
        self.cur_rhythm.is_some()
    }

    fn last_note_mut(&mut self) -> Option<&mut Note> {
        match self.last_note? {
            LastNote::Main => self.cur_notes.last_mut(),
            LastNote::Bass => self.cur_bass_notes.last_mut(),
        }
    }
}

/// Parse TabCode into an ordered event sequence with default options.
pub fn parse(input: &str) -> Result<Vec<Event>, TabError> {
    parse_with_options(input, &ParseOptions::default())
}

/// Parse TabCode into an ordered event sequence.
pub fn parse_with_options(input: &str, options: &ParseOptions) -> Result<Vec<Event>, TabError> {
    let scanner = Scanner::with_course_count(input, options.main_course_count);
    let mut context = Context::new(options);
    let mut data = Vec::new();

    for (count, item) in scanner.enumerate() {
        let token = item?;
        if context.debug {
            log::debug!("{} {:?}", count + 1, token);
        }

        // Tokens that extend the current tab word.
        match token.kind {
            TokenKind::RhythmFlag => {
                parse_rhythm_flag(&token, &mut context)?;
                continue;
            }
            TokenKind::Beam | TokenKind::Tuple => {
                // Recognised but inert: grouping semantics are not
                // assigned to these tokens yet.
                continue;
            }
            TokenKind::MainCourseRef => {
                parse_main_course_ref(&token, &mut context)?;
                continue;
            }
            TokenKind::MainPitch => {
                parse_main_pitch(&token, &mut context);
                continue;
            }
            TokenKind::BassPitch => {
                parse_bass_pitch(&token, &mut context);
                continue;
            }
            TokenKind::Fingering => {
                parse_fingering(&token, &mut context)?;
                continue;
            }
            TokenKind::Ornament => {
                parse_ornament(&token, &mut context)?;
                continue;
            }
            TokenKind::LineTypeAB | TokenKind::LineTypeC | TokenKind::LineTypeD => {
                parse_line(&token, &mut context)?;
                continue;
            }
            _ => {}
        }

        // Anything else ends the tab word.
        if let Some(event) = flush_context(&mut context)? {
            data.push(event);
        }

        match token.kind {
            TokenKind::Space => {}
            TokenKind::Comment => {
                if context.comments {
                    data.push(Event::Comment {
                        code: token.code.to_string(),
                    });
                }
            }
            TokenKind::Page => {
                data.push(Event::PageBreak {
                    code: token.code.to_string(),
                    page_num: context.page_num,
                });
                context.page_num += 1;
            }
            TokenKind::System => {
                data.push(Event::SystemBreak {
                    code: token.code.to_string(),
                    sys_num: context.sys_num,
                });
                context.sys_num += 1;
            }
            TokenKind::Bar => data.push(parse_bar(&token, &mut context)),
            TokenKind::Metre => data.push(parse_metre(&token)),
            TokenKind::Ruleset => {
                let ruleset = parse_ruleset(token.code, context.ruleset.as_deref())?;
                context.ruleset = Some(Rc::new(ruleset.clone()));
                data.push(Event::Ruleset(ruleset));
            }
            _ => return Err(TabError::grammar("Unexpected token", Some(token.code))),
        }
    }

    if let Some(event) = flush_context(&mut context)? {
        data.push(event);
    }
    Ok(data)
}

/// Close the current tab word. Emits a chord if notes accumulated, a
/// rest if only a rhythm flag did, and nothing otherwise. The rhythm
/// pending during this flush, present or not, becomes the new
/// carry-forward default. A course reference still pending here was
/// never consumed by a line and is a grammar violation.
fn flush_context(context: &mut Context) -> Result<Option<Event>, TabError> {
    let event = if context.within_chord() {
        let duration = context
            .cur_rhythm
            .clone()
            .or_else(|| context.prev_rhythm.clone());
        let main_courses = std::mem::take(&mut context.cur_notes);
        let bass_courses = std::mem::take(&mut context.cur_bass_notes);
        context.last_note = None;
        Some(Event::Chord {
            duration,
            main_courses,
            bass_courses,
        })
    } else {
        context.cur_rhythm.clone().map(|duration| Event::Rest { duration })
    };

    context.prev_rhythm = context.cur_rhythm.take();

    if let Some(pending) = &context.main_course_ref {
        return Err(TabError::grammar(
            "Unhandled main course reference",
            Some(&pending.code),
        ));
    }
    Ok(event)
}

fn parse_rhythm_flag(token: &Token, context: &mut Context) -> Result<(), TabError> {
    // A rhythm flag is only allowed at the start of a tab word.
    if !context.within_chord() && !context.new_rhythm_context() {
        context.cur_rhythm = Some(Duration::new(token.code));
        Ok(())
    } else {
        Err(TabError::grammar("Unexpected rhythm flag", Some(token.code)))
    }
}

fn parse_main_course_ref(token: &Token, context: &mut Context) -> Result<(), TabError> {
    if context.main_course_ref.is_some() {
        return Err(TabError::grammar(
            "Unexpected main course reference",
            Some(token.code),
        ));
    }
    let course = second_char_digit(token.code);
    context.main_course_ref = Some(MainCourseRef::new(token.code, course));
    Ok(())
}

fn parse_main_pitch(token: &Token, context: &mut Context) {
    let fret = token.code.chars().next().unwrap_or('\0');
    let course = second_char_digit(token.code);
    context.cur_notes.push(Note::new(Pitch::new(
        token.code,
        fret,
        course,
        context.ruleset.clone(),
    )));
    context.last_note = Some(LastNote::Main);
}

/// Bass courses continue the numbering after the main courses: `Xa`
/// with k slashes is course 7+k, and the digit shorthand `Xn` is
/// course 6+n. A digit shorthand sounds the open course.
fn parse_bass_pitch(token: &Token, context: &mut Context) {
    let body = &token.code[1..];
    let (fret, course) = match body.chars().next() {
        Some(c) if c.is_ascii_lowercase() => {
            let slashes = body.chars().filter(|&c| c == '/').count();
            (c, 7 + slashes as u8)
        }
        Some(c) if c.is_ascii_digit() => ('a', 6 + c.to_digit(10).unwrap_or(1) as u8),
        _ => ('a', 7),
    };
    context.cur_bass_notes.push(Note::new(Pitch::new(
        token.code,
        fret,
        course,
        context.ruleset.clone(),
    )));
    context.last_note = Some(LastNote::Bass);
}

fn parse_fingering(token: &Token, context: &mut Context) -> Result<(), TabError> {
    match context.last_note_mut() {
        Some(note) => {
            note.fingering = Some(Fingering::new(token.code));
            Ok(())
        }
        None => Err(TabError::grammar("Unexpected fingering", Some(token.code))),
    }
}

fn parse_ornament(token: &Token, context: &mut Context) -> Result<(), TabError> {
    match context.last_note_mut() {
        Some(note) => {
            note.ornament = Some(Ornament::new(token.code));
            Ok(())
        }
        None => Err(TabError::grammar("Unexpected ornament", Some(token.code))),
    }
}

fn parse_line(token: &Token, context: &mut Context) -> Result<(), TabError> {
    let course_ref = context.main_course_ref.take();
    match context.last_note_mut() {
        Some(note) => {
            note.line = Some(Line::new(token.code, course_ref));
            Ok(())
        }
        None => Err(TabError::grammar("Unexpected line", Some(token.code))),
    }
}

fn parse_bar(token: &Token, context: &mut Context) -> Event {
    let flags = BarlineFlags {
        double_bar: BAR_DOUBLE.is_match(token.code),
        l_repeat: BAR_L_REPEAT.is_match(token.code),
        r_repeat: BAR_R_REPEAT.is_match(token.code),
        dashed: BAR_DASHED.is_match(token.code),
        non_counting: BAR_NON_COUNTING.is_match(token.code),
        mid_dots: BAR_MID_DOTS.is_match(token.code),
    };
    let barline = Event::Barline {
        code: token.code.to_string(),
        bar_num: context.bar_num,
        flags,
    };
    context.bar_num += 1;
    barline
}

fn parse_metre(token: &Token) -> Event {
    Event::Metre {
        code: token.code.to_string(),
        components: METRE_COMPONENTS
            .find_iter(token.code)
            .map(|m| m.as_str().to_string())
            .collect(),
        vertical: token.code.contains(':'),
    }
}

fn second_char_digit(code: &str) -> u8 {
    code.chars()
        .nth(1)
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0) as u8
}
