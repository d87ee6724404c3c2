//! Shared constants and pure helpers: flag alphabets, reference tunings
//! and the notation-dialect fret lookup.

/// Ticks per crotchet used when converting durations to tick counts.
pub const TICKS_PER_CROTCHET: u32 = 128;

/// Duration letters from shortest to longest.
pub const DURATION_LETTERS: &str = "ZYTSEQHWB";

/// Rhythm-flag letters: the duration letters plus the fermata flag.
pub const RHYTHM_FLAGS: &str = "ZYTSEQHWBF";

/// The fret letter alphabet.
pub const TAB_LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";

/// Number of fretted main courses on the default instrument.
pub const DEFAULT_MAIN_COURSE_COUNT: u8 = 6;

/// Reference pitch of the first course (MIDI note number).
pub const DEFAULT_PITCH: i32 = 67;

/// Renaissance (G) tuning, the baseline every ruleset is rebased from.
pub const DEFAULT_FULL_TUNING: [i32; 13] = RENAISSANCE_G;

const RENAISSANCE_G: [i32; 13] = [67, 62, 57, 53, 48, 43, 41, 40, 38, 36, 35, 33, 31];

/// Look up a historical reference tuning by its conventional name.
pub fn full_tuning_named(name: &str) -> Option<&'static [i32]> {
    match name {
        "Renaissance (G)" => Some(&RENAISSANCE_G),
        "Renaissance abzug (G)" => {
            Some(&[67, 62, 57, 53, 48, 41, 40, 38, 38, 36, 35, 33, 31])
        }
        "Renaissance (A)" => Some(&[69, 64, 59, 55, 50, 45, 43, 42, 40, 38, 37, 35, 33]),
        "Renaissance guitar" => Some(&[67, 62, 58, 65, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
        "Baroque D minor" => Some(&[65, 62, 57, 53, 50, 45, 43, 41, 40, 38, 36, 34, 33]),
        "Baroque D minor 415" => Some(&[64, 61, 56, 52, 49, 44, 42, 40, 39, 37, 35, 33, 31]),
        "Bandora" => Some(&[57, 52, 48, 43, 38, 36, 31, 26, 24, 23, 21, 19, 17, 16]),
        _ => None,
    }
}

/// Duration of a rhythm flag in crotchet multiples.
///
/// `Q` is one crotchet, each step down the flag alphabet halves the
/// value, and the fermata flag `F` counts as a full breve.
pub fn flag_duration(flag: char) -> Option<f64> {
    let mut pos = RHYTHM_FLAGS.find(flag)?;
    if pos > 7 {
        pos -= 1;
    }
    Some(2f64.powi(pos as i32 - 5))
}

/// Map a fret letter to its 0-based fret position.
///
/// The historical fret alphabet reserves two letters, so positions
/// after `i` shift down by one and positions after `u` by two.
pub fn letter_pitch(fret: char) -> Option<u8> {
    let pos = TAB_LETTERS.find(fret)?;
    let pos = if pos > 20 {
        pos - 2
    } else if pos > 8 {
        pos - 1
    } else {
        pos
    };
    Some(pos as u8)
}
