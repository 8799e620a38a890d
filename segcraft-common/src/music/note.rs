//! Pitch classes and notes
//!
//! A note is a pitch class plus an octave. Its semitone index is
//! `octave × 12 + pitch class`, so `C4` is 48 and `A4` is 57. The pitch class
//! `None` marks an atonal note (percussion, or an unparseable tone); atonal
//! notes have no semitone index and never take part in range math.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semitones in one octave
pub const SEMITONES_PER_OCTAVE: i32 = 12;

/// Octave assumed for a tone written without one (`"C"`)
pub const DEFAULT_OCTAVE: i32 = 4;

/// Lowest octave a tone may be written with
pub const MIN_OCTAVE: i32 = -10;

/// Highest octave a tone may be written with
pub const MAX_OCTAVE: i32 = 20;

/// Text used for an atonal note
pub const ATONAL: &str = "X";

// ============================================================================
// PitchClass
// ============================================================================

/// One of the twelve pitch classes, or `None` for atonal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    None,
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

const CHROMATIC: [PitchClass; 12] = [
    PitchClass::C,
    PitchClass::Cs,
    PitchClass::D,
    PitchClass::Ds,
    PitchClass::E,
    PitchClass::F,
    PitchClass::Fs,
    PitchClass::G,
    PitchClass::Gs,
    PitchClass::A,
    PitchClass::As,
    PitchClass::B,
];

impl PitchClass {
    /// Index within the octave, C = 0; `None` for atonal
    pub fn index(self) -> Option<i32> {
        CHROMATIC.iter().position(|pc| *pc == self).map(|i| i as i32)
    }

    /// Pitch class at a (possibly negative or overflowing) semitone index
    pub fn from_index(index: i32) -> Self {
        CHROMATIC[index.rem_euclid(SEMITONES_PER_OCTAVE) as usize]
    }

    pub fn is_none(self) -> bool {
        self == PitchClass::None
    }

    /// Parse the leading pitch class of `text`, returning it with the rest
    ///
    /// Accepts a letter `A`–`G` (either case) followed by optional `#`/`♯` or
    /// `b`/`♭`. Anything else parses as `None` with the text untouched.
    ///
    /// ```rust
    /// use segcraft_common::music::PitchClass;
    ///
    /// assert_eq!(PitchClass::parse_prefix("Eb7"), (PitchClass::Ds, "7"));
    /// assert_eq!(PitchClass::parse_prefix("F#m"), (PitchClass::Fs, "m"));
    /// assert_eq!(PitchClass::parse_prefix("X"), (PitchClass::None, "X"));
    /// ```
    pub fn parse_prefix(text: &str) -> (PitchClass, &str) {
        let mut chars = text.char_indices();
        let natural = match chars.next() {
            Some((_, c)) => match c.to_ascii_uppercase() {
                'C' => 0,
                'D' => 2,
                'E' => 4,
                'F' => 5,
                'G' => 7,
                'A' => 9,
                'B' => 11,
                _ => return (PitchClass::None, text),
            },
            None => return (PitchClass::None, text),
        };

        let rest = &text[1..];
        let (accidental, consumed) = match chars.next() {
            Some((_, '#')) | Some((_, '♯')) => (1, rest.chars().next().map_or(0, char::len_utf8)),
            Some((_, 'b')) | Some((_, '♭')) => (-1, rest.chars().next().map_or(0, char::len_utf8)),
            _ => (0, 0),
        };

        (PitchClass::from_index(natural + accidental), &rest[consumed..])
    }

    /// Shortest signed semitone motion from `self` to `target`, in `-5..=6`
    ///
    /// Zero when either side is atonal.
    pub fn delta(self, target: PitchClass) -> i32 {
        match (self.index(), target.index()) {
            (Some(from), Some(to)) => {
                let up = (to - from).rem_euclid(SEMITONES_PER_OCTAVE);
                if up > 6 {
                    up - SEMITONES_PER_OCTAVE
                } else {
                    up
                }
            }
            _ => 0,
        }
    }

    /// Display name using sharps
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::None => ATONAL,
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Note
// ============================================================================

/// A pitch class at an octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: i32,
}

impl Note {
    pub fn new(pitch_class: PitchClass, octave: i32) -> Self {
        Self { pitch_class, octave }
    }

    /// Parse a tone such as `"C#4"`, `"Bb2"` or `"G"`
    ///
    /// Unparseable text, or an octave outside `MIN_OCTAVE..=MAX_OCTAVE`,
    /// yields an atonal note rather than an error.
    ///
    /// ```rust
    /// use segcraft_common::music::{Note, PitchClass};
    ///
    /// assert_eq!(Note::of("C#4"), Note::new(PitchClass::Cs, 4));
    /// assert_eq!(Note::of("Bb-1").octave, -1);
    /// assert!(Note::of("kick").is_atonal());
    /// assert!(Note::of("C999999999").is_atonal());
    /// ```
    pub fn of(text: &str) -> Self {
        let text = text.trim();
        let (pitch_class, rest) = PitchClass::parse_prefix(text);
        if pitch_class.is_none() {
            return Self::atonal();
        }
        if rest.is_empty() {
            return Self::new(pitch_class, DEFAULT_OCTAVE);
        }
        match rest.parse::<i32>() {
            Ok(octave) if (MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) => {
                Self::new(pitch_class, octave)
            }
            _ => Self::atonal(),
        }
    }

    /// Note at a semitone index
    pub fn of_semitones(semitones: i32) -> Self {
        Self::new(
            PitchClass::from_index(semitones),
            semitones.div_euclid(SEMITONES_PER_OCTAVE),
        )
    }

    pub fn atonal() -> Self {
        Self::new(PitchClass::None, 0)
    }

    pub fn is_atonal(&self) -> bool {
        self.pitch_class.is_none()
    }

    /// `octave × 12 + pitch class`; `None` for atonal or out of `i32` range
    pub fn semitones(&self) -> Option<i32> {
        let pc = self.pitch_class.index()?;
        self.octave
            .checked_mul(SEMITONES_PER_OCTAVE)
            .and_then(|s| s.checked_add(pc))
    }

    pub fn shift_octave(&self, octaves: i32) -> Self {
        Self::new(self.pitch_class, self.octave.saturating_add(octaves))
    }

    pub fn shift(&self, semitones: i32) -> Self {
        match self.semitones() {
            Some(s) => s.checked_add(semitones).map_or(*self, Self::of_semitones),
            None => *self,
        }
    }

    /// Signed semitones from `self` up to `target`; zero if either is atonal
    pub fn delta(&self, target: &Note) -> i32 {
        match (self.semitones(), target.semitones()) {
            (Some(from), Some(to)) => to.saturating_sub(from),
            _ => 0,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_atonal() {
            f.write_str(ATONAL)
        } else {
            write!(f, "{}{}", self.pitch_class, self.octave)
        }
    }
}

/// Split a comma separated tone list into trimmed, non-empty entries
pub fn split_tones(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
