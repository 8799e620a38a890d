//! Note ranges and octave fitting
//!
//! A [`NoteRange`] is the span of tonal notes used by a voicing or a program
//! voice. Fitting one range onto another is done in whole octaves:
//!
//! - **lowest-optimal** keeps the shifted source low note at or above the
//!   target low note, as close as possible (bass lines must not drop below
//!   the voicing);
//! - **median-optimal** brings the range medians as close as possible.

use super::note::{Note, PitchClass};
use std::fmt;

/// Octave shift search window, both directions
pub const MAX_OCTAVE_SHIFT: i32 = 10;

/// Largest delta considered when searching for an octave shift
const BASELINE_DELTA: i32 = 100;

/// Lowest and highest tonal note of a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NoteRange {
    low: Option<Note>,
    high: Option<Note>,
}

impl NoteRange {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Range spanning the given notes; atonal notes are ignored
    pub fn of_notes<'a, I>(notes: I) -> Self
    where
        I: IntoIterator<Item = &'a Note>,
    {
        let mut range = Self::empty();
        for note in notes {
            range.expand(note);
        }
        range
    }

    /// Range spanning the given note names; unparseable names are ignored
    pub fn of_strings<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut range = Self::empty();
        for name in names {
            range.expand(&Note::of(name.as_ref()));
        }
        range
    }

    /// Widen the range to include `note` (no-op for atonal notes)
    pub fn expand(&mut self, note: &Note) {
        let Some(semitones) = note.semitones() else {
            return;
        };
        if self.low.and_then(|l| l.semitones()).map_or(true, |l| semitones < l) {
            self.low = Some(*note);
        }
        if self.high.and_then(|h| h.semitones()).map_or(true, |h| semitones > h) {
            self.high = Some(*note);
        }
    }

    pub fn low(&self) -> Option<Note> {
        self.low
    }

    pub fn high(&self) -> Option<Note> {
        self.high
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_none()
    }

    /// Note halfway between low and high, rounded down
    pub fn median(&self) -> Option<Note> {
        let low = self.low?.semitones()?;
        let high = self.high?.semitones()?;
        let median = (i64::from(low) + i64::from(high)).div_euclid(2);
        i32::try_from(median).ok().map(Note::of_semitones)
    }

    /// The note of pitch class `pc` closest to this range's median
    ///
    /// Searches outward from the median one semitone at a time; on a tie the
    /// note above wins. `None` if the range is empty or `pc` is atonal.
    pub fn note_nearest_median(&self, pc: PitchClass) -> Option<Note> {
        let median = self.median()?;
        pc.index()?;
        for distance in 0..super::note::SEMITONES_PER_OCTAVE {
            let up = median.shift(distance);
            if up.pitch_class == pc {
                return Some(up);
            }
            let down = median.shift(-distance);
            if down.pitch_class == pc {
                return Some(down);
            }
        }
        None
    }

    /// Shift this range by whole octaves
    pub fn shift_octave(&self, octaves: i32) -> Self {
        Self {
            low: self.low.map(|n| n.shift_octave(octaves)),
            high: self.high.map(|n| n.shift_octave(octaves)),
        }
    }

    /// Octave shift putting `source.low` at or just above `target.low`
    ///
    /// **Algorithm:** for each o from +10 down to −10, d = delta from the
    /// target low up to the source low shifted by o. Keep the smallest d with
    /// 0 ≤ d. Returns 0 when either range is empty or nothing qualifies.
    ///
    /// ```rust
    /// use segcraft_common::music::NoteRange;
    ///
    /// let source = NoteRange::of_strings(["C2", "G2"]);
    /// let target = NoteRange::of_strings(["C3", "E3"]);
    /// assert_eq!(NoteRange::lowest_optimal_shift_octaves(&source, &target), 1);
    /// ```
    pub fn lowest_optimal_shift_octaves(source: &NoteRange, target: &NoteRange) -> i32 {
        let (Some(source_low), Some(target_low)) = (source.low, target.low) else {
            return 0;
        };

        let mut shift = 0;
        let mut best = BASELINE_DELTA;
        for o in (-MAX_OCTAVE_SHIFT..=MAX_OCTAVE_SHIFT).rev() {
            let d = target_low.delta(&source_low.shift_octave(o));
            if (0..best).contains(&d) {
                best = d;
                shift = o;
            }
        }
        shift
    }

    /// Octave shift bringing the source median closest to the target median
    ///
    /// Ties go to the higher shift. Returns 0 when either range is empty.
    pub fn median_optimal_shift_octaves(source: &NoteRange, target: &NoteRange) -> i32 {
        let (Some(source_median), Some(target_median)) = (source.median(), target.median()) else {
            return 0;
        };

        let mut shift = 0;
        let mut best = BASELINE_DELTA;
        for o in (-MAX_OCTAVE_SHIFT..=MAX_OCTAVE_SHIFT).rev() {
            let d = target_median.delta(&source_median.shift_octave(o)).saturating_abs();
            if d < best {
                best = d;
                shift = o;
            }
        }
        shift
    }
}

impl fmt::Display for NoteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.low, self.high) {
            (Some(low), Some(high)) => write!(f, "{}-{}", low, high),
            _ => f.write_str("(empty)"),
        }
    }
}
