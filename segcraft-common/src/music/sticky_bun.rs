//! Sticky buns: persisted randomness for atonal tones
//!
//! An event whose tones are atonal (e.g. `"X"`) gets one random value per
//! tone. The values are stored as JSON in a segment meta under
//! [`StickyBun::compute_meta_key`], so a continuing segment resolves the same
//! atonal tones to the same voicing notes.

use super::note::Note;
use crate::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest stored value
pub const STICKY_BUN_MIN: i32 = -50;

/// Highest stored value
pub const STICKY_BUN_MAX: i32 = 50;

const META_KEY_PREFIX: &str = "StickyBun_";

/// One value per tone of a pattern event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyBun {
    pub event_id: Uuid,
    pub values: Vec<i32>,
}

impl StickyBun {
    /// Roll a bun for an event's tones
    ///
    /// Tonal tones get 0; atonal tones get a value in
    /// `STICKY_BUN_MIN..=STICKY_BUN_MAX`.
    pub fn new<R, S>(event_id: Uuid, tones: &[S], rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        let values = tones
            .iter()
            .map(|tone| {
                if Note::of(tone.as_ref()).is_atonal() {
                    rng.gen_range(STICKY_BUN_MIN..=STICKY_BUN_MAX)
                } else {
                    0
                }
            })
            .collect();
        Self { event_id, values }
    }

    /// Segment meta key under which the bun for `event_id` is stored
    ///
    /// ```rust
    /// use segcraft_common::music::StickyBun;
    /// use uuid::Uuid;
    ///
    /// assert_eq!(StickyBun::compute_meta_key(Uuid::nil()),
    ///            "StickyBun_00000000-0000-0000-0000-000000000000");
    /// ```
    pub fn compute_meta_key(event_id: Uuid) -> String {
        format!("{}{}", META_KEY_PREFIX, event_id)
    }

    pub fn meta_key(&self) -> String {
        Self::compute_meta_key(self.event_id)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Replace each atonal note with one of the voicing notes
    ///
    /// The stored value at the note's index picks the voicing note: the value
    /// range is spread evenly over the voicing notes. Tonal notes are kept,
    /// and with no voicing notes the source is returned unchanged.
    pub fn replace_atonal(&self, source: &[Note], voicing_notes: &[Note]) -> Vec<Note> {
        if voicing_notes.is_empty() {
            return source.to_vec();
        }
        source
            .iter()
            .enumerate()
            .map(|(index, note)| {
                if note.is_atonal() {
                    self.compute(voicing_notes, index)
                } else {
                    *note
                }
            })
            .collect()
    }

    fn compute(&self, voicing_notes: &[Note], index: usize) -> Note {
        let value = self.values.get(index).copied().unwrap_or(0);
        let ratio = (value - STICKY_BUN_MIN) as f64 / (STICKY_BUN_MAX - STICKY_BUN_MIN) as f64;
        let last = voicing_notes.len() - 1;
        let pick = ((ratio * voicing_notes.len() as f64) as usize).min(last);
        voicing_notes[pick]
    }
}
