//! Harmony: chords, voicings, note ranges and transposition
//!
//! **Responsibilities:**
//! - Chord in effect at a beat position, falling back to the segment key
//! - Complete (de-duplicated) chord set of a sequence
//! - Voicing selection per chord and instrument type
//! - Note ranges of programs and voicings, octave and semitone shifts

use super::core::{Fabricator, PositionKey, RangeShiftKey, RootNoteKey, TargetShiftKey};
use segcraft_common::content::{
    InstrumentType, ProgramSequence, ProgramSequenceChord, ProgramSequenceChordVoicing,
};
use segcraft_common::music::{split_tones, Chord, Note, NoteRange};
use segcraft_common::segment::{SegmentChord, SegmentChordVoicing};
use segcraft_common::MarbleBag;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

impl Fabricator {
    // ========================================================================
    // Chords
    // ========================================================================

    /// Segment chord at the latest position at or before `position`
    pub fn chord_at(&mut self, position: f64) -> Option<SegmentChord> {
        let key = PositionKey::of(position);
        if let Some(cached) = self.cache.chord_at.get(&key) {
            return cached.clone();
        }

        let chord = self
            .workbench
            .chords()
            .into_iter()
            .filter(|c| c.position <= position)
            .last();
        self.cache.chord_at.insert(key, chord.clone());
        chord
    }

    /// Chord in effect at `position`, or the segment key as a chord
    pub fn chord_or_key_at(&mut self, position: f64) -> Chord {
        match self.chord_at(position) {
            Some(chord) => Chord::of(&chord.name),
            None => Chord::of(&self.segment().key),
        }
    }

    /// Chords of a sequence, one per position, ascending
    ///
    /// Where several chords share a position the one whose voicings carry the
    /// most tonal notes wins; the first listed wins a tie.
    pub fn program_sequence_chords(&mut self, sequence: &ProgramSequence) -> Vec<ProgramSequenceChord> {
        if let Some(cached) = self.cache.complete_chords.get(&sequence.id) {
            return cached.clone();
        }

        let source = Arc::clone(&self.source);
        let mut by_position: HashMap<u32, (usize, &ProgramSequenceChord)> = HashMap::new();
        for chord in source.chords_of_sequence(sequence.id) {
            let notes = source
                .voicings_of_chord(chord.id)
                .iter()
                .map(|v| count_tonal_notes(v))
                .sum::<usize>();
            let slot = by_position
                .entry(chord.position.to_bits())
                .or_insert((notes, chord));
            if notes > slot.0 {
                *slot = (notes, chord);
            }
        }

        let mut chords: Vec<ProgramSequenceChord> =
            by_position.into_values().map(|(_, c)| c.clone()).collect();
        chords.sort_by(|a, b| a.position.total_cmp(&b.position));

        self.cache.complete_chords.insert(sequence.id, chords.clone());
        chords
    }

    // ========================================================================
    // Voicings
    // ========================================================================

    /// One voicing with tonal notes for a segment chord and instrument type
    pub fn choose_voicing(
        &mut self,
        chord: &SegmentChord,
        instrument_type: InstrumentType,
    ) -> Option<SegmentChordVoicing> {
        let key = (chord.id, instrument_type);
        if let Some(cached) = self.cache.voicing_for_chord.get(&key) {
            return cached.clone();
        }

        let candidates: Vec<SegmentChordVoicing> = self
            .workbench
            .chord_voicings()
            .into_iter()
            .filter(|v| v.segment_chord_id == chord.id && v.instrument_type == instrument_type)
            .filter(SegmentChordVoicing::contains_any_valid_notes)
            .collect();
        let voicing = MarbleBag::quick_pick(&mut self.rng, candidates);

        self.cache.voicing_for_chord.insert(key, voicing.clone());
        voicing
    }

    /// Instrument type of the voice a catalog voicing belongs to
    pub fn program_voice_type(&self, voicing: &ProgramSequenceChordVoicing) -> Option<InstrumentType> {
        self.source
            .program_voice(voicing.program_voice_id)
            .map(|voice| voice.instrument_type)
    }

    /// Instrument types voiced anywhere in the current main program
    pub fn distinct_chord_voicing_types(&mut self) -> BTreeSet<InstrumentType> {
        if let Some(cached) = &self.cache.distinct_voicing_types {
            return cached.clone();
        }
        let Some(program_id) = self.current_main_choice().and_then(|c| c.program_id) else {
            return BTreeSet::new();
        };

        let types: BTreeSet<InstrumentType> = self
            .source
            .voicings_of_program(program_id)
            .into_iter()
            .filter_map(|v| self.program_voice_type(v))
            .collect();

        self.cache.distinct_voicing_types = Some(types.clone());
        types
    }

    // ========================================================================
    // Ranges and shifts
    // ========================================================================

    /// Range of the tones a program plays on voices of one instrument type
    pub fn program_range(&mut self, program_id: Uuid, instrument_type: InstrumentType) -> NoteRange {
        if let Some(range) = self.cache.program_range.get(&(program_id, instrument_type)) {
            return *range;
        }

        let source = Arc::clone(&self.source);
        let range = NoteRange::of_strings(
            source
                .events_of_program(program_id)
                .into_iter()
                .filter(|event| {
                    source
                        .voice_of_event(event)
                        .is_some_and(|voice| voice.instrument_type == instrument_type)
                })
                .flat_map(|event| event.tone_list()),
        );

        self.cache
            .program_range
            .insert((program_id, instrument_type), range);
        range
    }

    /// Range of the segment's voicing notes for one instrument type
    pub fn voicing_note_range(&mut self, instrument_type: InstrumentType) -> NoteRange {
        if let Some(range) = self.cache.voicing_note_range.get(&instrument_type) {
            return *range;
        }

        let range = NoteRange::of_strings(
            self.workbench
                .chord_voicings()
                .iter()
                .filter(|v| v.instrument_type == instrument_type)
                .filter(|v| v.contains_any_valid_notes())
                .flat_map(|v| split_tones(&v.notes)),
        );

        self.cache.voicing_note_range.insert(instrument_type, range);
        range
    }

    /// Octaves to shift a program's range onto a voicing range
    ///
    /// Bass fits lowest-optimal; Pad, Stab, Sticky and Stripe fit
    /// median-optimal; anything else is not shifted.
    pub fn program_range_shift_octaves(
        &mut self,
        instrument_type: InstrumentType,
        source: &NoteRange,
        target: &NoteRange,
    ) -> i32 {
        let key = RangeShiftKey {
            instrument_type,
            source: *source,
            target: *target,
        };
        if let Some(shift) = self.cache.range_shift.get(&key) {
            return *shift;
        }

        let shift = match instrument_type {
            InstrumentType::Bass => NoteRange::lowest_optimal_shift_octaves(source, target),
            InstrumentType::Pad
            | InstrumentType::Stab
            | InstrumentType::Sticky
            | InstrumentType::Stripe => NoteRange::median_optimal_shift_octaves(source, target),
            _ => 0,
        };

        self.cache.range_shift.insert(key, shift);
        shift
    }

    /// Semitones to transpose material written in `from` to play over `to`
    ///
    /// Bass follows the slash root of the target chord; other types follow
    /// its root. Returns 0 when `from` is not a chord.
    pub fn target_shift(&mut self, instrument_type: InstrumentType, from: &Chord, to: &Chord) -> i32 {
        if !from.is_present() {
            return 0;
        }
        let key = TargetShiftKey {
            instrument_type,
            from_chord: from.name().to_string(),
            to_chord: to.name().to_string(),
        };
        if let Some(shift) = self.cache.target_shift.get(&key) {
            return *shift;
        }

        let shift = match instrument_type {
            InstrumentType::Bass => from.root().delta(to.slash_root()),
            _ => from.root().delta(to.root()),
        };

        self.cache.target_shift.insert(key, shift);
        shift
    }

    /// Note of the chord's slash root nearest the middle of a voicing
    pub fn root_note_mid_range(&mut self, voicing_notes: &str, chord: &Chord) -> Option<Note> {
        let key = RootNoteKey {
            voicing_notes: voicing_notes.to_string(),
            chord: chord.name().to_string(),
        };
        if let Some(note) = self.cache.root_note.get(&key) {
            return *note;
        }

        let note = NoteRange::of_strings(split_tones(voicing_notes))
            .note_nearest_median(chord.slash_root());

        self.cache.root_note.insert(key, note);
        note
    }
}

fn count_tonal_notes(voicing: &ProgramSequenceChordVoicing) -> usize {
    voicing
        .note_list()
        .iter()
        .filter(|n| !Note::of(n).is_atonal())
        .count()
}
