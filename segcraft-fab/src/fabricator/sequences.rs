//! Program and sequence resolution
//!
//! **Responsibilities:**
//! - Program and sequence of a choice (direct id or through a binding)
//! - Random sequence, binding and pattern selection, cached per decision
//! - Sequence binding offsets: next offset with wraparound, offsets remaining
//! - Current main, beat and detail choices of the segment

use super::core::Fabricator;
use segcraft_common::content::{
    Program, ProgramSequence, ProgramSequenceBinding, ProgramSequencePattern,
    ProgramSequencePatternType, ProgramType,
};
use segcraft_common::music::Chord;
use segcraft_common::segment::SegmentChoice;
use segcraft_common::MarbleBag;
use std::sync::Arc;

impl Fabricator {
    // ========================================================================
    // Programs and sequences
    // ========================================================================

    /// Program of a choice
    pub fn program(&self, choice: &SegmentChoice) -> Option<Program> {
        choice
            .program_id
            .and_then(|id| self.source.program(id))
            .cloned()
    }

    /// Sequence a choice names, directly or through its binding
    pub fn program_sequence(&self, choice: &SegmentChoice) -> Option<ProgramSequence> {
        if let Some(id) = choice.program_sequence_id {
            return self.source.program_sequence(id).cloned();
        }
        let binding = self
            .source
            .program_sequence_binding(choice.program_sequence_binding_id?)?;
        self.source
            .program_sequence(binding.program_sequence_id)
            .cloned()
    }

    /// Sequence to play for a choice
    ///
    /// A bound choice plays its binding's sequence. Otherwise one of the
    /// program's sequences is picked at random, once per choice.
    pub fn sequence(&mut self, choice: &SegmentChoice) -> Option<ProgramSequence> {
        let program = self.program(choice)?;

        if let Some(binding_id) = choice.program_sequence_binding_id {
            if let Some(binding) = self.source.program_sequence_binding(binding_id) {
                return self
                    .source
                    .program_sequence(binding.program_sequence_id)
                    .cloned();
            }
        }

        let source = Arc::clone(&self.source);
        let sequence_id = match self.cache.sequence_for_choice.get(&choice.id) {
            Some(cached) => *cached,
            None => {
                let picked = MarbleBag::quick_pick(
                    &mut self.rng,
                    source.sequences_of_program(program.id).iter().map(|s| s.id),
                );
                self.cache.sequence_for_choice.insert(choice.id, picked);
                picked
            }
        };

        sequence_id.and_then(|id| source.program_sequence(id)).cloned()
    }

    /// One of the program's bindings at `offset`, picked once per pass
    pub fn randomly_selected_sequence_binding_at_offset(
        &mut self,
        program: &Program,
        offset: i32,
    ) -> Option<ProgramSequenceBinding> {
        let source = Arc::clone(&self.source);
        let binding_id = match self.cache.binding_at_offset.get(&(program.id, offset)) {
            Some(cached) => *cached,
            None => {
                let picked = MarbleBag::quick_pick(
                    &mut self.rng,
                    source
                        .bindings_at_offset(program.id, offset)
                        .iter()
                        .map(|b| b.id),
                );
                self.cache
                    .binding_at_offset
                    .insert((program.id, offset), picked);
                picked
            }
        };

        binding_id
            .and_then(|id| source.program_sequence_binding(id))
            .cloned()
    }

    /// One pattern of the choice's sequence and voice of a pattern type
    ///
    /// Picked once per choice and pattern type. With no candidate a warning
    /// message is added to the segment.
    pub fn randomly_selected_pattern(
        &mut self,
        choice: &SegmentChoice,
        pattern_type: ProgramSequencePatternType,
    ) -> Option<ProgramSequencePattern> {
        let source = Arc::clone(&self.source);
        let key = (choice.id, pattern_type);

        let pattern_id = match self.cache.pattern_for_choice.get(&key) {
            Some(cached) => *cached,
            None => {
                let candidates: Vec<_> = match (self.program_sequence(choice), choice.program_voice_id) {
                    (Some(sequence), Some(voice_id)) => source
                        .patterns_of_sequence_and_voice(sequence.id, voice_id)
                        .into_iter()
                        .filter(|p| p.pattern_type == pattern_type)
                        .map(|p| p.id)
                        .collect(),
                    _ => Vec::new(),
                };
                let picked = MarbleBag::quick_pick(&mut self.rng, candidates);
                self.cache.pattern_for_choice.insert(key, picked);
                if picked.is_none() {
                    self.add_warning_message(format!(
                        "No {:?} pattern for Choice[{}]",
                        pattern_type,
                        choice.describe()
                    ));
                }
                picked
            }
        };

        pattern_id
            .and_then(|id| source.program_sequence_pattern(id))
            .cloned()
    }

    // ========================================================================
    // Sequence binding offsets
    // ========================================================================

    /// Offset of the choice's binding, 0 if unbound
    pub fn sequence_binding_offset_for_choice(&self, choice: &SegmentChoice) -> i32 {
        choice
            .program_sequence_binding_id
            .and_then(|id| self.source.program_sequence_binding(id))
            .map_or(0, |binding| binding.offset)
    }

    /// Smallest bound offset after the choice's, wrapping to 0 at the end
    ///
    /// ```text
    /// offsets {0,1,2,3}, current 2 → 3
    /// offsets {0,1,2,3}, current 3 → 0
    /// ```
    pub fn next_sequence_binding_offset(&self, choice: &SegmentChoice) -> i32 {
        let Some(binding) = choice
            .program_sequence_binding_id
            .and_then(|id| self.source.program_sequence_binding(id))
        else {
            return 0;
        };

        self.source
            .available_offsets(binding)
            .into_iter()
            .filter(|offset| *offset > binding.offset)
            .min()
            .unwrap_or(0)
    }

    /// Whether at least `n` bound offsets follow the choice's offset
    pub fn has_more_sequence_binding_offsets(&self, choice: &SegmentChoice, n: usize) -> bool {
        let Some(binding) = choice
            .program_sequence_binding_id
            .and_then(|id| self.source.program_sequence_binding(id))
        else {
            return false;
        };

        let offsets = self.source.available_offsets(binding);
        offsets
            .iter()
            .position(|offset| *offset == binding.offset)
            .is_some_and(|i| i + n < offsets.len())
    }

    pub fn has_one_more_sequence_binding_offset(&self, choice: &SegmentChoice) -> bool {
        self.has_more_sequence_binding_offsets(choice, 1)
    }

    pub fn has_two_more_sequence_binding_offsets(&self, choice: &SegmentChoice) -> bool {
        self.has_more_sequence_binding_offsets(choice, 2)
    }

    /// Second distinct bound offset of a macro program, or its only one
    pub fn second_macro_sequence_binding_offset(&self, macro_program: &Program) -> Option<i32> {
        let mut offsets: Vec<i32> = self
            .source
            .sequence_bindings_of_program(macro_program.id)
            .iter()
            .map(|b| b.offset)
            .collect();
        offsets.sort_unstable();
        offsets.dedup();
        offsets.get(1).or_else(|| offsets.first()).copied()
    }

    // ========================================================================
    // Choices of the segment
    // ========================================================================

    pub fn current_main_choice(&self) -> Option<SegmentChoice> {
        self.workbench.choice_of_type(ProgramType::Main)
    }

    pub fn current_beat_choice(&self) -> Option<SegmentChoice> {
        self.workbench.choice_of_type(ProgramType::Beat)
    }

    pub fn current_detail_choices(&self) -> Vec<SegmentChoice> {
        self.workbench.choices_of_type(ProgramType::Detail)
    }

    pub fn current_main_sequence(&self) -> Option<ProgramSequence> {
        self.program_sequence(&self.current_main_choice()?)
    }

    pub fn previous_main_sequence(&self) -> Option<ProgramSequence> {
        self.program_sequence(&self.previous_main_choice()?)
    }

    /// Key of a choice: its sequence's key if set, else its program's
    pub fn key_for_choice(&mut self, choice: &SegmentChoice) -> Option<Chord> {
        if choice.program_sequence_binding_id.is_some() {
            if let Some(sequence) = self.sequence(choice) {
                if !sequence.key.is_empty() {
                    return Some(Chord::of(&sequence.key));
                }
            }
        }
        self.program(choice).map(|program| Chord::of(&program.key))
    }
}
