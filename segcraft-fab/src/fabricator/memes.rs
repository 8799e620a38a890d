//! Meme-gated staging
//!
//! **Responsibilities:**
//! - Stage sub-entities, gating choices and memes through the meme stack
//! - Carry a choice's program, binding and instrument memes onto the segment
//! - Invalidate derived caches when chords, voicings or picks change
//! - Meme isometry of the segment and of the previous macro's next sequence

use super::core::Fabricator;
use segcraft_common::meme::{to_meme, MemeIsometry, MemeStack};
use segcraft_common::segment::{SegmentChoice, SegmentEntity, SegmentMeme, SubEntity};
use std::collections::BTreeSet;
use tracing::warn;

impl Fabricator {
    /// Stage a sub-entity on the workbench
    ///
    /// A choice is staged only if its memes may join the segment's meme
    /// stack; its memes are staged first. A meme that would break the stack
    /// is not staged. Returns `None` when refused.
    pub fn put<E: SubEntity>(&mut self, entity: E) -> Option<E> {
        self.put_entity(entity, false)
    }

    /// Stage a sub-entity without meme stack gating
    pub fn put_forced<E: SubEntity>(&mut self, entity: E) -> Option<E> {
        self.put_entity(entity, true)
    }

    /// Memes of the segment, as staged
    pub fn segment_memes(&self) -> Vec<SegmentMeme> {
        self.workbench.memes()
    }

    /// Isometry of the memes already on the segment
    pub fn meme_isometry_of_segment(&self) -> MemeIsometry {
        MemeIsometry::of(self.segment_memes().iter().map(|m| m.name.as_str()))
    }

    /// Isometry of the sequence following the previous segment's macro binding
    ///
    /// Sources are the macro program's memes plus the memes of its bindings
    /// at the previous binding offset + 1.
    pub fn meme_isometry_of_next_sequence_in_previous_macro(&self) -> MemeIsometry {
        let Some(previous_macro) = self.macro_choice_of_previous_segment() else {
            return MemeIsometry::none();
        };
        let (Some(program_id), Some(binding)) = (
            previous_macro.program_id,
            previous_macro
                .program_sequence_binding_id
                .and_then(|id| self.source.program_sequence_binding(id)),
        ) else {
            return MemeIsometry::none();
        };

        let mut isometry = MemeIsometry::none();
        for meme in self.source.memes_of_program(program_id) {
            isometry.add(&meme.name);
        }
        for next in self.source.bindings_at_offset(program_id, binding.offset + 1) {
            for meme in self.source.memes_of_sequence_binding(next.id) {
                isometry.add(&meme.name);
            }
        }
        isometry
    }

    /// Normalized memes a choice brings with its program, binding and instrument
    pub fn memes_of_choice(&self, choice: &SegmentChoice) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        if let Some(id) = choice.program_id {
            names.extend(self.source.memes_of_program(id).iter().map(|m| to_meme(&m.name)));
        }
        if let Some(id) = choice.program_sequence_binding_id {
            names.extend(
                self.source
                    .memes_of_sequence_binding(id)
                    .iter()
                    .map(|m| to_meme(&m.name)),
            );
        }
        if let Some(id) = choice.instrument_id {
            names.extend(self.source.memes_of_instrument(id).iter().map(|m| to_meme(&m.name)));
        }
        names
    }

    fn put_entity<E: SubEntity>(&mut self, entity: E, force: bool) -> Option<E> {
        match entity.clone().into() {
            SegmentEntity::Choice(choice) => {
                if !self.add_memes_of_choice(&choice, force) {
                    return None;
                }
            }
            SegmentEntity::Meme(meme) => {
                if !force && !self.meme_stack_allows(std::iter::once(meme.name.as_str())) {
                    return None;
                }
            }
            SegmentEntity::Chord(_) | SegmentEntity::ChordVoicing(_) => {
                self.cache.invalidate_harmony();
            }
            SegmentEntity::Arrangement(_) | SegmentEntity::Pick(_) => {
                self.cache.invalidate_picks();
            }
            SegmentEntity::Message(_) | SegmentEntity::Meta(_) => {}
        }

        Some(self.workbench.put(entity))
    }

    /// Stage a choice's memes, unless they would break the meme stack
    fn add_memes_of_choice(&mut self, choice: &SegmentChoice, force: bool) -> bool {
        let names = self.memes_of_choice(choice);

        if !force && !self.meme_stack_allows(names.iter().map(String::as_str)) {
            let existing: Vec<String> = self.segment_memes().into_iter().map(|m| m.name).collect();
            let stack = MemeStack::from(&self.template_config.meme_taxonomy, &existing);
            let constellation = stack.constellation();
            let candidates = names.iter().cloned().collect::<Vec<_>>().join(",");
            warn!(
                segment_id = %self.segment().id,
                choice = %choice.describe(),
                memes = %candidates,
                constellation = %constellation,
                "Refused choice with conflicting memes"
            );
            self.add_error_message(format!(
                "Refused to add Choice[{}] because adding Memes[{}] to MemeStack[{}] would result in an invalid meme stack theorem!",
                choice.describe(),
                candidates,
                constellation
            ));
            return false;
        }

        let segment_id = self.segment().id;
        for name in names {
            self.put_entity(SegmentMeme::new(segment_id, &name), force);
        }
        true
    }

    fn meme_stack_allows<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> bool {
        let existing: Vec<String> = self.segment_memes().into_iter().map(|m| m.name).collect();
        MemeStack::from(&self.template_config.meme_taxonomy, &existing).is_allowed(candidates)
    }
}
