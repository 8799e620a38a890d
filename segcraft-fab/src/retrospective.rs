//! Read-only view of the segments before the one being fabricated
//!
//! The view covers the unbroken run of segments, ending at the previous one,
//! that share the previous segment's main program. A continuing segment can
//! reuse choices, picks and metas made anywhere in that run; an earlier run of
//! the same program, separated by another main program, is not part of it.

use crate::error::{FabricationError, Result};
use segcraft_common::content::{InstrumentMode, InstrumentType, ProgramType};
use segcraft_common::segment::{
    entities_of, Segment, SegmentChoice, SegmentChoiceArrangement, SegmentChoiceArrangementPick,
    SegmentChord, SegmentMeme, SegmentMeta, SegmentStore, SubEntity,
};
use tracing::debug;
use uuid::Uuid;

/// Prior segments of the current main-program lineage
#[derive(Debug, Clone, Default)]
pub struct SegmentRetrospective {
    previous_segment: Option<Segment>,
    segments: Vec<Segment>,
    choices: Vec<SegmentChoice>,
    arrangements: Vec<SegmentChoiceArrangement>,
    picks: Vec<SegmentChoiceArrangementPick>,
    chords: Vec<SegmentChord>,
    memes: Vec<SegmentMeme>,
    metas: Vec<SegmentMeta>,
}

impl SegmentRetrospective {
    /// Retrospective of a chain's first segment: no history at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the retrospective for `segment`
    ///
    /// **Algorithm:**
    /// 1. Offset 0 → empty retrospective.
    /// 2. Read the segment at offset − 1; it must exist and have a Main
    ///    choice, else the chain history is broken (fatal).
    /// 3. Walk back from the previous segment while the Main choice keeps
    ///    the same program, and load the choices, arrangements, picks,
    ///    chords, memes and metas of that run.
    ///
    /// # Errors
    /// `Fatal` for broken history, `Transient` if the store is unavailable.
    pub fn load(store: &dyn SegmentStore, segment: &Segment) -> Result<Self> {
        if segment.offset == 0 {
            return Ok(Self::empty());
        }

        let previous = store
            .read_segment_at_offset(segment.chain_id, segment.offset - 1)?
            .ok_or_else(|| {
                FabricationError::fatal(format!(
                    "Retrospective sees no previous segment before offset {} of Chain[{}]",
                    segment.offset, segment.chain_id
                ))
            })?;

        let previous_main = store
            .read_choice(previous.id, ProgramType::Main)?
            .ok_or_else(|| {
                FabricationError::fatal(format!(
                    "Retrospective sees no main choice in previous Segment[{}]",
                    previous.id
                ))
            })?;
        let main_program_id = previous_main.program_id;

        let mut earlier: Vec<Segment> = store
            .read_all_segments(segment.chain_id)?
            .into_iter()
            .filter(|candidate| candidate.offset < segment.offset)
            .collect();
        earlier.sort_by_key(|candidate| candidate.offset);

        // Newest first; the run ends at the first segment with another main program
        let mut segments = Vec::new();
        for candidate in earlier.into_iter().rev() {
            let same_main = store
                .read_choice(candidate.id, ProgramType::Main)?
                .is_some_and(|choice| choice.program_id == main_program_id);
            if !same_main {
                break;
            }
            segments.push(candidate);
        }
        segments.reverse();
        let ids: Vec<Uuid> = segments.iter().map(|s| s.id).collect();

        let retrospective = Self {
            choices: read_all(store, &ids)?,
            arrangements: read_all(store, &ids)?,
            picks: read_all(store, &ids)?,
            chords: read_all(store, &ids)?,
            memes: read_all(store, &ids)?,
            metas: read_all(store, &ids)?,
            previous_segment: Some(previous),
            segments,
        };

        debug!(
            segment_id = %segment.id,
            offset = segment.offset,
            segments = retrospective.segments.len(),
            main_program_id = ?main_program_id,
            "Loaded retrospective"
        );

        Ok(retrospective)
    }

    pub fn previous_segment(&self) -> Option<&Segment> {
        self.previous_segment.as_ref()
    }

    /// Segments of the lineage, ascending by offset
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Any lineage segment by id
    pub fn segment(&self, segment_id: Uuid) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }

    /// Every choice of the lineage
    pub fn choices(&self) -> &[SegmentChoice] {
        &self.choices
    }

    /// Every pick of the lineage
    pub fn picks(&self) -> &[SegmentChoiceArrangementPick] {
        &self.picks
    }

    pub fn memes(&self) -> &[SegmentMeme] {
        &self.memes
    }

    /// Choice of a program type in the previous segment
    pub fn previous_choice_of_type(&self, program_type: ProgramType) -> Option<&SegmentChoice> {
        self.previous_choices()
            .find(|c| c.program_type == Some(program_type))
    }

    /// Choice of an instrument type in the previous segment
    pub fn previous_choice_of_instrument_type(
        &self,
        instrument_type: InstrumentType,
    ) -> Option<&SegmentChoice> {
        self.previous_choices()
            .find(|c| c.instrument_type == Some(instrument_type))
    }

    /// Choice of an instrument type and mode in the previous segment
    pub fn previous_choice_of_instrument_type_and_mode(
        &self,
        instrument_type: InstrumentType,
        instrument_mode: InstrumentMode,
    ) -> Option<&SegmentChoice> {
        self.previous_choices().find(|c| {
            c.instrument_type == Some(instrument_type) && c.instrument_mode == Some(instrument_mode)
        })
    }

    /// Lineage choices that used an instrument
    pub fn previous_choices_for_instrument(&self, instrument_id: Uuid) -> Vec<&SegmentChoice> {
        self.choices
            .iter()
            .filter(|c| c.instrument_id == Some(instrument_id))
            .collect()
    }

    /// Lineage arrangements of choices that used an instrument
    pub fn previous_arrangements_for_instrument(
        &self,
        instrument_id: Uuid,
    ) -> Vec<&SegmentChoiceArrangement> {
        let choice_ids: Vec<Uuid> = self
            .previous_choices_for_instrument(instrument_id)
            .iter()
            .map(|c| c.id)
            .collect();
        self.arrangements
            .iter()
            .filter(|a| choice_ids.contains(&a.segment_choice_id))
            .collect()
    }

    /// Lineage picks of arrangements of choices that used an instrument
    pub fn previous_picks_for_instrument(
        &self,
        instrument_id: Uuid,
    ) -> Vec<&SegmentChoiceArrangementPick> {
        let arrangement_ids: Vec<Uuid> = self
            .previous_arrangements_for_instrument(instrument_id)
            .iter()
            .map(|a| a.id)
            .collect();
        self.picks
            .iter()
            .filter(|p| arrangement_ids.contains(&p.segment_choice_arrangement_id))
            .collect()
    }

    /// Meta of the previous segment by key
    pub fn previous_meta(&self, key: &str) -> Option<&SegmentMeta> {
        let previous_id = self.previous_segment.as_ref()?.id;
        self.metas
            .iter()
            .find(|m| m.segment_id == previous_id && m.key == key)
    }

    /// Chords of a lineage segment, ascending by position
    pub fn segment_chords(&self, segment_id: Uuid) -> Vec<&SegmentChord> {
        let mut chords: Vec<&SegmentChord> = self
            .chords
            .iter()
            .filter(|c| c.segment_id == segment_id)
            .collect();
        chords.sort_by(|a, b| a.position.total_cmp(&b.position));
        chords
    }

    fn previous_choices(&self) -> impl Iterator<Item = &SegmentChoice> {
        let previous_id = self.previous_segment.as_ref().map(|s| s.id);
        self.choices
            .iter()
            .filter(move |c| Some(c.segment_id) == previous_id)
    }
}

fn read_all<E: SubEntity>(store: &dyn SegmentStore, segment_ids: &[Uuid]) -> Result<Vec<E>> {
    if segment_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(entities_of(store.read_sub_entities(segment_ids, E::KIND)?))
}
