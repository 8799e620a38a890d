//! Segment type state machine
//!
//! **Responsibilities:**
//! - Compute INITIAL / CONTINUE / NEXTMAIN / NEXTMACRO once per segment
//! - Previous segment's main and macro choices
//! - Choices carried over from the lineage when continuing

use super::core::Fabricator;
use crate::error::{FabricationError, Result};
use segcraft_common::content::{InstrumentMode, InstrumentType, ProgramType, ProgramVoice};
use segcraft_common::segment::{SegmentChoice, SegmentType};
use tracing::debug;

impl Fabricator {
    /// Type of the segment under construction, computed on first call
    ///
    /// The computed type is also written onto the workbench segment.
    ///
    /// # Errors
    /// `Fatal` if the segment is not the first of its chain and the
    /// retrospective has no previous segment or main choice.
    pub fn segment_type(&mut self) -> Result<SegmentType> {
        if let Some(segment_type) = self.segment_type {
            return Ok(segment_type);
        }

        let segment_type = self.compute_segment_type()?;
        self.segment_type = Some(segment_type);

        let mut segment = self.segment().clone();
        segment.segment_type = segment_type;
        self.workbench.set_segment(segment);

        debug!(
            segment_id = %self.segment().id,
            offset = self.segment().offset,
            segment_type = %segment_type,
            "Computed segment type"
        );

        Ok(segment_type)
    }

    pub fn is_initial_segment(&self) -> bool {
        self.segment().offset == 0
    }

    /// Whether this segment continues the previous segment's main program
    pub fn is_continuation_of_macro_program(&mut self) -> Result<bool> {
        Ok(matches!(
            self.segment_type()?,
            SegmentType::Continue | SegmentType::NextMain
        ))
    }

    /// Main choice of the previous segment
    pub fn previous_main_choice(&self) -> Option<SegmentChoice> {
        self.retrospective
            .previous_choice_of_type(ProgramType::Main)
            .cloned()
    }

    /// Macro choice of the previous segment
    pub fn macro_choice_of_previous_segment(&self) -> Option<SegmentChoice> {
        self.retrospective
            .previous_choice_of_type(ProgramType::Macro)
            .cloned()
    }

    // ========================================================================
    // Continuation lookups
    // ========================================================================

    /// Lineage choice for a voice of the same name and type, if continuing
    pub fn choice_if_continued_for_voice(
        &mut self,
        voice: &ProgramVoice,
    ) -> Result<Option<SegmentChoice>> {
        if self.segment_type()? != SegmentType::Continue {
            return Ok(None);
        }
        Ok(self
            .retrospective
            .choices()
            .iter()
            .find(|choice| {
                choice
                    .program_voice_id
                    .and_then(|id| self.source.program_voice(id))
                    .is_some_and(|candidate| {
                        candidate.name == voice.name
                            && candidate.instrument_type == voice.instrument_type
                    })
            })
            .cloned())
    }

    /// Lineage choice of an instrument type, if continuing
    pub fn choice_if_continued_for_instrument_type(
        &mut self,
        instrument_type: InstrumentType,
    ) -> Result<Option<SegmentChoice>> {
        if self.segment_type()? != SegmentType::Continue {
            return Ok(None);
        }
        Ok(self
            .retrospective
            .choices()
            .iter()
            .find(|choice| choice.instrument_type == Some(instrument_type))
            .cloned())
    }

    /// Lineage choice of an instrument type and mode, if continuing
    pub fn choice_if_continued_for_instrument_type_and_mode(
        &mut self,
        instrument_type: InstrumentType,
        instrument_mode: InstrumentMode,
    ) -> Result<Option<SegmentChoice>> {
        if self.segment_type()? != SegmentType::Continue {
            return Ok(None);
        }
        Ok(self
            .retrospective
            .choices()
            .iter()
            .find(|choice| {
                choice.instrument_type == Some(instrument_type)
                    && choice.instrument_mode == Some(instrument_mode)
            })
            .cloned())
    }

    /// Lineage choices of a program type, if continuing
    pub fn choices_if_continued_for_program_type(
        &mut self,
        program_type: ProgramType,
    ) -> Result<Vec<SegmentChoice>> {
        if self.segment_type()? != SegmentType::Continue {
            return Ok(Vec::new());
        }
        Ok(self
            .retrospective
            .choices()
            .iter()
            .filter(|choice| choice.program_type == Some(program_type))
            .cloned()
            .collect())
    }

    /// **Algorithm:**
    /// 1. Offset 0 → INITIAL.
    /// 2. The previous main choice has one more binding offset and the
    ///    previous segment's delta is below the template's max delta → CONTINUE.
    /// 3. The previous macro choice has two more binding offsets → NEXTMAIN.
    /// 4. Otherwise → NEXTMACRO.
    fn compute_segment_type(&self) -> Result<SegmentType> {
        if self.is_initial_segment() {
            return Ok(SegmentType::Initial);
        }

        let previous_segment = self.retrospective.previous_segment().ok_or_else(|| {
            FabricationError::fatal(format!(
                "Segment[{}] at offset {} has no previous segment",
                self.segment().id,
                self.segment().offset
            ))
        })?;
        let previous_main = self.previous_main_choice().ok_or_else(|| {
            FabricationError::fatal(format!(
                "Previous Segment[{}] has no main choice",
                previous_segment.id
            ))
        })?;

        if self.has_one_more_sequence_binding_offset(&previous_main)
            && self.template_config.main_program_length_max_delta > previous_segment.delta
        {
            return Ok(SegmentType::Continue);
        }

        if let Some(previous_macro) = self.macro_choice_of_previous_segment() {
            if self.has_two_more_sequence_binding_offsets(&previous_macro) {
                return Ok(SegmentType::NextMain);
            }
        }

        Ok(SegmentType::NextMacro)
    }
}
