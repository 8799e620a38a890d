//! Segment timing
//!
//! Linear in the tempo of the current main program, clamped into the
//! template's tempo bounds. See [`segcraft_common::timing`].

use super::core::Fabricator;
use crate::error::{FabricationError, Result};
use segcraft_common::timing::{clamp_tempo, micros_at_position, try_micros_per_beat};

impl Fabricator {
    /// Tempo of the current main program, clamped into the template bounds
    ///
    /// # Errors
    /// `Fatal` if the segment has no main choice or its program is unknown.
    pub fn main_program_tempo(&self) -> Result<f64> {
        let choice = self.current_main_choice().ok_or_else(|| {
            FabricationError::fatal(format!("Segment[{}] has no current main choice", self.segment().id))
        })?;
        let program = self.program(&choice).ok_or_else(|| {
            FabricationError::fatal(format!(
                "Failed to retrieve current main program of Segment[{}]",
                self.segment().id
            ))
        })?;
        Ok(clamp_tempo(
            program.tempo,
            self.template_config.tempo_min,
            self.template_config.tempo_max,
        ))
    }

    /// Microseconds per beat, computed once per pass
    pub fn micros_per_beat(&mut self) -> Result<f64> {
        if let Some(micros) = self.cache.micros_per_beat {
            return Ok(micros);
        }
        let tempo = self.main_program_tempo()?;
        let micros = try_micros_per_beat(tempo).ok_or_else(|| {
            FabricationError::fatal(format!("Unusable tempo {} for Segment[{}]", tempo, self.segment().id))
        })?;
        self.cache.micros_per_beat = Some(micros);
        Ok(micros)
    }

    /// Segment-relative microseconds at a beat position
    pub fn segment_micros_at_position(&mut self, position: f64) -> Result<i64> {
        Ok(micros_at_position(self.micros_per_beat()?, position))
    }

    /// Microseconds spanned by the segment's total beats
    pub fn total_segment_micros(&mut self) -> Result<i64> {
        let total = f64::from(self.segment().total);
        self.segment_micros_at_position(total)
    }
}
