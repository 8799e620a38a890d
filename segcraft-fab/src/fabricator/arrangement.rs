//! Arrangements, picks and audio
//!
//! **Responsibilities:**
//! - Arrangements of the segment, optionally limited to some choices
//! - Picks per choice in start order
//! - Preferred audio per voice and event, seeded from the lineage
//! - Pick volume and the set of audios picked so far

use super::core::{Fabricator, VoiceTrackKey};
use segcraft_common::content::{InstrumentAudio, ProgramSequencePatternEvent};
use segcraft_common::segment::{
    SegmentChoice, SegmentChoiceArrangement, SegmentChoiceArrangementPick,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Name used when an event has no track
const UNKNOWN_TRACK: &str = "unknown";

impl Fabricator {
    pub fn arrangements(&self) -> Vec<SegmentChoiceArrangement> {
        self.workbench.arrangements()
    }

    /// Arrangements made for any of `choices`
    pub fn arrangements_for(&self, choices: &[SegmentChoice]) -> Vec<SegmentChoiceArrangement> {
        let choice_ids: HashSet<Uuid> = choices.iter().map(|c| c.id).collect();
        self.workbench
            .arrangements()
            .into_iter()
            .filter(|a| choice_ids.contains(&a.segment_choice_id))
            .collect()
    }

    pub fn picks(&self) -> Vec<SegmentChoiceArrangementPick> {
        self.workbench.picks()
    }

    /// Picks of a choice's arrangements, ascending by start time
    pub fn picks_for_choice(&mut self, choice: &SegmentChoice) -> Vec<SegmentChoiceArrangementPick> {
        if let Some(cached) = self.cache.picks_for_choice.get(&choice.id) {
            return cached.clone();
        }

        let arrangement_ids: HashSet<Uuid> = self
            .arrangements_for(std::slice::from_ref(choice))
            .iter()
            .map(|a| a.id)
            .collect();
        let mut picks: Vec<SegmentChoiceArrangementPick> = self
            .workbench
            .picks()
            .into_iter()
            .filter(|p| arrangement_ids.contains(&p.segment_choice_arrangement_id))
            .collect();
        picks.sort_by_key(|p| p.start_at_segment_micros);

        self.cache.picks_for_choice.insert(choice.id, picks.clone());
        picks
    }

    /// Distinct instrument audios picked in this segment, in pick order
    pub fn picked_audios(&self) -> Vec<InstrumentAudio> {
        let mut seen = HashSet::new();
        self.workbench
            .picks()
            .iter()
            .filter(|p| seen.insert(p.instrument_audio_id))
            .filter_map(|p| self.source.instrument_audio(p.instrument_audio_id))
            .cloned()
            .collect()
    }

    /// Audio last picked in the lineage for a voice and event name
    pub fn preferred_audio(&self, voice_id: Option<Uuid>, event: &str) -> Option<InstrumentAudio> {
        let key = VoiceTrackKey {
            voice_id,
            event: event.to_string(),
        };
        self.preferred_audios
            .get(&key)
            .and_then(|id| self.source.instrument_audio(*id))
            .cloned()
    }

    /// Volume of a pick: audio volume × instrument volume
    ///
    /// `None` if the audio or its instrument is not in the catalog. Callers
    /// rendering the pick should play it at unit volume in that case, as in
    /// `audio_volume(&pick).unwrap_or(1.0)`.
    pub fn audio_volume(&mut self, pick: &SegmentChoiceArrangementPick) -> Option<f32> {
        if let Some(volume) = self.cache.audio_volume.get(&pick.id) {
            return Some(*volume);
        }

        let audio = self.source.instrument_audio(pick.instrument_audio_id)?;
        let instrument = self.source.instrument(audio.instrument_id)?;
        let volume = audio.volume * instrument.volume;

        self.cache.audio_volume.insert(pick.id, volume);
        Some(volume)
    }

    /// Name of the track an event plays on
    pub fn track_name(&self, event: &ProgramSequencePatternEvent) -> String {
        self.source
            .track_of_event(event)
            .map_or_else(|| UNKNOWN_TRACK.to_string(), |track| track.name.clone())
    }

    /// Preferred audio per voice and event from the lineage's picks
    ///
    /// Picks are replayed oldest segment first, so the latest wins.
    pub(super) fn compute_preferred_audios(&self) -> HashMap<VoiceTrackKey, Uuid> {
        let mut picks: Vec<&SegmentChoiceArrangementPick> =
            self.retrospective.picks().iter().collect();
        picks.sort_by_key(|p| {
            self.retrospective
                .segment(p.segment_id)
                .map_or(0, |s| s.offset)
        });

        let mut audios = HashMap::new();
        for pick in picks {
            if self.source.instrument_audio(pick.instrument_audio_id).is_none() {
                continue;
            }
            let voice_id = pick
                .program_sequence_pattern_event_id
                .and_then(|id| self.source.program_sequence_pattern_event(id))
                .and_then(|event| self.source.track_of_event(event))
                .map(|track| track.program_voice_id);
            audios.insert(
                VoiceTrackKey {
                    voice_id,
                    event: pick.event.clone(),
                },
                pick.instrument_audio_id,
            );
        }
        audios
    }
}
