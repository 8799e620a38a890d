//! Catalog read contract and in-memory snapshot

use super::entities::*;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Read-only access to the content catalog ("source material")
///
/// Lookups by id return `None` for unknown ids; nothing here fails. A
/// snapshot is shared by concurrent fabrications, so implementations must be
/// safe for concurrent reads.
pub trait SourceMaterial: Send + Sync {
    fn program(&self, id: Uuid) -> Option<&Program>;
    fn program_sequence(&self, id: Uuid) -> Option<&ProgramSequence>;
    fn program_sequence_binding(&self, id: Uuid) -> Option<&ProgramSequenceBinding>;
    fn program_sequence_pattern(&self, id: Uuid) -> Option<&ProgramSequencePattern>;
    fn program_sequence_pattern_event(&self, id: Uuid) -> Option<&ProgramSequencePatternEvent>;
    fn program_voice(&self, id: Uuid) -> Option<&ProgramVoice>;
    fn program_voice_track(&self, id: Uuid) -> Option<&ProgramVoiceTrack>;
    fn instrument(&self, id: Uuid) -> Option<&Instrument>;
    fn instrument_audio(&self, id: Uuid) -> Option<&InstrumentAudio>;

    /// Sequences belonging to a program
    fn sequences_of_program(&self, program_id: Uuid) -> Vec<&ProgramSequence>;

    /// Sequence bindings of a program, any offset
    fn sequence_bindings_of_program(&self, program_id: Uuid) -> Vec<&ProgramSequenceBinding>;

    /// Patterns of one sequence for one voice
    fn patterns_of_sequence_and_voice(
        &self,
        sequence_id: Uuid,
        voice_id: Uuid,
    ) -> Vec<&ProgramSequencePattern>;

    /// Events of a pattern, ordered by position
    fn events_of_pattern(&self, pattern_id: Uuid) -> Vec<&ProgramSequencePatternEvent>;

    /// Every event of every pattern of every sequence of a program
    fn events_of_program(&self, program_id: Uuid) -> Vec<&ProgramSequencePatternEvent>;

    fn voices_of_program(&self, program_id: Uuid) -> Vec<&ProgramVoice>;

    fn tracks_of_voice(&self, voice_id: Uuid) -> Vec<&ProgramVoiceTrack>;

    /// Chords of a sequence, ordered by position
    fn chords_of_sequence(&self, sequence_id: Uuid) -> Vec<&ProgramSequenceChord>;

    fn voicings_of_chord(&self, chord_id: Uuid) -> Vec<&ProgramSequenceChordVoicing>;

    fn audios_of_instrument(&self, instrument_id: Uuid) -> Vec<&InstrumentAudio>;

    fn memes_of_program(&self, program_id: Uuid) -> Vec<&ProgramMeme>;
    fn memes_of_sequence_binding(&self, binding_id: Uuid) -> Vec<&ProgramSequenceBindingMeme>;
    fn memes_of_instrument(&self, instrument_id: Uuid) -> Vec<&InstrumentMeme>;

    fn template_bindings(&self) -> Vec<&TemplateBinding>;

    /// Bindings of a program at exactly `offset`
    fn bindings_at_offset(&self, program_id: Uuid, offset: i32) -> Vec<&ProgramSequenceBinding> {
        self.sequence_bindings_of_program(program_id)
            .into_iter()
            .filter(|binding| binding.offset == offset)
            .collect()
    }

    /// Distinct offsets bound in the binding's program, ascending
    fn available_offsets(&self, binding: &ProgramSequenceBinding) -> Vec<i32> {
        let mut offsets: Vec<i32> = self
            .sequence_bindings_of_program(binding.program_id)
            .iter()
            .map(|b| b.offset)
            .collect();
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }

    /// Track an event is played on
    fn track_of_event(&self, event: &ProgramSequencePatternEvent) -> Option<&ProgramVoiceTrack> {
        self.program_voice_track(event.program_voice_track_id)
    }

    /// Voice an event belongs to, through its track
    fn voice_of_event(&self, event: &ProgramSequencePatternEvent) -> Option<&ProgramVoice> {
        self.track_of_event(event)
            .and_then(|track| self.program_voice(track.program_voice_id))
    }

    /// Every chord voicing in every sequence of a program
    fn voicings_of_program(&self, program_id: Uuid) -> Vec<&ProgramSequenceChordVoicing> {
        self.sequences_of_program(program_id)
            .into_iter()
            .flat_map(|sequence| self.chords_of_sequence(sequence.id))
            .flat_map(|chord| self.voicings_of_chord(chord.id))
            .collect()
    }
}

// ============================================================================
// ContentStore
// ============================================================================

/// Immutable in-memory catalog snapshot
///
/// Built once with [`ContentStore::put`], then shared read-only (typically
/// behind an `Arc<dyn SourceMaterial>`).
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    template_bindings: BTreeMap<Uuid, TemplateBinding>,
    programs: BTreeMap<Uuid, Program>,
    program_memes: BTreeMap<Uuid, ProgramMeme>,
    sequences: BTreeMap<Uuid, ProgramSequence>,
    bindings: BTreeMap<Uuid, ProgramSequenceBinding>,
    binding_memes: BTreeMap<Uuid, ProgramSequenceBindingMeme>,
    voices: BTreeMap<Uuid, ProgramVoice>,
    tracks: BTreeMap<Uuid, ProgramVoiceTrack>,
    patterns: BTreeMap<Uuid, ProgramSequencePattern>,
    events: BTreeMap<Uuid, ProgramSequencePatternEvent>,
    chords: BTreeMap<Uuid, ProgramSequenceChord>,
    voicings: BTreeMap<Uuid, ProgramSequenceChordVoicing>,
    instruments: BTreeMap<Uuid, Instrument>,
    instrument_memes: BTreeMap<Uuid, InstrumentMeme>,
    audios: BTreeMap<Uuid, InstrumentAudio>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one entity, keyed by its id
    pub fn put(&mut self, entity: impl Into<ContentEntity>) -> &mut Self {
        match entity.into() {
            ContentEntity::TemplateBinding(e) => {
                self.template_bindings.insert(e.id, e);
            }
            ContentEntity::Program(e) => {
                self.programs.insert(e.id, e);
            }
            ContentEntity::ProgramMeme(e) => {
                self.program_memes.insert(e.id, e);
            }
            ContentEntity::ProgramSequence(e) => {
                self.sequences.insert(e.id, e);
            }
            ContentEntity::ProgramSequenceBinding(e) => {
                self.bindings.insert(e.id, e);
            }
            ContentEntity::ProgramSequenceBindingMeme(e) => {
                self.binding_memes.insert(e.id, e);
            }
            ContentEntity::ProgramVoice(e) => {
                self.voices.insert(e.id, e);
            }
            ContentEntity::ProgramVoiceTrack(e) => {
                self.tracks.insert(e.id, e);
            }
            ContentEntity::ProgramSequencePattern(e) => {
                self.patterns.insert(e.id, e);
            }
            ContentEntity::ProgramSequencePatternEvent(e) => {
                self.events.insert(e.id, e);
            }
            ContentEntity::ProgramSequenceChord(e) => {
                self.chords.insert(e.id, e);
            }
            ContentEntity::ProgramSequenceChordVoicing(e) => {
                self.voicings.insert(e.id, e);
            }
            ContentEntity::Instrument(e) => {
                self.instruments.insert(e.id, e);
            }
            ContentEntity::InstrumentMeme(e) => {
                self.instrument_memes.insert(e.id, e);
            }
            ContentEntity::InstrumentAudio(e) => {
                self.audios.insert(e.id, e);
            }
        }
        self
    }

    /// Build a snapshot from a batch of entities
    pub fn from_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = ContentEntity>,
    {
        let mut store = Self::new();
        for entity in entities {
            store.put(entity);
        }
        store
    }

    /// Parse a JSON array of tagged entities into a snapshot
    pub fn from_json(text: &str) -> crate::Result<Self> {
        let entities: Vec<ContentEntity> = serde_json::from_str(text)?;
        Ok(Self::from_entities(entities))
    }

    pub fn programs(&self) -> impl Iterator<Item = &Program> {
        self.programs.values()
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }
}

impl SourceMaterial for ContentStore {
    fn program(&self, id: Uuid) -> Option<&Program> {
        self.programs.get(&id)
    }

    fn program_sequence(&self, id: Uuid) -> Option<&ProgramSequence> {
        self.sequences.get(&id)
    }

    fn program_sequence_binding(&self, id: Uuid) -> Option<&ProgramSequenceBinding> {
        self.bindings.get(&id)
    }

    fn program_sequence_pattern(&self, id: Uuid) -> Option<&ProgramSequencePattern> {
        self.patterns.get(&id)
    }

    fn program_sequence_pattern_event(&self, id: Uuid) -> Option<&ProgramSequencePatternEvent> {
        self.events.get(&id)
    }

    fn program_voice(&self, id: Uuid) -> Option<&ProgramVoice> {
        self.voices.get(&id)
    }

    fn program_voice_track(&self, id: Uuid) -> Option<&ProgramVoiceTrack> {
        self.tracks.get(&id)
    }

    fn instrument(&self, id: Uuid) -> Option<&Instrument> {
        self.instruments.get(&id)
    }

    fn instrument_audio(&self, id: Uuid) -> Option<&InstrumentAudio> {
        self.audios.get(&id)
    }

    fn sequences_of_program(&self, program_id: Uuid) -> Vec<&ProgramSequence> {
        self.sequences
            .values()
            .filter(|s| s.program_id == program_id)
            .collect()
    }

    fn sequence_bindings_of_program(&self, program_id: Uuid) -> Vec<&ProgramSequenceBinding> {
        self.bindings
            .values()
            .filter(|b| b.program_id == program_id)
            .collect()
    }

    fn patterns_of_sequence_and_voice(
        &self,
        sequence_id: Uuid,
        voice_id: Uuid,
    ) -> Vec<&ProgramSequencePattern> {
        self.patterns
            .values()
            .filter(|p| p.program_sequence_id == sequence_id && p.program_voice_id == voice_id)
            .collect()
    }

    fn events_of_pattern(&self, pattern_id: Uuid) -> Vec<&ProgramSequencePatternEvent> {
        let mut events: Vec<_> = self
            .events
            .values()
            .filter(|e| e.program_sequence_pattern_id == pattern_id)
            .collect();
        events.sort_by(|a, b| a.position.total_cmp(&b.position));
        events
    }

    fn events_of_program(&self, program_id: Uuid) -> Vec<&ProgramSequencePatternEvent> {
        self.events
            .values()
            .filter(|e| {
                self.patterns
                    .get(&e.program_sequence_pattern_id)
                    .and_then(|p| self.sequences.get(&p.program_sequence_id))
                    .is_some_and(|s| s.program_id == program_id)
            })
            .collect()
    }

    fn voices_of_program(&self, program_id: Uuid) -> Vec<&ProgramVoice> {
        self.voices
            .values()
            .filter(|v| v.program_id == program_id)
            .collect()
    }

    fn tracks_of_voice(&self, voice_id: Uuid) -> Vec<&ProgramVoiceTrack> {
        self.tracks
            .values()
            .filter(|t| t.program_voice_id == voice_id)
            .collect()
    }

    fn chords_of_sequence(&self, sequence_id: Uuid) -> Vec<&ProgramSequenceChord> {
        let mut chords: Vec<_> = self
            .chords
            .values()
            .filter(|c| c.program_sequence_id == sequence_id)
            .collect();
        chords.sort_by(|a, b| a.position.total_cmp(&b.position));
        chords
    }

    fn voicings_of_chord(&self, chord_id: Uuid) -> Vec<&ProgramSequenceChordVoicing> {
        self.voicings
            .values()
            .filter(|v| v.program_sequence_chord_id == chord_id)
            .collect()
    }

    fn audios_of_instrument(&self, instrument_id: Uuid) -> Vec<&InstrumentAudio> {
        self.audios
            .values()
            .filter(|a| a.instrument_id == instrument_id)
            .collect()
    }

    fn memes_of_program(&self, program_id: Uuid) -> Vec<&ProgramMeme> {
        self.program_memes
            .values()
            .filter(|m| m.program_id == program_id)
            .collect()
    }

    fn memes_of_sequence_binding(&self, binding_id: Uuid) -> Vec<&ProgramSequenceBindingMeme> {
        self.binding_memes
            .values()
            .filter(|m| m.program_sequence_binding_id == binding_id)
            .collect()
    }

    fn memes_of_instrument(&self, instrument_id: Uuid) -> Vec<&InstrumentMeme> {
        self.instrument_memes
            .values()
            .filter(|m| m.instrument_id == instrument_id)
            .collect()
    }

    fn template_bindings(&self) -> Vec<&TemplateBinding> {
        self.template_bindings.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(program_id: Uuid, offset: i32) -> ProgramSequenceBinding {
        ProgramSequenceBinding {
            id: Uuid::new_v4(),
            program_id,
            program_sequence_id: Uuid::new_v4(),
            offset,
        }
    }

    #[test]
    fn test_lookup_unknown_id_is_none() {
        let store = ContentStore::new();
        assert!(store.program(Uuid::new_v4()).is_none());
        assert!(store.instrument_audio(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_available_offsets_sorted_and_distinct() {
        let program_id = Uuid::new_v4();
        let mut store = ContentStore::new();
        let first = binding(program_id, 2);
        store
            .put(first.clone())
            .put(binding(program_id, 0))
            .put(binding(program_id, 2))
            .put(binding(program_id, 1))
            .put(binding(Uuid::new_v4(), 7));

        assert_eq!(store.available_offsets(&first), vec![0, 1, 2]);
        assert_eq!(store.bindings_at_offset(program_id, 2).len(), 2);
        assert!(store.bindings_at_offset(program_id, 5).is_empty());
    }

    #[test]
    fn test_voice_of_event_through_track() {
        let voice = ProgramVoice {
            id: Uuid::new_v4(),
            program_id: Uuid::new_v4(),
            instrument_type: InstrumentType::Drum,
            name: "Drums".to_string(),
            order: 1.0,
        };
        let track = ProgramVoiceTrack {
            id: Uuid::new_v4(),
            program_voice_id: voice.id,
            name: "KICK".to_string(),
        };
        let event = ProgramSequencePatternEvent {
            id: Uuid::new_v4(),
            program_sequence_pattern_id: Uuid::new_v4(),
            program_voice_track_id: track.id,
            position: 0.0,
            duration: 1.0,
            tones: "X".to_string(),
            velocity: 1.0,
        };
        let mut store = ContentStore::new();
        store.put(voice.clone()).put(track.clone()).put(event.clone());

        assert_eq!(store.track_of_event(&event), Some(&track));
        assert_eq!(store.voice_of_event(&event), Some(&voice));
    }

    #[test]
    fn test_from_json() {
        let program_id = Uuid::new_v4();
        let json = format!(
            r#"[{{"type":"Program","id":"{}","name":"Groove","program_type":"Main","key":"C","tempo":120.0}}]"#,
            program_id
        );
        let store = ContentStore::from_json(&json).unwrap();
        assert_eq!(store.program(program_id).map(|p| p.name.as_str()), Some("Groove"));
    }
}
