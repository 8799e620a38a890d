//! Catalog fixture
//!
//! ```text
//! Macro "Seasons"  memes [Winter]   bindings at 0, 1 (meme Storm), 2
//! Main  "Fireside" memes [Cozy]     bindings at 0, 1 (meme Bright), 2 → sequence "Verse" (key G)
//!   voice Bass (track BASS): loop pattern, events C2 and G2
//!   voice Drums (track KICK): loop pattern, event "C4,X,X"
//!   chords at 0: C (5 voicing notes) and a ghost C (1 note); G at 4
//! Beat  "Shuffle"  two sequences
//! Instruments: Bass (volume 0.5, bound to the template), Drums (meme !Cozy)
//! ```

use segcraft_common::content::*;
use uuid::Uuid;

pub struct Catalog {
    pub content: ContentStore,
    pub macro_program: Program,
    pub macro_bindings: Vec<ProgramSequenceBinding>,
    pub main_program: Program,
    pub main_sequence: ProgramSequence,
    pub main_bindings: Vec<ProgramSequenceBinding>,
    pub beat_program: Program,
    pub beat_sequences: Vec<ProgramSequence>,
    pub bass_voice: ProgramVoice,
    pub bass_track: ProgramVoiceTrack,
    pub bass_pattern: ProgramSequencePattern,
    pub bass_events: Vec<ProgramSequencePatternEvent>,
    pub drum_voice: ProgramVoice,
    pub kick_track: ProgramVoiceTrack,
    pub kick_event: ProgramSequencePatternEvent,
    pub chord_c: ProgramSequenceChord,
    pub chord_c_ghost: ProgramSequenceChord,
    pub chord_g: ProgramSequenceChord,
    pub bass_instrument: Instrument,
    pub bass_audio: InstrumentAudio,
    pub drum_instrument: Instrument,
    pub kick_audio: InstrumentAudio,
}

impl Catalog {
    pub fn new() -> Self {
        let mut content = ContentStore::new();

        // Macro
        let macro_program = program("Seasons", ProgramType::Macro, "C", 120.0);
        let macro_sequence = sequence(&macro_program, "Arc", "", 0);
        let macro_bindings: Vec<_> = (0..3)
            .map(|offset| binding(&macro_program, &macro_sequence, offset))
            .collect();
        content
            .put(macro_program.clone())
            .put(macro_sequence)
            .put(program_meme(&macro_program, "Winter"))
            .put(binding_meme(&macro_bindings[1], "Storm"));
        for b in &macro_bindings {
            content.put(b.clone());
        }

        // Main
        let main_program = program("Fireside", ProgramType::Main, "C", 120.0);
        let main_sequence = sequence(&main_program, "Verse", "G", 16);
        let main_bindings: Vec<_> = (0..3)
            .map(|offset| binding(&main_program, &main_sequence, offset))
            .collect();
        content
            .put(main_program.clone())
            .put(main_sequence.clone())
            .put(program_meme(&main_program, "Cozy"))
            .put(binding_meme(&main_bindings[1], "Bright"));
        for b in &main_bindings {
            content.put(b.clone());
        }

        // Voices, tracks, patterns, events
        let bass_voice = voice(&main_program, InstrumentType::Bass, "Bass");
        let bass_track = track(&bass_voice, "BASS");
        let bass_pattern = pattern(&main_sequence, &bass_voice, ProgramSequencePatternType::Loop);
        let bass_events = vec![
            event(&bass_pattern, &bass_track, 0.0, "C2"),
            event(&bass_pattern, &bass_track, 2.0, "G2"),
        ];
        let drum_voice = voice(&main_program, InstrumentType::Drum, "Drums");
        let kick_track = track(&drum_voice, "KICK");
        let drum_pattern = pattern(&main_sequence, &drum_voice, ProgramSequencePatternType::Loop);
        let kick_event = event(&drum_pattern, &kick_track, 0.0, "C4,X,X");
        content
            .put(bass_voice.clone())
            .put(bass_track.clone())
            .put(bass_pattern.clone())
            .put(drum_voice.clone())
            .put(kick_track.clone())
            .put(drum_pattern)
            .put(kick_event.clone());
        for e in &bass_events {
            content.put(e.clone());
        }

        // Chords
        let chord_c = chord(&main_sequence, "C", 0.0);
        let chord_c_ghost = chord(&main_sequence, "C", 0.0);
        let chord_g = chord(&main_sequence, "G", 4.0);
        content
            .put(chord_c.clone())
            .put(chord_c_ghost.clone())
            .put(chord_g.clone())
            .put(voicing(&chord_c, &bass_voice, "C2,E2,G2"))
            .put(voicing(&chord_c, &drum_voice, "C4,E4"))
            .put(voicing(&chord_c_ghost, &bass_voice, "C2"))
            .put(voicing(&chord_g, &bass_voice, "G2,B2,D3"));

        // Beat
        let beat_program = program("Shuffle", ProgramType::Beat, "", 120.0);
        let beat_sequences = vec![
            sequence(&beat_program, "Shuffle A", "", 4),
            sequence(&beat_program, "Shuffle B", "", 4),
        ];
        content.put(beat_program.clone());
        for s in &beat_sequences {
            content.put(s.clone());
        }

        // Instruments
        let bass_instrument = instrument("Upright", InstrumentType::Bass, 0.5);
        let bass_audio = audio(&bass_instrument, "BASS", "C2", 0.8);
        let drum_instrument = instrument("Kit", InstrumentType::Drum, 1.0);
        let kick_audio = audio(&drum_instrument, "KICK", "X", 0.6);
        content
            .put(bass_instrument.clone())
            .put(bass_audio.clone())
            .put(drum_instrument.clone())
            .put(kick_audio.clone())
            .put(InstrumentMeme {
                id: Uuid::new_v4(),
                instrument_id: drum_instrument.id,
                name: "!Cozy".to_string(),
            })
            .put(TemplateBinding {
                id: Uuid::new_v4(),
                binding_type: ContentBindingType::Instrument,
                target_id: bass_instrument.id,
            })
            .put(TemplateBinding {
                id: Uuid::new_v4(),
                binding_type: ContentBindingType::Program,
                target_id: main_program.id,
            });

        Self {
            content,
            macro_program,
            macro_bindings,
            main_program,
            main_sequence,
            main_bindings,
            beat_program,
            beat_sequences,
            bass_voice,
            bass_track,
            bass_pattern,
            bass_events,
            drum_voice,
            kick_track,
            kick_event,
            chord_c,
            chord_c_ghost,
            chord_g,
            bass_instrument,
            bass_audio,
            drum_instrument,
            kick_audio,
        }
    }

    /// Add a main program with its own bindings at the given offsets
    pub fn add_main_program(&mut self, name: &str, memes: &[&str], offsets: &[i32]) -> (Program, Vec<ProgramSequenceBinding>) {
        let program = program(name, ProgramType::Main, "C", 100.0);
        let sequence = sequence(&program, name, "", 8);
        let bindings: Vec<_> = offsets
            .iter()
            .map(|offset| binding(&program, &sequence, *offset))
            .collect();
        self.content.put(program.clone()).put(sequence);
        for meme in memes {
            self.content.put(program_meme(&program, meme));
        }
        for b in &bindings {
            self.content.put(b.clone());
        }
        (program, bindings)
    }
}

// ============================================================================
// Entity builders
// ============================================================================

pub fn program(name: &str, program_type: ProgramType, key: &str, tempo: f64) -> Program {
    Program {
        id: Uuid::new_v4(),
        name: name.to_string(),
        program_type,
        key: key.to_string(),
        tempo,
    }
}

pub fn program_meme(program: &Program, name: &str) -> ProgramMeme {
    ProgramMeme {
        id: Uuid::new_v4(),
        program_id: program.id,
        name: name.to_string(),
    }
}

pub fn sequence(program: &Program, name: &str, key: &str, total: u32) -> ProgramSequence {
    ProgramSequence {
        id: Uuid::new_v4(),
        program_id: program.id,
        name: name.to_string(),
        key: key.to_string(),
        total,
    }
}

pub fn binding(program: &Program, sequence: &ProgramSequence, offset: i32) -> ProgramSequenceBinding {
    ProgramSequenceBinding {
        id: Uuid::new_v4(),
        program_id: program.id,
        program_sequence_id: sequence.id,
        offset,
    }
}

pub fn binding_meme(binding: &ProgramSequenceBinding, name: &str) -> ProgramSequenceBindingMeme {
    ProgramSequenceBindingMeme {
        id: Uuid::new_v4(),
        program_sequence_binding_id: binding.id,
        name: name.to_string(),
    }
}

pub fn voice(program: &Program, instrument_type: InstrumentType, name: &str) -> ProgramVoice {
    ProgramVoice {
        id: Uuid::new_v4(),
        program_id: program.id,
        instrument_type,
        name: name.to_string(),
        order: 1.0,
    }
}

pub fn track(voice: &ProgramVoice, name: &str) -> ProgramVoiceTrack {
    ProgramVoiceTrack {
        id: Uuid::new_v4(),
        program_voice_id: voice.id,
        name: name.to_string(),
    }
}

pub fn pattern(
    sequence: &ProgramSequence,
    voice: &ProgramVoice,
    pattern_type: ProgramSequencePatternType,
) -> ProgramSequencePattern {
    ProgramSequencePattern {
        id: Uuid::new_v4(),
        program_sequence_id: sequence.id,
        program_voice_id: voice.id,
        pattern_type,
        name: format!("{} {:?}", voice.name, pattern_type),
        total: sequence.total,
    }
}

pub fn event(
    pattern: &ProgramSequencePattern,
    track: &ProgramVoiceTrack,
    position: f32,
    tones: &str,
) -> ProgramSequencePatternEvent {
    ProgramSequencePatternEvent {
        id: Uuid::new_v4(),
        program_sequence_pattern_id: pattern.id,
        program_voice_track_id: track.id,
        position,
        duration: 1.0,
        tones: tones.to_string(),
        velocity: 1.0,
    }
}

pub fn chord(sequence: &ProgramSequence, name: &str, position: f32) -> ProgramSequenceChord {
    ProgramSequenceChord {
        id: Uuid::new_v4(),
        program_sequence_id: sequence.id,
        name: name.to_string(),
        position,
    }
}

pub fn voicing(chord: &ProgramSequenceChord, voice: &ProgramVoice, notes: &str) -> ProgramSequenceChordVoicing {
    ProgramSequenceChordVoicing {
        id: Uuid::new_v4(),
        program_sequence_chord_id: chord.id,
        program_voice_id: voice.id,
        notes: notes.to_string(),
    }
}

pub fn instrument(name: &str, instrument_type: InstrumentType, volume: f32) -> Instrument {
    Instrument {
        id: Uuid::new_v4(),
        name: name.to_string(),
        instrument_type,
        mode: InstrumentMode::Event,
        volume,
    }
}

pub fn audio(instrument: &Instrument, event: &str, tones: &str, volume: f32) -> InstrumentAudio {
    InstrumentAudio {
        id: Uuid::new_v4(),
        instrument_id: instrument.id,
        name: format!("{} {}", instrument.name, event),
        event: event.to_string(),
        tones: tones.to_string(),
        tempo: 120.0,
        volume,
    }
}
