//! Catalog entities
//!
//! Read-only records of the content catalog. Fabrication never mutates these.

use crate::music::split_tones;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

/// Role a program plays in a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProgramType {
    Macro,
    Main,
    Beat,
    Detail,
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgramType::Macro => "Macro",
            ProgramType::Main => "Main",
            ProgramType::Beat => "Beat",
            ProgramType::Detail => "Detail",
        };
        write!(f, "{}", s)
    }
}

/// Kind of part an instrument (or program voice) plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstrumentType {
    Background,
    Bass,
    Drum,
    Hook,
    Pad,
    Percussion,
    Stab,
    Sticky,
    Stripe,
    Transition,
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// How an instrument's audio is triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstrumentMode {
    Event,
    Chord,
    Loop,
}

impl fmt::Display for InstrumentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// What a template binding targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentBindingType {
    Library,
    Program,
    Instrument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramSequencePatternType {
    Loop,
    Intro,
    Outro,
}

// ============================================================================
// Template
// ============================================================================

/// Binds a library, program or instrument to the chain's template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateBinding {
    pub id: Uuid,
    pub binding_type: ContentBindingType,
    pub target_id: Uuid,
}

// ============================================================================
// Program
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub program_type: ProgramType,
    /// Key as a chord name, e.g. `"Cm"`
    pub key: String,
    /// Beats per minute
    pub tempo: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMeme {
    pub id: Uuid,
    pub program_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequence {
    pub id: Uuid,
    pub program_id: Uuid,
    pub name: String,
    /// Optional key override; empty means use the program key
    pub key: String,
    /// Length in beats
    pub total: u32,
}

/// Places a sequence at an integer offset in a Macro/Main program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequenceBinding {
    pub id: Uuid,
    pub program_id: Uuid,
    pub program_sequence_id: Uuid,
    pub offset: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequenceBindingMeme {
    pub id: Uuid,
    pub program_sequence_binding_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramVoice {
    pub id: Uuid,
    pub program_id: Uuid,
    pub instrument_type: InstrumentType,
    pub name: String,
    pub order: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramVoiceTrack {
    pub id: Uuid,
    pub program_voice_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequencePattern {
    pub id: Uuid,
    pub program_sequence_id: Uuid,
    pub program_voice_id: Uuid,
    pub pattern_type: ProgramSequencePatternType,
    pub name: String,
    /// Length in beats
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequencePatternEvent {
    pub id: Uuid,
    pub program_sequence_pattern_id: Uuid,
    pub program_voice_track_id: Uuid,
    /// Beats from the start of the pattern
    pub position: f32,
    /// Length in beats
    pub duration: f32,
    /// Comma separated tones, e.g. `"C4,E4"` or `"X"`
    pub tones: String,
    pub velocity: f32,
}

impl ProgramSequencePatternEvent {
    pub fn tone_list(&self) -> Vec<String> {
        split_tones(&self.tones)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequenceChord {
    pub id: Uuid,
    pub program_sequence_id: Uuid,
    pub name: String,
    /// Beats from the start of the sequence
    pub position: f32,
}

/// Concrete notes of a sequence chord for one program voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequenceChordVoicing {
    pub id: Uuid,
    pub program_sequence_chord_id: Uuid,
    pub program_voice_id: Uuid,
    /// Comma separated notes
    pub notes: String,
}

impl ProgramSequenceChordVoicing {
    pub fn note_list(&self) -> Vec<String> {
        split_tones(&self.notes)
    }
}

// ============================================================================
// Instrument
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: Uuid,
    pub name: String,
    pub instrument_type: InstrumentType,
    pub mode: InstrumentMode,
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentMeme {
    pub id: Uuid,
    pub instrument_id: Uuid,
    pub name: String,
}

/// One playable sample of an instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentAudio {
    pub id: Uuid,
    pub instrument_id: Uuid,
    pub name: String,
    /// Event name this audio answers to, e.g. `"KICK"`
    pub event: String,
    /// Comma separated tones sounded by the sample
    pub tones: String,
    pub tempo: f64,
    pub volume: f32,
}

// ============================================================================
// Any catalog entity
// ============================================================================

/// Any catalog entity, for bulk loading into a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentEntity {
    TemplateBinding(TemplateBinding),
    Program(Program),
    ProgramMeme(ProgramMeme),
    ProgramSequence(ProgramSequence),
    ProgramSequenceBinding(ProgramSequenceBinding),
    ProgramSequenceBindingMeme(ProgramSequenceBindingMeme),
    ProgramVoice(ProgramVoice),
    ProgramVoiceTrack(ProgramVoiceTrack),
    ProgramSequencePattern(ProgramSequencePattern),
    ProgramSequencePatternEvent(ProgramSequencePatternEvent),
    ProgramSequenceChord(ProgramSequenceChord),
    ProgramSequenceChordVoicing(ProgramSequenceChordVoicing),
    Instrument(Instrument),
    InstrumentMeme(InstrumentMeme),
    InstrumentAudio(InstrumentAudio),
}

macro_rules! content_entity_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for ContentEntity {
                fn from(entity: $variant) -> Self {
                    ContentEntity::$variant(entity)
                }
            }
        )*
    };
}

content_entity_from!(
    TemplateBinding,
    Program,
    ProgramMeme,
    ProgramSequence,
    ProgramSequenceBinding,
    ProgramSequenceBindingMeme,
    ProgramVoice,
    ProgramVoiceTrack,
    ProgramSequencePattern,
    ProgramSequencePatternEvent,
    ProgramSequenceChord,
    ProgramSequenceChordVoicing,
    Instrument,
    InstrumentMeme,
    InstrumentAudio,
);
