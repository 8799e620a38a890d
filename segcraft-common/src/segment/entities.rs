//! Chain and segment entities
//!
//! A segment header is a value: to change it, build a new one and hand it
//! back to whoever holds the current copy. Sub-entities (choices, picks,
//! memes, ...) all carry the id of the segment they belong to.

use crate::content::{InstrumentMode, InstrumentType, ProgramType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Chain
// ============================================================================

/// A long-running composition stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub id: Uuid,
    pub name: String,
    /// Prefix for segment storage keys; generated from the id when absent
    pub ship_key: Option<String>,
    /// Template configuration as TOML text
    pub template_config: String,
}

// ============================================================================
// Segment
// ============================================================================

/// How a segment relates to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SegmentType {
    /// Not yet computed
    #[default]
    Pending,
    /// First segment of a chain
    Initial,
    /// Same main program, next sequence binding offset
    Continue,
    /// Same macro program, next main program
    NextMain,
    /// New macro program
    NextMacro,
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SegmentType::Pending => "PENDING",
            SegmentType::Initial => "INITIAL",
            SegmentType::Continue => "CONTINUE",
            SegmentType::NextMain => "NEXTMAIN",
            SegmentType::NextMacro => "NEXTMACRO",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SegmentState {
    #[default]
    Planned,
    Crafting,
    Crafted,
    Failed,
}

/// One fabricated time-slice of a chain
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub id: Uuid,
    pub chain_id: Uuid,
    /// Ordinal position in the chain; 0 is the first segment
    pub offset: u32,
    pub state: SegmentState,
    pub segment_type: SegmentType,
    pub begin_at_chain_micros: i64,
    pub duration_micros: Option<i64>,
    pub key: String,
    /// Length in beats
    pub total: u32,
    pub intensity: f32,
    /// Beats per minute
    pub tempo: f64,
    pub storage_key: Option<String>,
    /// Beats elapsed in the current main program before this segment
    pub delta: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Sub-entities
// ============================================================================

/// A selection of program, sequence and/or instrument for one voice or type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentChoice {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub program_type: Option<ProgramType>,
    pub instrument_type: Option<InstrumentType>,
    pub instrument_mode: Option<InstrumentMode>,
    pub program_id: Option<Uuid>,
    pub program_sequence_id: Option<Uuid>,
    pub program_sequence_binding_id: Option<Uuid>,
    pub program_voice_id: Option<Uuid>,
    pub instrument_id: Option<Uuid>,
    /// Semitones
    pub transpose: i32,
    pub delta_in: i32,
    pub delta_out: i32,
    pub mute: bool,
}

impl SegmentChoice {
    /// Short human readable description for messages
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(t) = self.program_type {
            parts.push(format!("{} program", t));
        }
        if let Some(t) = self.instrument_type {
            parts.push(format!("{} instrument", t));
        }
        if let Some(m) = self.instrument_mode {
            parts.push(format!("{} mode", m));
        }
        if let Some(id) = self.program_id {
            parts.push(format!("programId={}", id));
        }
        if let Some(id) = self.instrument_id {
            parts.push(format!("instrumentId={}", id));
        }
        parts.join(", ")
    }
}

/// Binds a choice to an instrument's playback plan
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentChoiceArrangement {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub segment_choice_id: Uuid,
}

/// One concrete playback event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentChoiceArrangementPick {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub segment_choice_arrangement_id: Uuid,
    pub program_sequence_pattern_event_id: Option<Uuid>,
    pub instrument_audio_id: Uuid,
    /// Event name, e.g. `"KICK"`
    pub event: String,
    pub start_at_segment_micros: i64,
    pub length_micros: i64,
    pub amplitude: f32,
    pub tones: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentChord {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub name: String,
    /// Beats from the start of the segment
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentChordVoicing {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub segment_chord_id: Uuid,
    pub instrument_type: InstrumentType,
    /// Comma separated notes
    pub notes: String,
}

impl SegmentChordVoicing {
    /// Whether any of the notes is tonal
    pub fn contains_any_valid_notes(&self) -> bool {
        crate::music::split_tones(&self.notes)
            .iter()
            .any(|n| !crate::music::Note::of(n).is_atonal())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SegmentMeme {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub name: String,
}

impl SegmentMeme {
    /// New meme with its name normalized
    pub fn new(segment_id: Uuid, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id,
            name: crate::meme::to_meme(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentMessageType {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMessage {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub message_type: SegmentMessageType,
    pub body: String,
}

impl SegmentMessage {
    pub fn new(segment_id: Uuid, message_type: SegmentMessageType, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id,
            message_type,
            body: body.into(),
        }
    }
}

/// Key/value note attached to a segment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub key: String,
    pub value: String,
}

impl SegmentMeta {
    pub fn new(segment_id: Uuid, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id,
            key: key.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Entity kinds
// ============================================================================

/// Kind of segment sub-entity, in commit order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Meme,
    Message,
    Meta,
    Chord,
    ChordVoicing,
    Choice,
    Arrangement,
    Pick,
}

impl EntityKind {
    /// Every kind, in the order sub-entities must be created
    pub const COMMIT_ORDER: [EntityKind; 8] = [
        EntityKind::Meme,
        EntityKind::Message,
        EntityKind::Meta,
        EntityKind::Chord,
        EntityKind::ChordVoicing,
        EntityKind::Choice,
        EntityKind::Arrangement,
        EntityKind::Pick,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Any segment sub-entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SegmentEntity {
    Meme(SegmentMeme),
    Message(SegmentMessage),
    Meta(SegmentMeta),
    Chord(SegmentChord),
    ChordVoicing(SegmentChordVoicing),
    Choice(SegmentChoice),
    Arrangement(SegmentChoiceArrangement),
    Pick(SegmentChoiceArrangementPick),
}

impl SegmentEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            SegmentEntity::Meme(_) => EntityKind::Meme,
            SegmentEntity::Message(_) => EntityKind::Message,
            SegmentEntity::Meta(_) => EntityKind::Meta,
            SegmentEntity::Chord(_) => EntityKind::Chord,
            SegmentEntity::ChordVoicing(_) => EntityKind::ChordVoicing,
            SegmentEntity::Choice(_) => EntityKind::Choice,
            SegmentEntity::Arrangement(_) => EntityKind::Arrangement,
            SegmentEntity::Pick(_) => EntityKind::Pick,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            SegmentEntity::Meme(e) => e.id,
            SegmentEntity::Message(e) => e.id,
            SegmentEntity::Meta(e) => e.id,
            SegmentEntity::Chord(e) => e.id,
            SegmentEntity::ChordVoicing(e) => e.id,
            SegmentEntity::Choice(e) => e.id,
            SegmentEntity::Arrangement(e) => e.id,
            SegmentEntity::Pick(e) => e.id,
        }
    }

    pub fn segment_id(&self) -> Uuid {
        match self {
            SegmentEntity::Meme(e) => e.segment_id,
            SegmentEntity::Message(e) => e.segment_id,
            SegmentEntity::Meta(e) => e.segment_id,
            SegmentEntity::Chord(e) => e.segment_id,
            SegmentEntity::ChordVoicing(e) => e.segment_id,
            SegmentEntity::Choice(e) => e.segment_id,
            SegmentEntity::Arrangement(e) => e.segment_id,
            SegmentEntity::Pick(e) => e.segment_id,
        }
    }
}

/// A concrete sub-entity type that converts to and from [`SegmentEntity`]
pub trait SubEntity: Clone + Into<SegmentEntity> {
    const KIND: EntityKind;

    /// Unwrap if `entity` is of this kind
    fn from_entity(entity: SegmentEntity) -> Option<Self>;

    fn entity_id(&self) -> Uuid;
}

macro_rules! sub_entity {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for SegmentEntity {
            fn from(entity: $ty) -> Self {
                SegmentEntity::$variant(entity)
            }
        }

        impl SubEntity for $ty {
            const KIND: EntityKind = EntityKind::$variant;

            fn from_entity(entity: SegmentEntity) -> Option<Self> {
                match entity {
                    SegmentEntity::$variant(e) => Some(e),
                    _ => None,
                }
            }

            fn entity_id(&self) -> Uuid {
                self.id
            }
        }
    };
}

sub_entity!(SegmentMeme, Meme);
sub_entity!(SegmentMessage, Message);
sub_entity!(SegmentMeta, Meta);
sub_entity!(SegmentChord, Chord);
sub_entity!(SegmentChordVoicing, ChordVoicing);
sub_entity!(SegmentChoice, Choice);
sub_entity!(SegmentChoiceArrangement, Arrangement);
sub_entity!(SegmentChoiceArrangementPick, Pick);

/// Keep only the entities of type `E`
pub fn entities_of<E: SubEntity>(entities: impl IntoIterator<Item = SegmentEntity>) -> Vec<E> {
    entities.into_iter().filter_map(E::from_entity).collect()
}
