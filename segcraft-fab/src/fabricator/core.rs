//! Core fabricator - construction, caches, messages and commit
//!
//! **Responsibilities:**
//! - Fabricator struct definition and initialization
//! - Template configuration and direct template bindings
//! - Per-pass selection caches with typed keys
//! - Segment messages, report, header updates and final commit

use crate::error::{FabricationError, Result};
use crate::retrospective::SegmentRetrospective;
use crate::workbench::SegmentWorkbench;
use rand::rngs::StdRng;
use rand::SeedableRng;
use segcraft_common::content::{
    ContentBindingType, Instrument, InstrumentAudio, InstrumentType, Program,
    ProgramSequenceChord, SourceMaterial,
};
use segcraft_common::music::{Note, NoteRange};
use segcraft_common::segment::{
    Chain, Segment, SegmentChoiceArrangementPick, SegmentChord, SegmentChordVoicing,
    SegmentMessage, SegmentMessageType, SegmentStore, SegmentType,
};
use segcraft_common::timing::NANOS_PER_MICRO;
use segcraft_common::TemplateConfig;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Separator between parts of a generated ship key
const NAME_SEPARATOR: &str = "-";

// ============================================================================
// Cache keys
// ============================================================================

/// Preferred audio is remembered per program voice and event name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct VoiceTrackKey {
    pub(super) voice_id: Option<Uuid>,
    pub(super) event: String,
}

/// Octave shift for one instrument type between two ranges
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct RangeShiftKey {
    pub(super) instrument_type: InstrumentType,
    pub(super) source: NoteRange,
    pub(super) target: NoteRange,
}

/// Semitone shift for one instrument type between two chords
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct TargetShiftKey {
    pub(super) instrument_type: InstrumentType,
    pub(super) from_chord: String,
    pub(super) to_chord: String,
}

/// Root note of a voicing for a chord
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct RootNoteKey {
    pub(super) voicing_notes: String,
    pub(super) chord: String,
}

/// Beat position usable as a map key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct PositionKey(u64);

impl PositionKey {
    pub(super) fn of(position: f64) -> Self {
        PositionKey(position.to_bits())
    }
}

/// Selections and derived values cached for one fabrication pass
///
/// Within a pass, the same logical decision always gets the same answer.
#[derive(Debug, Default)]
pub(super) struct FabricationCache {
    /// Randomly selected sequence per choice
    pub(super) sequence_for_choice: HashMap<Uuid, Option<Uuid>>,
    /// Randomly selected binding per (program, offset)
    pub(super) binding_at_offset: HashMap<(Uuid, i32), Option<Uuid>>,
    /// Randomly selected pattern per (choice, pattern type)
    pub(super) pattern_for_choice:
        HashMap<(Uuid, segcraft_common::content::ProgramSequencePatternType), Option<Uuid>>,
    /// Randomly selected voicing per (segment chord, instrument type)
    pub(super) voicing_for_chord: HashMap<(Uuid, InstrumentType), Option<SegmentChordVoicing>>,
    pub(super) chord_at: HashMap<PositionKey, Option<SegmentChord>>,
    pub(super) complete_chords: HashMap<Uuid, Vec<ProgramSequenceChord>>,
    pub(super) program_range: HashMap<(Uuid, InstrumentType), NoteRange>,
    pub(super) range_shift: HashMap<RangeShiftKey, i32>,
    pub(super) target_shift: HashMap<TargetShiftKey, i32>,
    pub(super) voicing_note_range: HashMap<InstrumentType, NoteRange>,
    pub(super) root_note: HashMap<RootNoteKey, Option<Note>>,
    pub(super) picks_for_choice: HashMap<Uuid, Vec<SegmentChoiceArrangementPick>>,
    pub(super) audio_volume: HashMap<Uuid, f32>,
    pub(super) distinct_voicing_types: Option<BTreeSet<InstrumentType>>,
    pub(super) micros_per_beat: Option<f64>,
}

impl FabricationCache {
    /// Forget everything derived from staged chords and voicings
    pub(super) fn invalidate_harmony(&mut self) {
        self.chord_at.clear();
        self.voicing_note_range.clear();
        self.voicing_for_chord.clear();
    }

    /// Forget everything derived from staged arrangements and picks
    pub(super) fn invalidate_picks(&mut self) {
        self.picks_for_choice.clear();
        self.audio_volume.clear();
    }
}

// ============================================================================
// Fabricator
// ============================================================================

/// Orchestrates the fabrication of one segment
///
/// Owns the workbench and retrospective for the pass and shares the catalog
/// snapshot read-only. Not `Sync`-shared: one fabricator per segment, per
/// thread.
pub struct Fabricator {
    pub(super) source: Arc<dyn SourceMaterial>,
    pub(super) chain: Chain,
    pub(super) template_config: TemplateConfig,
    pub(super) retrospective: SegmentRetrospective,
    pub(super) workbench: SegmentWorkbench,
    pub(super) bound_program_ids: HashSet<Uuid>,
    pub(super) bound_instrument_ids: HashSet<Uuid>,
    pub(super) preferred_audios: HashMap<VoiceTrackKey, Uuid>,
    pub(super) segment_type: Option<SegmentType>,
    pub(super) cache: FabricationCache,
    pub(super) rng: StdRng,
    pub(super) started_at: Instant,
}

impl Fabricator {
    /// Compose a fabricator from its collaborators
    ///
    /// **Algorithm:**
    /// 1. Parse the chain's template config (unparseable → fatal).
    /// 2. Collect directly bound program and instrument ids.
    /// 3. Seed preferred audios from the retrospective's picks.
    /// 4. Give the segment a storage key if it has none.
    pub fn new(
        source: Arc<dyn SourceMaterial>,
        chain: Chain,
        retrospective: SegmentRetrospective,
        workbench: SegmentWorkbench,
    ) -> Result<Self> {
        let template_config = TemplateConfig::from_toml_str(&chain.template_config).map_err(|e| {
            FabricationError::fatal(format!("Failed to read template config of Chain[{}]: {}", chain.id, e))
        })?;

        let mut bound_program_ids = HashSet::new();
        let mut bound_instrument_ids = HashSet::new();
        for binding in source.template_bindings() {
            match binding.binding_type {
                ContentBindingType::Program => {
                    bound_program_ids.insert(binding.target_id);
                }
                ContentBindingType::Instrument => {
                    bound_instrument_ids.insert(binding.target_id);
                }
                ContentBindingType::Library => {}
            }
        }

        debug!(
            segment_id = %workbench.segment().id,
            chain_id = %chain.id,
            bound_programs = bound_program_ids.len(),
            bound_instruments = bound_instrument_ids.len(),
            "Chain configured"
        );

        let mut fabricator = Self {
            source,
            chain,
            template_config,
            retrospective,
            workbench,
            bound_program_ids,
            bound_instrument_ids,
            preferred_audios: HashMap::new(),
            segment_type: None,
            cache: FabricationCache::default(),
            rng: StdRng::from_entropy(),
            started_at: Instant::now(),
        };

        fabricator.preferred_audios = fabricator.compute_preferred_audios();
        fabricator.ensure_ship_key();

        Ok(fabricator)
    }

    /// Read the segment, its chain and history from the store, then compose
    ///
    /// # Errors
    /// - `Fatal` if the segment or chain does not exist, or history is broken
    /// - `Transient` if the store is unavailable
    pub fn load(
        source: Arc<dyn SourceMaterial>,
        store: Arc<dyn SegmentStore>,
        segment_id: Uuid,
    ) -> Result<Self> {
        let segment = store
            .read_segment(segment_id)?
            .ok_or_else(|| FabricationError::fatal(format!("Found no Segment[{}]", segment_id)))?;
        let chain = store.read_chain(segment.chain_id)?.ok_or_else(|| {
            FabricationError::fatal(format!("Found no Chain[{}] for Segment[{}]", segment.chain_id, segment_id))
        })?;

        let retrospective = SegmentRetrospective::load(store.as_ref(), &segment)?;
        let workbench = SegmentWorkbench::new(store, segment)?;

        Self::new(source, chain, retrospective, workbench)
    }

    /// Replace the random source with a seeded one, for reproducible passes
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn template_config(&self) -> &TemplateConfig {
        &self.template_config
    }

    pub fn source(&self) -> &dyn SourceMaterial {
        self.source.as_ref()
    }

    pub fn retrospective(&self) -> &SegmentRetrospective {
        &self.retrospective
    }

    pub fn workbench(&self) -> &SegmentWorkbench {
        &self.workbench
    }

    /// The segment under construction
    pub fn segment(&self) -> &Segment {
        self.workbench.segment()
    }

    /// Microseconds since this fabricator was created
    pub fn elapsed_micros(&self) -> u64 {
        (self.started_at.elapsed().as_nanos() / NANOS_PER_MICRO) as u64
    }

    // ========================================================================
    // Template bindings
    // ========================================================================

    pub fn is_directly_bound_program(&self, program: &Program) -> bool {
        self.bound_program_ids.contains(&program.id)
    }

    pub fn is_directly_bound_instrument(&self, instrument: &Instrument) -> bool {
        self.bound_instrument_ids.contains(&instrument.id)
    }

    /// An audio is bound through its instrument
    pub fn is_directly_bound_audio(&self, audio: &InstrumentAudio) -> bool {
        self.bound_instrument_ids.contains(&audio.instrument_id)
    }

    // ========================================================================
    // Messages and report
    // ========================================================================

    pub fn add_message(&mut self, message_type: SegmentMessageType, body: impl Into<String>) {
        let message = SegmentMessage::new(self.segment().id, message_type, body);
        self.workbench.put(message);
    }

    pub fn add_error_message(&mut self, body: impl Into<String>) {
        self.add_message(SegmentMessageType::Error, body);
    }

    pub fn add_warning_message(&mut self, body: impl Into<String>) {
        self.add_message(SegmentMessageType::Warning, body);
    }

    pub fn add_info_message(&mut self, body: impl Into<String>) {
        self.add_message(SegmentMessageType::Info, body);
    }

    /// Record a report entry, flushed as a DEBUG message on commit
    pub fn put_report(&mut self, key: impl Into<String>, value: impl Display) {
        self.workbench.put_report(key, value);
    }

    // ========================================================================
    // Segment header and commit
    // ========================================================================

    /// Persist a new segment header now and keep it on the workbench
    pub fn update_segment(&mut self, segment: Segment) -> Result<()> {
        self.workbench.update_segment(segment).map_err(|e| {
            warn!(segment_id = %self.segment().id, error = %e, "Failed to update segment");
            e
        })
    }

    /// Commit everything staged during this pass
    pub fn done(&mut self) -> Result<()> {
        self.put_report("elapsedMicros", self.elapsed_micros());
        self.workbench.done()
    }

    /// Storage key: chain ship key (or `chain-<id>`) plus segment begin time
    fn compute_ship_key(&self) -> String {
        let chain_name = match self.chain.ship_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => format!("chain{}{}", NAME_SEPARATOR, self.chain.id),
        };
        format!(
            "{}{}{}",
            chain_name,
            NAME_SEPARATOR,
            self.segment().begin_at_chain_micros
        )
    }

    fn ensure_ship_key(&mut self) {
        let missing = self
            .segment()
            .storage_key
            .as_deref()
            .map_or(true, str::is_empty);
        if missing {
            let mut segment = self.segment().clone();
            segment.storage_key = Some(self.compute_ship_key());
            debug!(
                segment_id = %segment.id,
                storage_key = ?segment.storage_key,
                "Generated ship key"
            );
            self.workbench.set_segment(segment);
        }
    }
}
