//! Chain fixture on an in-memory segment store

use segcraft_common::content::{Program, ProgramSequenceBinding, SourceMaterial};
use segcraft_common::segment::{
    Chain, MemorySegmentStore, Segment, SegmentChoice, SegmentEntity, SegmentState, SegmentStore,
};
use segcraft_common::timing::now;
use segcraft_fab::{Fabricator, Result};
use std::sync::Arc;
use uuid::Uuid;

/// Beats per fixture segment
pub const SEGMENT_TOTAL: u32 = 16;

/// Chain begin offset between fixture segments (16 beats at 120 BPM)
pub const SEGMENT_MICROS: i64 = 8_000_000;

pub struct ChainFixture {
    pub store: Arc<MemorySegmentStore>,
    pub chain: Chain,
}

impl ChainFixture {
    pub fn new(template_config: &str) -> Self {
        Self::with_ship_key(template_config, Some("fireside"))
    }

    pub fn with_ship_key(template_config: &str, ship_key: Option<&str>) -> Self {
        let store = Arc::new(MemorySegmentStore::new());
        let chain = Chain {
            id: Uuid::new_v4(),
            name: "Test Chain".to_string(),
            ship_key: ship_key.map(str::to_string),
            template_config: template_config.to_string(),
        };
        store.put_chain(chain.clone()).unwrap();
        Self { store, chain }
    }

    /// Persist a planned segment at `offset` with the given delta
    pub fn segment(&self, offset: u32, delta: i32) -> Segment {
        let segment = Segment {
            id: Uuid::new_v4(),
            chain_id: self.chain.id,
            offset,
            state: SegmentState::Planned,
            begin_at_chain_micros: i64::from(offset) * SEGMENT_MICROS,
            key: "C".to_string(),
            total: SEGMENT_TOTAL,
            delta,
            created_at: now(),
            updated_at: now(),
            ..Segment::default()
        };
        self.store.put_segment(segment.clone()).unwrap();
        segment
    }

    /// Persist a choice of `program` (at `binding`, if any) on `segment`
    pub fn choose(
        &self,
        segment: &Segment,
        program: &Program,
        binding: Option<&ProgramSequenceBinding>,
    ) -> SegmentChoice {
        let choice = choice_of(segment, program, binding);
        self.persist(vec![choice.clone().into()]);
        choice
    }

    pub fn persist(&self, entities: Vec<SegmentEntity>) {
        self.store.create_all_sub_entities(&entities).unwrap();
    }

    /// Segment header as currently stored at `offset`
    pub fn store_segment_at(&self, offset: u32) -> Segment {
        self.store
            .read_segment_at_offset(self.chain.id, offset)
            .unwrap()
            .expect("segment at offset")
    }

    /// Fabricator for `segment`, seeded for reproducible picks
    pub fn fabricator(&self, source: Arc<dyn SourceMaterial>, segment: &Segment) -> Result<Fabricator> {
        Ok(Fabricator::load(source, self.store.clone(), segment.id)?.with_seed(42))
    }
}

/// Unpersisted choice of `program` on `segment`
pub fn choice_of(
    segment: &Segment,
    program: &Program,
    binding: Option<&ProgramSequenceBinding>,
) -> SegmentChoice {
    SegmentChoice {
        id: Uuid::new_v4(),
        segment_id: segment.id,
        program_type: Some(program.program_type),
        program_id: Some(program.id),
        program_sequence_binding_id: binding.map(|b| b.id),
        ..SegmentChoice::default()
    }
}
