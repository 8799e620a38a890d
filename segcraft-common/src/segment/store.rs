//! Segment persistence contract and in-memory implementation

use super::entities::*;
use crate::content::ProgramType;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Persistence failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot be reached right now; retrying may succeed
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The request itself is malformed or inconsistent
    #[error("Invalid: {0}")]
    Invalid(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read/write access to persisted chains, segments and their sub-entities
///
/// Writes for one segment id come from a single fabrication at a time; that
/// is arranged by the caller's scheduling, not by implementations.
pub trait SegmentStore: Send + Sync {
    fn read_chain(&self, chain_id: Uuid) -> StoreResult<Option<Chain>>;

    fn read_segment(&self, segment_id: Uuid) -> StoreResult<Option<Segment>>;

    /// All segments of a chain, ascending by offset
    fn read_all_segments(&self, chain_id: Uuid) -> StoreResult<Vec<Segment>>;

    /// First choice of the given program type in a segment
    fn read_choice(
        &self,
        segment_id: Uuid,
        program_type: ProgramType,
    ) -> StoreResult<Option<SegmentChoice>>;

    /// Sub-entities of one kind belonging to any of the given segments
    fn read_sub_entities(
        &self,
        segment_ids: &[Uuid],
        kind: EntityKind,
    ) -> StoreResult<Vec<SegmentEntity>>;

    /// Replace a segment header
    fn update_segment(&self, segment: &Segment) -> StoreResult<()>;

    /// Create sub-entities in the order given
    fn create_all_sub_entities(&self, entities: &[SegmentEntity]) -> StoreResult<()>;

    /// Delete sub-entities by kind and id
    fn delete_sub_entities(&self, entities: &[SegmentEntity]) -> StoreResult<()>;

    /// Segment of a chain at an offset
    fn read_segment_at_offset(&self, chain_id: Uuid, offset: u32) -> StoreResult<Option<Segment>> {
        Ok(self
            .read_all_segments(chain_id)?
            .into_iter()
            .find(|s| s.offset == offset))
    }
}

// ============================================================================
// MemorySegmentStore
// ============================================================================

#[derive(Debug, Default)]
struct Inner {
    chains: BTreeMap<Uuid, Chain>,
    segments: BTreeMap<Uuid, Segment>,
    entities: Vec<SegmentEntity>,
    /// Kinds in the order they were created, across all segments
    creation_log: Vec<EntityKind>,
}

/// In-memory segment store guarded by a `RwLock`
///
/// Can be switched to "unavailable" to exercise transient failure handling.
#[derive(Debug, Default)]
pub struct MemorySegmentStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemorySegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn put_chain(&self, chain: Chain) -> StoreResult<()> {
        self.write()?.chains.insert(chain.id, chain);
        Ok(())
    }

    pub fn put_segment(&self, segment: Segment) -> StoreResult<()> {
        self.write()?.segments.insert(segment.id, segment);
        Ok(())
    }

    /// Kinds of every created sub-entity, in creation order
    pub fn creation_log(&self) -> StoreResult<Vec<EntityKind>> {
        Ok(self.read()?.creation_log.clone())
    }

    /// Typed view of one segment's sub-entities
    pub fn sub_entities_of<E: SubEntity>(&self, segment_id: Uuid) -> StoreResult<Vec<E>> {
        Ok(entities_of(self.read_sub_entities(&[segment_id], E::KIND)?))
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.check_available()?;
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.check_available()?;
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl SegmentStore for MemorySegmentStore {
    fn read_chain(&self, chain_id: Uuid) -> StoreResult<Option<Chain>> {
        Ok(self.read()?.chains.get(&chain_id).cloned())
    }

    fn read_segment(&self, segment_id: Uuid) -> StoreResult<Option<Segment>> {
        Ok(self.read()?.segments.get(&segment_id).cloned())
    }

    fn read_all_segments(&self, chain_id: Uuid) -> StoreResult<Vec<Segment>> {
        let inner = self.read()?;
        let mut segments: Vec<Segment> = inner
            .segments
            .values()
            .filter(|s| s.chain_id == chain_id)
            .cloned()
            .collect();
        segments.sort_by_key(|s| s.offset);
        Ok(segments)
    }

    fn read_choice(
        &self,
        segment_id: Uuid,
        program_type: ProgramType,
    ) -> StoreResult<Option<SegmentChoice>> {
        let inner = self.read()?;
        Ok(inner.entities.iter().find_map(|entity| match entity {
            SegmentEntity::Choice(choice)
                if choice.segment_id == segment_id && choice.program_type == Some(program_type) =>
            {
                Some(choice.clone())
            }
            _ => None,
        }))
    }

    fn read_sub_entities(
        &self,
        segment_ids: &[Uuid],
        kind: EntityKind,
    ) -> StoreResult<Vec<SegmentEntity>> {
        let inner = self.read()?;
        Ok(inner
            .entities
            .iter()
            .filter(|e| e.kind() == kind && segment_ids.contains(&e.segment_id()))
            .cloned()
            .collect())
    }

    fn update_segment(&self, segment: &Segment) -> StoreResult<()> {
        let mut inner = self.write()?;
        match inner.segments.get_mut(&segment.id) {
            Some(existing) => {
                *existing = segment.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("Segment[{}]", segment.id))),
        }
    }

    fn create_all_sub_entities(&self, entities: &[SegmentEntity]) -> StoreResult<()> {
        let mut inner = self.write()?;
        for entity in entities {
            if !inner.segments.contains_key(&entity.segment_id()) {
                return Err(StoreError::Invalid(format!(
                    "{} {} references unknown Segment[{}]",
                    entity.kind(),
                    entity.id(),
                    entity.segment_id()
                )));
            }
        }
        for entity in entities {
            inner.creation_log.push(entity.kind());
            inner.entities.push(entity.clone());
        }
        debug!(count = entities.len(), "Created segment sub-entities");
        Ok(())
    }

    fn delete_sub_entities(&self, entities: &[SegmentEntity]) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.entities.retain(|existing| {
            !entities
                .iter()
                .any(|e| e.kind() == existing.kind() && e.id() == existing.id())
        });
        Ok(())
    }
}
