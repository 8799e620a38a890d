//! Staging area for one segment under construction
//!
//! Everything a fabrication produces lands here first. Nothing reaches the
//! store until [`SegmentWorkbench::done`], which commits the segment header,
//! pending deletions, and then every new sub-entity in dependency order:
//!
//! ```text
//! memes → messages → metas → chords → chord voicings → choices → arrangements → picks
//! ```
//!
//! Arrangements reference choices and picks reference arrangements, so the
//! order holds no matter in which order the fabricator staged them.

use crate::error::Result;
use segcraft_common::content::ProgramType;
use segcraft_common::meme::to_meme;
use segcraft_common::timing::now;
use segcraft_common::segment::{
    EntityKind, Segment, SegmentChoice, SegmentChoiceArrangement, SegmentChoiceArrangementPick,
    SegmentChord, SegmentChordVoicing, SegmentEntity, SegmentMeme, SegmentMessage,
    SegmentMessageType, SegmentMeta, SegmentStore, SubEntity,
};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// In-memory staging for one segment and its sub-entities
pub struct SegmentWorkbench {
    store: Arc<dyn SegmentStore>,
    segment: Segment,
    /// Staged and preloaded sub-entities, in staging order
    entities: Vec<SegmentEntity>,
    /// Sub-entities already in the store
    persisted: HashSet<(EntityKind, Uuid)>,
    /// Persisted sub-entities removed since loading
    deleted: Vec<SegmentEntity>,
    report: BTreeMap<String, String>,
}

impl SegmentWorkbench {
    /// Open a workbench, preloading the segment's persisted sub-entities
    ///
    /// # Errors
    /// `Transient` if the store is unavailable.
    pub fn new(store: Arc<dyn SegmentStore>, segment: Segment) -> Result<Self> {
        let mut entities = Vec::new();
        for kind in EntityKind::COMMIT_ORDER {
            entities.extend(store.read_sub_entities(&[segment.id], kind)?);
        }
        let persisted = entities.iter().map(|e| (e.kind(), e.id())).collect();

        debug!(
            segment_id = %segment.id,
            preloaded = entities.len(),
            "Opened segment workbench"
        );

        Ok(Self {
            store,
            segment,
            entities,
            persisted,
            deleted: Vec::new(),
            report: BTreeMap::new(),
        })
    }

    // ========================================================================
    // Segment header
    // ========================================================================

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Replace the segment header (committed at `done()`)
    pub fn set_segment(&mut self, segment: Segment) {
        self.segment = segment;
    }

    /// Replace the segment header and persist it immediately
    ///
    /// `updated_at` is stamped with the current time.
    pub fn update_segment(&mut self, mut segment: Segment) -> Result<()> {
        segment.updated_at = now();
        self.store.update_segment(&segment)?;
        self.segment = segment;
        Ok(())
    }

    // ========================================================================
    // Staging
    // ========================================================================

    /// Stage a sub-entity
    ///
    /// - A meme whose normalized name is already staged is not added again;
    ///   the existing meme is returned instead.
    /// - A meta replaces any staged meta with the same key.
    /// - Anything else is staged as given.
    pub fn put<E: SubEntity>(&mut self, entity: E) -> E {
        match entity.clone().into() {
            SegmentEntity::Meme(meme) => {
                let name = to_meme(&meme.name);
                if let Some(existing) = self.memes().into_iter().find(|m| to_meme(&m.name) == name) {
                    return E::from_entity(existing.into()).unwrap_or(entity);
                }
            }
            SegmentEntity::Meta(meta) => {
                let replaced: Vec<SegmentMeta> = self
                    .metas()
                    .into_iter()
                    .filter(|m| m.key == meta.key)
                    .collect();
                for old in replaced {
                    self.delete(&old);
                }
            }
            _ => {}
        }

        self.entities.push(entity.clone().into());
        entity
    }

    /// Remove a staged or persisted sub-entity
    pub fn delete<E: SubEntity>(&mut self, entity: &E) {
        let key = (E::KIND, entity.entity_id());
        let before = self.entities.len();
        self.entities.retain(|e| (e.kind(), e.id()) != key);
        if before != self.entities.len() && self.persisted.remove(&key) {
            self.deleted.push(entity.clone().into());
        }
    }

    /// Accumulate a report entry, flushed as one DEBUG message at `done()`
    pub fn put_report(&mut self, key: impl Into<String>, value: impl Display) {
        self.report.insert(key.into(), value.to_string());
    }

    pub fn report(&self) -> &BTreeMap<String, String> {
        &self.report
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Every staged sub-entity of type `E`
    pub fn all<E: SubEntity>(&self) -> Vec<E> {
        self.entities
            .iter()
            .filter(|e| e.kind() == E::KIND)
            .cloned()
            .filter_map(E::from_entity)
            .collect()
    }

    pub fn choices(&self) -> Vec<SegmentChoice> {
        self.all()
    }

    pub fn arrangements(&self) -> Vec<SegmentChoiceArrangement> {
        self.all()
    }

    pub fn picks(&self) -> Vec<SegmentChoiceArrangementPick> {
        self.all()
    }

    /// Chords, ascending by position
    pub fn chords(&self) -> Vec<SegmentChord> {
        let mut chords: Vec<SegmentChord> = self.all();
        chords.sort_by(|a, b| a.position.total_cmp(&b.position));
        chords
    }

    pub fn chord_voicings(&self) -> Vec<SegmentChordVoicing> {
        self.all()
    }

    pub fn memes(&self) -> Vec<SegmentMeme> {
        self.all()
    }

    pub fn messages(&self) -> Vec<SegmentMessage> {
        self.all()
    }

    pub fn metas(&self) -> Vec<SegmentMeta> {
        self.all()
    }

    pub fn segment_meta(&self, key: &str) -> Option<SegmentMeta> {
        self.metas().into_iter().find(|m| m.key == key)
    }

    /// First choice of a program type
    pub fn choice_of_type(&self, program_type: ProgramType) -> Option<SegmentChoice> {
        self.choices()
            .into_iter()
            .find(|c| c.program_type == Some(program_type))
    }

    /// All choices of a program type
    pub fn choices_of_type(&self, program_type: ProgramType) -> Vec<SegmentChoice> {
        self.choices()
            .into_iter()
            .filter(|c| c.program_type == Some(program_type))
            .collect()
    }

    // ========================================================================
    // Commit
    // ========================================================================

    /// Commit the segment and everything staged since loading
    ///
    /// **Algorithm:**
    /// 1. Flush the report into one DEBUG message, then clear it.
    /// 2. Stamp `updated_at` and update the segment header.
    /// 3. Delete persisted sub-entities removed on this workbench.
    /// 4. Create new sub-entities in commit order (stable within a kind).
    ///
    /// Calling `done()` again only commits what was staged in between.
    ///
    /// # Errors
    /// Store failures propagate; nothing is retried here.
    pub fn done(&mut self) -> Result<()> {
        if !self.report.is_empty() {
            let body = self
                .report
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("\n");
            self.report.clear();
            self.put(SegmentMessage::new(self.segment.id, SegmentMessageType::Debug, body));
        }

        let segment_id = self.segment.id;
        let fail = |stage: &str, err: segcraft_common::segment::StoreError| {
            error!(segment_id = %segment_id, stage, error = %err, "Segment commit failed");
            err
        };

        self.segment.updated_at = now();
        self.store
            .update_segment(&self.segment)
            .map_err(|e| fail("update segment", e))?;

        if !self.deleted.is_empty() {
            self.store
                .delete_sub_entities(&self.deleted)
                .map_err(|e| fail("delete sub-entities", e))?;
            self.deleted.clear();
        }

        let mut created: Vec<SegmentEntity> = self
            .entities
            .iter()
            .filter(|e| !self.persisted.contains(&(e.kind(), e.id())))
            .cloned()
            .collect();
        created.sort_by_key(SegmentEntity::kind);

        if !created.is_empty() {
            self.store
                .create_all_sub_entities(&created)
                .map_err(|e| fail("create sub-entities", e))?;
        }

        let mut counts: BTreeMap<EntityKind, usize> = BTreeMap::new();
        for entity in &created {
            *counts.entry(entity.kind()).or_default() += 1;
            self.persisted.insert((entity.kind(), entity.id()));
        }

        debug!(
            segment_id = %segment_id,
            created = created.len(),
            counts = ?counts,
            "Committed segment workbench"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segcraft_common::segment::MemorySegmentStore;

    fn bench() -> (Arc<MemorySegmentStore>, SegmentWorkbench) {
        let store = Arc::new(MemorySegmentStore::new());
        let segment = Segment {
            id: Uuid::new_v4(),
            chain_id: Uuid::new_v4(),
            ..Segment::default()
        };
        store.put_segment(segment.clone()).unwrap();
        let workbench = SegmentWorkbench::new(store.clone(), segment).unwrap();
        (store, workbench)
    }

    #[test]
    fn test_duplicate_meme_returns_existing() {
        let (_, mut workbench) = bench();
        let segment_id = workbench.segment().id;
        let first = workbench.put(SegmentMeme::new(segment_id, "Cozy"));
        let second = workbench.put(SegmentMeme::new(segment_id, "COZY"));
        assert_eq!(first, second);
        assert_eq!(workbench.memes().len(), 1);
    }

    #[test]
    fn test_meta_with_same_key_overwrites() {
        let (_, mut workbench) = bench();
        let segment_id = workbench.segment().id;
        workbench.put(SegmentMeta::new(segment_id, "k", "first"));
        workbench.put(SegmentMeta::new(segment_id, "k", "second"));
        workbench.put(SegmentMeta::new(segment_id, "other", "x"));

        assert_eq!(workbench.metas().len(), 2);
        assert_eq!(workbench.segment_meta("k").map(|m| m.value), Some("second".to_string()));
    }

    #[test]
    fn test_report_flushed_as_debug_message() {
        let (store, mut workbench) = bench();
        let segment_id = workbench.segment().id;
        workbench.put_report("tempo", 120);
        workbench.put_report("key", "C");
        workbench.done().unwrap();

        assert!(workbench.report().is_empty());
        let messages: Vec<SegmentMessage> = store.sub_entities_of(segment_id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type, SegmentMessageType::Debug);
        assert_eq!(messages[0].body, "key: C\ntempo: 120");
    }

    #[test]
    fn test_done_twice_creates_nothing_new() {
        let (store, mut workbench) = bench();
        let segment_id = workbench.segment().id;
        workbench.put(SegmentMeme::new(segment_id, "cozy"));
        workbench.done().unwrap();
        workbench.done().unwrap();
        assert_eq!(store.creation_log().unwrap(), vec![EntityKind::Meme]);
    }

    #[test]
    fn test_choices_of_type() {
        let (_, mut workbench) = bench();
        let segment_id = workbench.segment().id;
        for program_type in [ProgramType::Main, ProgramType::Beat, ProgramType::Beat] {
            workbench.put(SegmentChoice {
                id: Uuid::new_v4(),
                segment_id,
                program_type: Some(program_type),
                ..SegmentChoice::default()
            });
        }
        assert!(workbench.choice_of_type(ProgramType::Main).is_some());
        assert!(workbench.choice_of_type(ProgramType::Macro).is_none());
        assert_eq!(workbench.choices_of_type(ProgramType::Beat).len(), 2);
    }
}
