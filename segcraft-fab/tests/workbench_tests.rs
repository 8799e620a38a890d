//! Integration tests for segment workbench commits
//!
//! Tests verify that:
//! - Sub-entities are created in dependency order regardless of staging order
//! - Preloaded sub-entities are neither re-created nor lost
//! - Deleting a preloaded sub-entity removes it from the store on commit
//! - A store outage during commit surfaces as a retryable error
//! - Every header write stamps `updated_at` and keeps `created_at`

mod helpers;

use helpers::*;
use segcraft_common::segment::{
    EntityKind, SegmentChoiceArrangement, SegmentChoiceArrangementPick, SegmentChord, SegmentMeme,
    SegmentMeta, SegmentStore,
};
use segcraft_common::timing::now;
use segcraft_fab::SegmentWorkbench;
use std::sync::Arc;
use uuid::Uuid;

fn open(fixture: &ChainFixture, segment_id: Uuid) -> SegmentWorkbench {
    let segment = fixture.store.read_segment(segment_id).unwrap().unwrap();
    SegmentWorkbench::new(fixture.store.clone(), segment).unwrap()
}

#[test]
fn test_commit_order_independent_of_staging_order() {
    let catalog = Catalog::new();
    let fixture = ChainFixture::new("");
    let segment = fixture.segment(0, 0);
    let mut workbench = open(&fixture, segment.id);

    let choice = choice_of(&segment, &catalog.main_program, Some(&catalog.main_bindings[0]));
    let arrangement = SegmentChoiceArrangement {
        id: Uuid::new_v4(),
        segment_id: segment.id,
        segment_choice_id: choice.id,
    };
    let pick = SegmentChoiceArrangementPick {
        id: Uuid::new_v4(),
        segment_id: segment.id,
        segment_choice_arrangement_id: arrangement.id,
        instrument_audio_id: catalog.bass_audio.id,
        event: "BASS".to_string(),
        ..SegmentChoiceArrangementPick::default()
    };

    workbench.put(pick);
    workbench.put(arrangement);
    workbench.put(choice);
    workbench.put(SegmentChord {
        id: Uuid::new_v4(),
        segment_id: segment.id,
        name: "C".to_string(),
        position: 0.0,
    });
    workbench.put(SegmentMeme::new(segment.id, "Cozy"));
    workbench.done().unwrap();

    assert_eq!(
        fixture.store.creation_log().unwrap(),
        vec![
            EntityKind::Meme,
            EntityKind::Chord,
            EntityKind::Choice,
            EntityKind::Arrangement,
            EntityKind::Pick,
        ]
    );
}

#[test]
fn test_preloaded_entities_are_not_recreated() {
    let catalog = Catalog::new();
    let fixture = ChainFixture::new("");
    let segment = fixture.segment(0, 0);
    let choice = fixture.choose(&segment, &catalog.main_program, Some(&catalog.main_bindings[0]));

    let mut workbench = open(&fixture, segment.id);
    assert_eq!(workbench.choices(), vec![choice]);

    workbench.put(SegmentMeme::new(segment.id, "cozy"));
    workbench.done().unwrap();

    assert_eq!(
        fixture.store.creation_log().unwrap(),
        vec![EntityKind::Choice, EntityKind::Meme]
    );
}

#[test]
fn test_delete_preloaded_entity() {
    let fixture = ChainFixture::new("");
    let segment = fixture.segment(0, 0);
    let meta = SegmentMeta::new(segment.id, "StickyBun_old", "{}");
    fixture.persist(vec![meta.clone().into()]);

    let mut workbench = open(&fixture, segment.id);
    assert_eq!(workbench.metas().len(), 1);
    workbench.delete(&meta);
    assert!(workbench.metas().is_empty());
    workbench.done().unwrap();

    let stored: Vec<SegmentMeta> = fixture.store.sub_entities_of(segment.id).unwrap();
    assert!(stored.is_empty());
}

#[test]
fn test_meta_overwrite_replaces_persisted_meta() {
    let fixture = ChainFixture::new("");
    let segment = fixture.segment(0, 0);
    fixture.persist(vec![SegmentMeta::new(segment.id, "key", "old").into()]);

    let mut workbench = open(&fixture, segment.id);
    workbench.put(SegmentMeta::new(segment.id, "key", "new"));
    workbench.done().unwrap();

    let stored: Vec<SegmentMeta> = fixture.store.sub_entities_of(segment.id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].value, "new");
}

#[test]
fn test_commit_on_unavailable_store_is_transient() {
    let fixture = ChainFixture::new("");
    let segment = fixture.segment(0, 0);
    let mut workbench = open(&fixture, segment.id);
    workbench.put(SegmentMeme::new(segment.id, "cozy"));

    fixture.store.set_unavailable(true);
    let err = workbench.done().unwrap_err();
    assert!(err.is_retryable());

    // Nothing was lost; the retry commits it
    fixture.store.set_unavailable(false);
    workbench.done().unwrap();
    let memes: Vec<SegmentMeme> = fixture.store.sub_entities_of(segment.id).unwrap();
    assert_eq!(memes.len(), 1);
}

#[test]
fn test_workbench_shares_store_handle() {
    let fixture = ChainFixture::new("");
    let segment = fixture.segment(0, 0);
    let store: Arc<dyn SegmentStore> = fixture.store.clone();

    let mut workbench = SegmentWorkbench::new(store, segment.clone()).unwrap();
    let mut updated = segment.clone();
    updated.key = "Eb".to_string();
    workbench.update_segment(updated).unwrap();

    assert_eq!(fixture.store_segment_at(0).key, "Eb");
}

#[test]
fn test_done_stamps_updated_at() {
    let fixture = ChainFixture::new("");
    let segment = fixture.segment(0, 0);
    let mut workbench = open(&fixture, segment.id);

    let before = now();
    workbench.done().unwrap();

    let stored = fixture.store_segment_at(0);
    assert!(stored.updated_at >= before);
    assert_eq!(stored.created_at, segment.created_at);
    assert_eq!(workbench.segment().updated_at, stored.updated_at);
}

#[test]
fn test_update_segment_stamps_updated_at() {
    let fixture = ChainFixture::new("");
    let segment = fixture.segment(0, 0);
    let mut workbench = open(&fixture, segment.id);

    let mut updated = segment.clone();
    updated.updated_at = Default::default();
    let before = now();
    workbench.update_segment(updated).unwrap();

    let stored = fixture.store_segment_at(0);
    assert!(stored.updated_at >= before);
    assert_eq!(stored.created_at, segment.created_at);
    assert_eq!(workbench.segment().updated_at, stored.updated_at);
}
