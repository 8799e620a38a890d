//! Integration tests for the segment retrospective
//!
//! Tests verify that:
//! - The lineage covers only earlier segments with the previous main program
//! - Metas and choices are resolved against the previous segment
//! - Broken chain history is fatal

mod helpers;

use helpers::*;
use segcraft_common::content::{InstrumentType, ProgramType};
use segcraft_common::segment::{SegmentChoice, SegmentMeta, SegmentStore};
use segcraft_fab::SegmentRetrospective;
use uuid::Uuid;

fn load(fixture: &ChainFixture, offset: u32) -> segcraft_fab::Result<SegmentRetrospective> {
    let segment = fixture.store_segment_at(offset);
    SegmentRetrospective::load(fixture.store.as_ref(), &segment)
}

#[test]
fn test_first_segment_has_empty_retrospective() {
    let fixture = ChainFixture::new("");
    fixture.segment(0, 0);

    let retrospective = load(&fixture, 0).unwrap();
    assert!(retrospective.previous_segment().is_none());
    assert!(retrospective.segments().is_empty());
    assert!(retrospective.choices().is_empty());
}

#[test]
fn test_lineage_limited_to_previous_main_program() {
    let mut catalog = Catalog::new();
    let (other, other_bindings) = catalog.add_main_program("Overture", &[], &[0]);
    let fixture = ChainFixture::new("");

    let first = fixture.segment(0, 0);
    fixture.choose(&first, &other, Some(&other_bindings[0]));
    let second = fixture.segment(1, 0);
    fixture.choose(&second, &catalog.main_program, Some(&catalog.main_bindings[0]));
    let third = fixture.segment(2, 16);
    let main = fixture.choose(&third, &catalog.main_program, Some(&catalog.main_bindings[1]));
    fixture.segment(3, 32);

    let retrospective = load(&fixture, 3).unwrap();
    let offsets: Vec<u32> = retrospective.segments().iter().map(|s| s.offset).collect();
    assert_eq!(offsets, vec![1, 2]);
    assert_eq!(retrospective.previous_segment().map(|s| s.id), Some(third.id));
    assert_eq!(retrospective.choices().len(), 2);
    assert_eq!(retrospective.previous_choice_of_type(ProgramType::Main), Some(&main));
    assert!(retrospective.segment(first.id).is_none());
}

#[test]
fn test_lineage_stops_at_interrupting_main_program() {
    let mut catalog = Catalog::new();
    let (other, other_bindings) = catalog.add_main_program("Interlude", &[], &[0]);
    let fixture = ChainFixture::new("");

    // Fireside, Interlude, then Fireside again
    let first = fixture.segment(0, 0);
    fixture.choose(&first, &catalog.main_program, Some(&catalog.main_bindings[0]));
    let stale_bass = SegmentChoice {
        id: Uuid::new_v4(),
        segment_id: first.id,
        instrument_type: Some(InstrumentType::Bass),
        instrument_id: Some(catalog.bass_instrument.id),
        ..SegmentChoice::default()
    };
    fixture.persist(vec![stale_bass.clone().into()]);
    let second = fixture.segment(1, 0);
    fixture.choose(&second, &other, Some(&other_bindings[0]));
    let third = fixture.segment(2, 0);
    fixture.choose(&third, &catalog.main_program, Some(&catalog.main_bindings[0]));
    fixture.segment(3, 16);

    let retrospective = load(&fixture, 3).unwrap();
    let offsets: Vec<u32> = retrospective.segments().iter().map(|s| s.offset).collect();
    assert_eq!(offsets, vec![2]);
    assert_eq!(retrospective.choices().len(), 1);
    assert!(!retrospective.choices().contains(&stale_bass));
    assert!(retrospective
        .previous_choices_for_instrument(catalog.bass_instrument.id)
        .is_empty());
}

#[test]
fn test_previous_meta_comes_from_previous_segment_only() {
    let catalog = Catalog::new();
    let fixture = ChainFixture::new("");

    let first = fixture.segment(0, 0);
    fixture.choose(&first, &catalog.main_program, Some(&catalog.main_bindings[0]));
    fixture.persist(vec![SegmentMeta::new(first.id, "only-first", "1").into()]);
    let second = fixture.segment(1, 16);
    fixture.choose(&second, &catalog.main_program, Some(&catalog.main_bindings[1]));
    fixture.persist(vec![SegmentMeta::new(second.id, "shared", "2").into()]);
    fixture.segment(2, 32);

    let retrospective = load(&fixture, 2).unwrap();
    assert_eq!(
        retrospective.previous_meta("shared").map(|m| m.value.as_str()),
        Some("2")
    );
    assert!(retrospective.previous_meta("only-first").is_none());
}

#[test]
fn test_previous_picks_for_instrument() {
    let catalog = Catalog::new();
    let fixture = ChainFixture::new("");

    let first = fixture.segment(0, 0);
    fixture.choose(&first, &catalog.main_program, Some(&catalog.main_bindings[0]));
    let bass = SegmentChoice {
        id: Uuid::new_v4(),
        segment_id: first.id,
        instrument_type: Some(InstrumentType::Bass),
        instrument_id: Some(catalog.bass_instrument.id),
        ..SegmentChoice::default()
    };
    let arrangement = segcraft_common::segment::SegmentChoiceArrangement {
        id: Uuid::new_v4(),
        segment_id: first.id,
        segment_choice_id: bass.id,
    };
    let pick = segcraft_common::segment::SegmentChoiceArrangementPick {
        id: Uuid::new_v4(),
        segment_id: first.id,
        segment_choice_arrangement_id: arrangement.id,
        instrument_audio_id: catalog.bass_audio.id,
        event: "BASS".to_string(),
        ..Default::default()
    };
    fixture.persist(vec![bass.clone().into(), arrangement.into(), pick.clone().into()]);
    fixture.segment(1, 16);

    let retrospective = load(&fixture, 1).unwrap();
    assert_eq!(
        retrospective.previous_choice_of_instrument_type(InstrumentType::Bass),
        Some(&bass)
    );
    assert_eq!(
        retrospective.previous_picks_for_instrument(catalog.bass_instrument.id),
        vec![&pick]
    );
    assert!(retrospective
        .previous_picks_for_instrument(catalog.drum_instrument.id)
        .is_empty());
}

#[test]
fn test_missing_previous_segment_is_fatal() {
    let fixture = ChainFixture::new("");
    fixture.segment(2, 0);

    let err = load(&fixture, 2).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_previous_segment_without_main_choice_is_fatal() {
    let fixture = ChainFixture::new("");
    fixture.segment(0, 0);
    fixture.segment(1, 0);

    let err = load(&fixture, 1).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("no main choice"));
}

#[test]
fn test_unavailable_store_is_transient() {
    let catalog = Catalog::new();
    let fixture = ChainFixture::new("");
    let first = fixture.segment(0, 0);
    fixture.choose(&first, &catalog.main_program, Some(&catalog.main_bindings[0]));
    let second = fixture.segment(1, 0);

    fixture.store.set_unavailable(true);
    let store: &dyn SegmentStore = fixture.store.as_ref();
    let err = SegmentRetrospective::load(store, &second).unwrap_err();
    assert!(err.is_retryable());
}
