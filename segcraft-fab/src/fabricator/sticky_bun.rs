//! Sticky buns
//!
//! **Responsibilities:**
//! - Look up the bun of an event: current segment, then previous segment
//! - Roll and stage a new bun when neither has one
//! - Render an event's atonal notes through its bun

use super::core::Fabricator;
use segcraft_common::music::{Note, StickyBun};
use segcraft_common::segment::SegmentMeta;
use tracing::warn;
use uuid::Uuid;

impl Fabricator {
    /// Sticky bun of a pattern event, if sticky buns are enabled
    ///
    /// **Algorithm:**
    /// 1. A bun in the current segment's metas is returned as is.
    /// 2. A bun in the previous segment's metas is staged on the current
    ///    segment, so the lineage keeps carrying it, and returned.
    /// 3. Otherwise a bun is rolled for the event's tones, staged and returned.
    ///
    /// Unreadable metas are reported and skipped. An unknown event yields an
    /// error message and `None`.
    pub fn sticky_bun(&mut self, event_id: Uuid) -> Option<StickyBun> {
        if !self.template_config.sticky_bun_enabled {
            return None;
        }
        let key = StickyBun::compute_meta_key(event_id);

        if let Some(meta) = self.workbench.segment_meta(&key) {
            match StickyBun::from_json(&meta.value) {
                Ok(bun) => return Some(bun),
                Err(e) => self.report_unreadable_bun("current", event_id, &e),
            }
        }

        if let Some(meta) = self.retrospective.previous_meta(&key).cloned() {
            match StickyBun::from_json(&meta.value) {
                Ok(bun) => {
                    self.put_sticky_bun(&bun);
                    return Some(bun);
                }
                Err(e) => self.report_unreadable_bun("previous", event_id, &e),
            }
        }

        let Some(event) = self.source.program_sequence_pattern_event(event_id).cloned() else {
            self.add_error_message(format!(
                "Failed to get StickyBun for Event[{}] because it does not exist",
                event_id
            ));
            return None;
        };

        let bun = StickyBun::new(event_id, &event.tone_list(), &mut self.rng);
        self.put_sticky_bun(&bun);
        Some(bun)
    }

    /// Notes of an event with each atonal note replaced by a voicing note
    ///
    /// Unchanged when the event has no bun.
    pub fn replace_atonal_notes(
        &mut self,
        event_id: Uuid,
        notes: &[Note],
        voicing_notes: &[Note],
    ) -> Vec<Note> {
        match self.sticky_bun(event_id) {
            Some(bun) => bun.replace_atonal(notes, voicing_notes),
            None => notes.to_vec(),
        }
    }

    fn put_sticky_bun(&mut self, bun: &StickyBun) {
        match bun.to_json() {
            Ok(json) => {
                let meta = SegmentMeta::new(self.segment().id, bun.meta_key(), json);
                self.put(meta);
            }
            Err(e) => self.add_error_message(format!(
                "Failed to serialize StickyBun for Event[{}]: {}",
                bun.event_id, e
            )),
        }
    }

    fn report_unreadable_bun(&mut self, which: &str, event_id: Uuid, err: &segcraft_common::Error) {
        warn!(
            segment_id = %self.segment().id,
            event_id = %event_id,
            error = %err,
            "Unreadable {} segment StickyBun meta", which
        );
        self.add_error_message(format!(
            "Failed to deserialize {} segment meta value StickyBun JSON for Event[{}]",
            which, event_id
        ));
    }
}
