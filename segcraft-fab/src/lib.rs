//! # segcraft-fab
//!
//! Fabrication core: given a chain, the segment to build and a read-only
//! catalog snapshot, answer every musical question needed to fill the segment
//! and stage the results for one atomic commit.
//!
//! **Components:**
//! - [`SegmentRetrospective`]: read-only history of the current main-program lineage
//! - [`SegmentWorkbench`]: staging and ordered commit of one segment
//! - [`Fabricator`]: the orchestrator composing both with the catalog
//!
//! One fabricator per segment. Fabricators for different segments may run on
//! different threads, sharing the catalog behind an `Arc`.

pub mod error;
pub mod fabricator;
pub mod retrospective;
pub mod workbench;

pub use error::{FabricationError, Result};
pub use fabricator::Fabricator;
pub use retrospective::SegmentRetrospective;
pub use workbench::SegmentWorkbench;
