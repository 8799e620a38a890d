//! Segment fabricator
//!
//! **Module Structure:**
//! - `core.rs`: Construction, caches, template bindings, messages, commit
//! - `segment_type.rs`: Segment type state machine, continuation lookups
//! - `sequences.rs`: Programs, sequences, bindings, offsets, patterns
//! - `harmony.rs`: Chords, voicings, note ranges, transposition
//! - `arrangement.rs`: Arrangements, picks, preferred audio, volume
//! - `memes.rs`: Meme-gated staging and isometry
//! - `sticky_bun.rs`: Sticky bun lookup and persistence
//! - `timing.rs`: Beat-to-microsecond conversion

mod arrangement;
mod core;
mod harmony;
mod memes;
mod segment_type;
mod sequences;
mod sticky_bun;
mod timing;

pub use self::core::Fabricator;
