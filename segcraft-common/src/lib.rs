//! # Segcraft Common Library
//!
//! Shared code for the segment fabrication engine including:
//! - Catalog ("source material") entities and the read contract
//! - Chain/segment entities and the persistence contract
//! - Template configuration loading
//! - Meme constraint evaluation and scoring
//! - Weighted random selection
//! - Pitch math (notes, chords, ranges, sticky buns)
//! - Timing utilities

pub mod config;
pub mod content;
pub mod error;
pub mod marble_bag;
pub mod meme;
pub mod music;
pub mod segment;
pub mod timing;

pub use config::TemplateConfig;
pub use error::{Error, Result};
pub use marble_bag::MarbleBag;
