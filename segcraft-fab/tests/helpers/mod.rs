//! Test helpers for segcraft-fab integration tests
//!
//! Provides reusable fixtures:
//! - Catalog: a small macro/main/beat catalog with voices, chords and audio
//! - ChainFixture: a chain on an in-memory segment store, plus segment setup

#![allow(dead_code)]

pub mod catalog;
pub mod chain;

pub use catalog::Catalog;
pub use chain::{choice_of, ChainFixture};
