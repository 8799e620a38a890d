//! Chains, segments and segment sub-entities, with their persistence contract

pub mod entities;
pub mod store;

pub use entities::*;
pub use store::*;
