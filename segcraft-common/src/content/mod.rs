//! Content catalog: programs, instruments, and the read contract over them

pub mod entities;
pub mod store;

pub use entities::*;
pub use store::*;
