//! Pitch math for voicing and range fitting

pub mod chord;
pub mod note;
pub mod note_range;
pub mod sticky_bun;

pub use chord::*;
pub use note::*;
pub use note_range::*;
pub use sticky_bun::*;
