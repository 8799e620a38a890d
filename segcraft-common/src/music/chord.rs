//! Chord names
//!
//! Only the parts of a chord name that pitch math needs are parsed: the root,
//! the description after it, and the optional slash (bass) root.

use super::note::PitchClass;
use std::fmt;

/// Names that mean "no chord here"
const NO_CHORD_NAMES: [&str; 3] = ["NC", "N.C.", "(None)"];

/// A parsed chord name such as `"Cm7/G"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    name: String,
    root: PitchClass,
    description: String,
    slash_root: PitchClass,
}

impl Chord {
    /// Parse a chord name
    ///
    /// The slash root defaults to the root when no `/` bass note is given.
    ///
    /// ```rust
    /// use segcraft_common::music::{Chord, PitchClass};
    ///
    /// let chord = Chord::of("Cm7/G");
    /// assert_eq!(chord.root(), PitchClass::C);
    /// assert_eq!(chord.description(), "m7");
    /// assert_eq!(chord.slash_root(), PitchClass::G);
    ///
    /// assert_eq!(Chord::of("F#").slash_root(), PitchClass::Fs);
    /// assert!(!Chord::of("NC").is_present());
    /// ```
    pub fn of(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || NO_CHORD_NAMES.contains(&name) {
            return Self::none();
        }

        let (body, slash) = match name.rsplit_once('/') {
            Some((body, bass)) => (body, Some(bass)),
            None => (name, None),
        };

        let (root, description) = PitchClass::parse_prefix(body);
        let slash_root = slash
            .map(|bass| PitchClass::parse_prefix(bass.trim()).0)
            .filter(|pc| !pc.is_none())
            .unwrap_or(root);

        Self {
            name: name.to_string(),
            root,
            description: description.trim().to_string(),
            slash_root,
        }
    }

    /// The absence of a chord
    pub fn none() -> Self {
        Self {
            name: String::new(),
            root: PitchClass::None,
            description: String::new(),
            slash_root: PitchClass::None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Bass root, which is the root unless a `/` note was given
    pub fn slash_root(&self) -> PitchClass {
        self.slash_root
    }

    /// Whether this chord has a root at all
    pub fn is_present(&self) -> bool {
        !self.root.is_none()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
