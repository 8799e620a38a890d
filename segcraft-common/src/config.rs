//! Template configuration
//!
//! A chain carries its template configuration as TOML text. Every key is
//! optional; anything missing falls back to [`TemplateConfig::default`].
//!
//! ```toml
//! main_program_length_max_delta = 280
//! sticky_bun_enabled = true
//! tempo_min = 60.0
//! tempo_max = 180.0
//!
//! [[meme_taxonomy]]
//! name = "SEASON"
//! memes = ["WINTER", "SPRING", "SUMMER", "FALL"]
//! ```

use crate::meme::MemeTaxonomy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Rules a chain's template applies to fabrication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Largest previous-segment delta for which a main program may continue
    pub main_program_length_max_delta: i32,
    /// Whether atonal events keep a persisted pseudo-random seed
    pub sticky_bun_enabled: bool,
    /// Lowest tempo (BPM) a segment may be fabricated at
    pub tempo_min: f64,
    /// Highest tempo (BPM) a segment may be fabricated at
    pub tempo_max: f64,
    pub buffer_ahead_seconds: u32,
    pub buffer_before_seconds: u32,
    /// Categories of mutually exclusive memes
    pub meme_taxonomy: MemeTaxonomy,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            main_program_length_max_delta: 280,
            sticky_bun_enabled: true,
            tempo_min: 1.0,
            tempo_max: 1000.0,
            buffer_ahead_seconds: 180,
            buffer_before_seconds: 5,
            meme_taxonomy: MemeTaxonomy::empty(),
        }
    }
}

impl TemplateConfig {
    /// Parse and validate template config TOML
    ///
    /// Blank text yields the default configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TemplateConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read template config TOML from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges and taxonomy consistency
    pub fn validate(&self) -> Result<()> {
        if !(self.tempo_min.is_finite() && self.tempo_min > 0.0) {
            return Err(Error::Config(format!(
                "tempo_min must be positive, got {}",
                self.tempo_min
            )));
        }
        if !self.tempo_max.is_finite() || self.tempo_min > self.tempo_max {
            return Err(Error::Config(format!(
                "tempo_min {} exceeds tempo_max {}",
                self.tempo_min, self.tempo_max
            )));
        }

        let mut names = HashSet::new();
        for category in self.meme_taxonomy.categories() {
            if !names.insert(category.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate meme taxonomy category: {}",
                    category.name
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for TemplateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = toml::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
