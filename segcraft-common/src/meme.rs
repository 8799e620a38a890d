//! Memes: thematic tags that keep successive segments coherent
//!
//! Every meme name entering the system (catalog, segment, candidate) passes
//! through [`to_meme`] first, so comparisons are always between canonical
//! tokens.
//!
//! # Prefixes
//!
//! - `$name` is exclusive: two identical `$name` memes may never co-occur.
//! - `!name` is a negation: it excludes `name`, and `name` excludes it.
//!
//! # Taxonomy
//!
//! A template may group memes into categories. At most one meme of a category
//! may be present in a stack. With an empty taxonomy only the prefix rules
//! apply.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Prefix marking a meme as exclusive
pub const EXCLUSIVE_PREFIX: char = '$';

/// Prefix marking a meme as the negation of its unprefixed form
pub const NEGATION_PREFIX: char = '!';

/// Normalize a raw meme name to its canonical token
///
/// Lowercase, with every run of non-alphanumeric characters collapsed to a
/// single `_` and no leading/trailing `_`. A leading `$` or `!` survives.
///
/// ```rust
/// use segcraft_common::meme::to_meme;
///
/// assert_eq!(to_meme("Buns and Jams"), "buns_and_jams");
/// assert_eq!(to_meme(" $Hot-Sauce "), "$hot_sauce");
/// assert_eq!(to_meme("!WINTER"), "!winter");
/// ```
pub fn to_meme(raw: &str) -> String {
    let trimmed = raw.trim();
    let (prefix, body) = match trimmed.chars().next() {
        Some(c) if c == EXCLUSIVE_PREFIX || c == NEGATION_PREFIX => (Some(c), &trimmed[1..]),
        _ => (None, trimmed),
    };

    let mut token = String::with_capacity(trimmed.len());
    if let Some(prefix) = prefix {
        token.push(prefix);
    }

    let mut pending_separator = false;
    for c in body.chars() {
        if c.is_alphanumeric() {
            if pending_separator && token.len() > prefix.map_or(0, char::len_utf8) {
                token.push('_');
            }
            pending_separator = false;
            token.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    token
}

/// Strip exclusive/negation prefixes from a token
fn body_of(token: &str) -> &str {
    token.trim_start_matches(&[EXCLUSIVE_PREFIX, NEGATION_PREFIX][..])
}

/// Pairwise prefix rules between two canonical tokens
fn prefix_conflict(a: &str, b: &str) -> bool {
    // Duplicate of an exclusive meme
    if a == b && a.starts_with(EXCLUSIVE_PREFIX) {
        return true;
    }
    // Explicit negation, either direction
    a.strip_prefix(NEGATION_PREFIX) == Some(b) || b.strip_prefix(NEGATION_PREFIX) == Some(a)
}

// ============================================================================
// Taxonomy
// ============================================================================

/// One category of mutually exclusive memes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeCategory {
    pub name: String,
    #[serde(default)]
    pub memes: Vec<String>,
}

impl MemeCategory {
    pub fn new(name: impl Into<String>, memes: &[&str]) -> Self {
        Self {
            name: name.into(),
            memes: memes.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Whether the (non-negated) token belongs to this category
    pub fn contains(&self, token: &str) -> bool {
        if token.starts_with(NEGATION_PREFIX) {
            return false;
        }
        let body = body_of(token);
        self.memes.iter().any(|m| body_of(&to_meme(m)) == body)
    }
}

/// Categories of mutually exclusive memes, configured per template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemeTaxonomy {
    categories: Vec<MemeCategory>,
}

impl MemeTaxonomy {
    pub fn new(categories: Vec<MemeCategory>) -> Self {
        Self { categories }
    }

    /// Taxonomy with no categories; only prefix rules apply
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> &[MemeCategory] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Name of the category containing this token, if any
    pub fn category_of(&self, token: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.contains(token))
            .map(|category| category.name.as_str())
    }

    /// Two distinct tokens from the same category may not co-occur
    fn conflict(&self, a: &str, b: &str) -> bool {
        if body_of(a) == body_of(b) {
            return false;
        }
        match (self.category_of(a), self.category_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

// ============================================================================
// MemeStack
// ============================================================================

/// Constraint evaluator over a set of already-committed memes
///
/// **Algorithm:** for a candidate set C against the stack S, every pair
/// (s, c) with s ∈ S, c ∈ C and every distinct pair within C is rejected if:
/// 1. both are the same `$`-prefixed token;
/// 2. one is `!` + the other;
/// 3. both belong to the same taxonomy category (distinct memes).
///
/// Anything else coexists.
#[derive(Debug, Clone)]
pub struct MemeStack<'a> {
    taxonomy: &'a MemeTaxonomy,
    memes: BTreeSet<String>,
}

impl<'a> MemeStack<'a> {
    /// Build a stack from existing meme names (normalized on the way in)
    pub fn from<I, S>(taxonomy: &'a MemeTaxonomy, memes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            taxonomy,
            memes: memes.into_iter().map(|m| to_meme(m.as_ref())).collect(),
        }
    }

    /// Whether all candidate memes may be added to this stack
    pub fn is_allowed<I, S>(&self, candidates: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates: Vec<String> = candidates
            .into_iter()
            .map(|c| to_meme(c.as_ref()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for (i, candidate) in candidates.iter().enumerate() {
            if self.memes.iter().any(|existing| self.conflict(existing, candidate)) {
                return false;
            }
            if candidates[i + 1..].iter().any(|other| self.conflict(candidate, other)) {
                return false;
            }
        }

        true
    }

    /// Whether the stack satisfies its own rules
    pub fn is_valid(&self) -> bool {
        let memes: Vec<&String> = self.memes.iter().collect();
        for (i, a) in memes.iter().enumerate() {
            if memes[i + 1..].iter().any(|b| self.conflict(a, b)) {
                return false;
            }
        }
        true
    }

    /// Sorted, `_`-joined rendering of the stack, for reports and messages
    pub fn constellation(&self) -> String {
        self.memes.iter().cloned().collect::<Vec<_>>().join("_")
    }

    pub fn memes(&self) -> &BTreeSet<String> {
        &self.memes
    }

    fn conflict(&self, a: &str, b: &str) -> bool {
        prefix_conflict(a, b) || self.taxonomy.conflict(a, b)
    }
}

// ============================================================================
// MemeIsometry
// ============================================================================

/// Thematic similarity of a target meme set to a source meme set
///
/// Score = (source tokens present in target) ÷ (source tokens), in [0, 1].
/// Ranks continuations; it never gates them (that is [`MemeStack`]'s job).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemeIsometry {
    sources: BTreeSet<String>,
}

impl MemeIsometry {
    pub fn of<I, S>(memes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            sources: memes.into_iter().map(|m| to_meme(m.as_ref())).collect(),
        }
    }

    /// Isometry with no sources; scores 0 against anything
    pub fn none() -> Self {
        Self::default()
    }

    pub fn add(&mut self, meme: &str) {
        self.sources.insert(to_meme(meme));
    }

    pub fn sources(&self) -> &BTreeSet<String> {
        &self.sources
    }

    pub fn score<I, S>(&self, targets: I) -> f64
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.sources.is_empty() {
            return 0.0;
        }
        let targets: BTreeSet<String> = targets.into_iter().map(|t| to_meme(t.as_ref())).collect();
        let matches = targets.iter().filter(|t| self.sources.contains(*t)).count();
        matches as f64 / self.sources.len() as f64
    }
}
