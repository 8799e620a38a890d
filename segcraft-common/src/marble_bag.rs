//! Weighted random selection
//!
//! A bag of marbles: every candidate is added with a weight, and a pick draws
//! one candidate with probability proportional to its weight. The random
//! source is supplied by the caller, so a seeded generator makes every pick
//! reproducible.
//!
//! An empty bag (or one whose weights are all non-positive) picks nothing;
//! that is an expected outcome, never an error.

use rand::Rng;

/// Weighted random picker
#[derive(Debug, Clone)]
pub struct MarbleBag<T> {
    marbles: Vec<(f64, T)>,
}

impl<T> Default for MarbleBag<T> {
    fn default() -> Self {
        Self { marbles: Vec::new() }
    }
}

impl<T: Clone> MarbleBag<T> {
    /// Create new empty bag
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a candidate with the given weight
    ///
    /// Non-positive and non-finite weights are ignored.
    pub fn add(&mut self, weight: f64, item: T) {
        if weight.is_finite() && weight > 0.0 {
            self.marbles.push((weight, item));
        }
    }

    /// Number of candidates with positive weight
    pub fn len(&self) -> usize {
        self.marbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marbles.is_empty()
    }

    /// Sum of all candidate weights
    pub fn total_weight(&self) -> f64 {
        self.marbles.iter().map(|(w, _)| w).sum()
    }

    /// Draw one candidate, weighted; `None` if the bag is empty
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        let total = self.total_weight();
        if self.marbles.is_empty() || total <= 0.0 {
            return None;
        }

        let mut x = rng.gen_range(0.0..total);
        for (weight, item) in &self.marbles {
            if x < *weight {
                return Some(item.clone());
            }
            x -= weight;
        }

        // Floating point leftovers land on the last marble
        self.marbles.last().map(|(_, item)| item.clone())
    }

    /// Draw from weighted candidates without keeping a bag around
    pub fn pick_from<R, I>(rng: &mut R, candidates: I) -> Option<T>
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = (f64, T)>,
    {
        let mut bag = Self::empty();
        for (weight, item) in candidates {
            bag.add(weight, item);
        }
        bag.pick(rng)
    }

    /// Draw uniformly (every candidate weight 1)
    pub fn quick_pick<R, I>(rng: &mut R, candidates: I) -> Option<T>
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = T>,
    {
        Self::pick_from(rng, candidates.into_iter().map(|item| (1.0, item)))
    }
}

impl<T: Clone> FromIterator<(f64, T)> for MarbleBag<T> {
    fn from_iter<I: IntoIterator<Item = (f64, T)>>(iter: I) -> Self {
        let mut bag = Self::empty();
        for (weight, item) in iter {
            bag.add(weight, item);
        }
        bag
    }
}
