//! Spawn Random Number Generator
//!
//! Picks where newly admitted players appear. Seeded from OS entropy unless
//! `PRESENCE_SPAWN_SEED` fixes it, so tests can reproduce positions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::bounds::Rect;

/// PRNG used to place newly admitted players.
///
/// # Example
///
/// ```
/// use presence::core::bounds::SPAWN_AREA;
/// use presence::core::rng::SpawnRng;
///
/// let mut a = SpawnRng::new(12345);
/// let mut b = SpawnRng::new(12345);
/// assert_eq!(a.point_in(&SPAWN_AREA), b.point_in(&SPAWN_AREA));
/// ```
#[derive(Clone, Debug)]
pub struct SpawnRng {
    inner: StdRng,
}

impl SpawnRng {
    /// Create a reproducible RNG from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    /// Seed from `seed` when given, otherwise from OS entropy.
    pub fn from_seed_or_entropy(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(seed),
            None => Self::from_entropy(),
        }
    }

    /// Pick a whole-unit point uniformly inside `area`.
    ///
    /// Coordinates are floored, so the far edges are never produced. A
    /// degenerate axis yields its minimum.
    pub fn point_in(&mut self, area: &Rect) -> (f64, f64) {
        let x = self.axis(area.min_x, area.max_x);
        let y = self.axis(area.min_y, area.max_y);
        (x, y)
    }

    fn axis(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.inner.gen_range(min..max).floor()
    }
}
