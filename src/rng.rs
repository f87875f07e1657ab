//! A deterministic, seedable uniform sampler.
//!
//! `RngStream` wraps `rand`'s `StdRng` the way the AIs in this crate's
//! lineage seed their own randomness (`StdRng::seed_from_u64`), so that a
//! simulator built with a given seed replays identically no matter what else
//! is going on around it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// An exclusively-owned, reproducible stream of uniform draws.
///
/// Two streams seeded with the same `u64` produce identical sequences. A
/// stream is meant to be owned by exactly one simulator; sharing it between
/// two consumers silently breaks reproducibility, since draws interleave in
/// whatever order the consumers happen to run.
pub struct RngStream {
    rng: StdRng,
}

impl RngStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A uniform draw in `[0, 1)`.
    pub fn uniform_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Picks an index into `weights` by cumulative distribution, using a
    /// single `uniform_f64()` draw. `weights` need not be pre-normalized;
    /// the last bucket absorbs any floating-point drift so this always
    /// returns a valid index for a non-empty slice.
    pub fn choice_by_weights(&mut self, weights: &[f64]) -> usize {
        assert!(!weights.is_empty(), "choice_by_weights on empty weights");
        let total: f64 = weights.iter().sum();
        let u = self.uniform_f64() * total;
        let mut cumulative = 0.0;
        for (i, w) in weights.iter().enumerate() {
            cumulative += w;
            if u < cumulative {
                return i;
            }
        }
        weights.len() - 1
    }

    /// Derives a fresh, independently-seeded child stream. Useful for
    /// handing an isolated RNG to a sub-component without disturbing the
    /// parent's own draw sequence.
    pub fn split(&mut self) -> RngStream {
        let seed = self.rng.gen::<u64>();
        RngStream::new(seed)
    }
}
