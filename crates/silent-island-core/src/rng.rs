//! Injectable randomness.
//!
//! Role shuffling and the deferred coin flip are the only random draws in the
//! game. Both go through [`RandomSource`] so a test can script them and a
//! seeded game replays exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Result of a fair binary draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinFace {
    /// The costly outcome.
    Heads,
    /// The lenient outcome.
    Tails,
}

/// Source of every random draw the engine makes.
pub trait RandomSource: Send {
    /// Flips a fair coin.
    fn coin_flip(&mut self) -> CoinFace;

    /// Returns a uniformly distributed index in `0..upper`. `upper` is never 0.
    fn index_below(&mut self, upper: usize) -> usize;

    /// Shuffles `items` in place (Fisher-Yates over [`Self::index_below`]).
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.index_below(i + 1);
            items.swap(i, j);
        }
    }
}

/// Deterministic ChaCha-backed source.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRandom {
    /// Creates a source from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Returns the seed this source was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn coin_flip(&mut self) -> CoinFace {
        if self.rng.gen_bool(0.5) {
            CoinFace::Heads
        } else {
            CoinFace::Tails
        }
    }

    fn index_below(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }
}
