//! Seeded uniform random numbers for lattice seeding.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A deterministic stream of uniform samples in `[0, 1)`.
///
/// The same seed always produces the same stream, so a run is reproducible
/// regardless of how many workers it uses.
#[derive(Debug, Clone)]
pub struct UniformSource {
    rng: StdRng,
}

impl UniformSource {
    /// Start a stream from `seed`.
    pub fn seed(seed: u64) -> Self {
        UniformSource {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next sample in `[0, 1)`.
    pub fn draw(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
