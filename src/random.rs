//! Seeded RNG construction shared by all stochastic components.
//!
//! Every randomized search in this crate (GA, NSGA-II, ML exploration,
//! Monte Carlo) takes an explicit seed so that identical seed + identical
//! inputs produce bit-identical output schedules. ChaCha8 is used because
//! its stream is stable across platforms and rand versions, unlike
//! `StdRng` whose backing algorithm is unspecified.

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Creates a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Resolves an optional caller seed into a concrete one.
///
/// When no seed is supplied, a random one is drawn and logged so the run
/// can be reproduced after the fact.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(s) => s,
        None => {
            let s: u64 = rand::random();
            tracing::info!(seed = s, "no seed supplied; generated one for reproducibility");
            s
        }
    }
}
