use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Random Source - drives the cheat-move rule
// ============================================================================
//
// Every Game owns its own source, handed in at construction. Nothing here is
// global, so replay and tests stay deterministic.
//
// ============================================================================

pub trait RandomSource: Send + fmt::Debug {
    /// Uniform sample in [0, 1)
    fn next_f64(&mut self) -> f64;
}

/// Builds a fresh source for each aggregate instance
pub type RandomSourceFactory = Arc<dyn Fn() -> Box<dyn RandomSource> + Send + Sync>;

#[derive(Debug)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn factory() -> RandomSourceFactory {
        Arc::new(|| Box::new(StdRandom::new()) as Box<dyn RandomSource>)
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Always returns the same sample
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl FixedRandom {
    pub fn factory(sample: f64) -> RandomSourceFactory {
        Arc::new(move || Box::new(FixedRandom(sample)) as Box<dyn RandomSource>)
    }
}

impl RandomSource for FixedRandom {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sources_repeat() {
        let mut a = StdRandom::seeded(42);
        let mut b = StdRandom::seeded(42);

        for _ in 0..16 {
            let sample = a.next_f64();
            assert!((0.0..1.0).contains(&sample));
            assert_eq!(sample, b.next_f64());
        }
    }

    #[test]
    fn test_fixed_factory_builds_independent_sources() {
        let factory = FixedRandom::factory(0.25);
        let mut first = factory();
        let mut second = factory();

        assert_eq!(first.next_f64(), 0.25);
        assert_eq!(second.next_f64(), 0.25);
    }
}
