//! Injectable randomness.
//!
//! Every implementation is `Send + Sync` so one source can be shared by all
//! request tasks.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform samples.
pub trait RandomSource: Send + Sync {
    /// Uniform sample in `[0, 1)`.
    fn next_f64(&self) -> f64;

    /// Uniform integer in `[low, high)`. Returns `low` when the range is empty.
    fn range_u64(&self, low: u64, high: u64) -> u64;
}

/// Thread-local generator; each worker thread draws from its own RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRng;

impl RandomSource for ThreadRng {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn range_u64(&self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        rand::thread_rng().gen_range(low..high)
    }
}

/// Seeded generator shared behind a mutex, for reproducible runs.
#[derive(Debug)]
pub struct SeededRng {
    inner: Mutex<StdRng>,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRng {
    fn next_f64(&self) -> f64 {
        // A poisoned lock still holds a usable generator.
        let mut rng = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen::<f64>()
    }

    fn range_u64(&self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        let mut rng = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(low..high)
    }
}

/// Deterministic source returning the same sample every time.
///
/// `range_u64` maps the sample onto the range, so `FixedRandom(0.0)` always
/// yields the lower bound.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0.clamp(0.0, 1.0 - f64::EPSILON)
    }

    fn range_u64(&self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        let span = (high - low) as f64;
        low + ((self.next_f64() * span) as u64).min(high - low - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_rng_bounds() {
        let rng = ThreadRng;
        for _ in 0..1_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
            let d = rng.range_u64(100, 600);
            assert!((100..600).contains(&d));
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = SeededRng::new(42);
        let b = SeededRng::new(42);
        let xs: Vec<f64> = (0..16).map(|_| a.next_f64()).collect();
        let ys: Vec<f64> = (0..16).map(|_| b.next_f64()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_fixed_random() {
        assert_eq!(FixedRandom(0.0).next_f64(), 0.0);
        assert_eq!(FixedRandom(0.99).next_f64(), 0.99);
        assert!(FixedRandom(1.0).next_f64() < 1.0);
        assert_eq!(FixedRandom(0.0).range_u64(100, 600), 100);
        assert_eq!(FixedRandom(0.5).range_u64(100, 600), 350);
        assert_eq!(FixedRandom(1.0).range_u64(100, 600), 599);
    }

    #[test]
    fn test_empty_range_returns_low() {
        assert_eq!(ThreadRng.range_u64(5, 5), 5);
        assert_eq!(SeededRng::new(1).range_u64(9, 3), 9);
        assert_eq!(FixedRandom(0.7).range_u64(4, 4), 4);
    }
}
