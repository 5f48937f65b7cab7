//! Injected randomness for the scene.
//!
//! Every random decision (launch positions, burst sizes, rose geometry, petal
//! jitter) goes through a [`RandomSource`] owned by the scene, so tests can pin
//! the sequence with a fixed seed.

/// Uniform random numbers in `[0, 1)` plus a few convenience ranges.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform in `[lo, hi)`.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Uniform integer in `lo..=hi` (returns `lo` when the range is empty).
    fn range_usize(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo).saturating_add(1) as f64;
        (lo + (self.next_f64() * span).floor() as usize).min(hi)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }
}

/// `fastrand`-backed source used in the browser and in seeded tests.
pub struct FastRng(fastrand::Rng);

impl FastRng {
    pub fn with_seed(seed: u64) -> Self {
        Self(fastrand::Rng::with_seed(seed))
    }

    /// Seed from the platform entropy source (`crypto.getRandomValues` in the browser).
    pub fn from_entropy() -> Self {
        let mut buf = [0u8; 8];
        match getrandom::getrandom(&mut buf) {
            Ok(()) => Self::with_seed(u64::from_le_bytes(buf)),
            Err(e) => {
                log::warn!("entropy unavailable ({e}); using fixed seed");
                Self::with_seed(0x5EED_F1E2_A0C5_0001)
            }
        }
    }
}

impl RandomSource for FastRng {
    fn next_f64(&mut self) -> f64 {
        self.0.f64()
    }
}
