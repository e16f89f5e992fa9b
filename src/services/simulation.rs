//! Shared randomness and latency for the mock services.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::time::sleep;

/// Seedable RNG plus a latency multiplier applied to every simulated delay.
pub struct Simulation {
    rng: Mutex<StdRng>,
    latency_multiplier: f64,
}

impl Simulation {
    pub fn new(seed: Option<u64>, latency_multiplier: f64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            latency_multiplier: latency_multiplier.max(0.0),
        }
    }

    /// Zero latency, fixed seed. For tests.
    pub fn instant(seed: u64) -> Self {
        Self::new(Some(seed), 0.0)
    }

    pub async fn delay(&self, base: Duration) {
        let scaled = base.mul_f64(self.latency_multiplier);
        if !scaled.is_zero() {
            sleep(scaled).await;
        }
    }

    /// Sleep for `min_ms` plus a random share of `jitter_ms`.
    pub async fn delay_with_jitter(&self, min_ms: u64, jitter_ms: u64) {
        let extra = if jitter_ms == 0 {
            0
        } else {
            self.with_rng(|rng| rng.gen_range(0..jitter_ms))
        };
        self.delay(Duration::from_millis(min_ms + extra)).await;
    }

    /// Uniform sample in `[low, low + span)`.
    pub fn uniform(&self, low: f64, span: f64) -> f64 {
        low + self.with_rng(|rng| rng.gen_range(0.0..1.0)) * span
    }

    pub fn pick<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        self.with_rng(|rng| items.choose(rng))
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned RNG is still a usable RNG.
        let mut guard = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut *guard)
    }
}
