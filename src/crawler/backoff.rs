//! Retry pacing for workers that find nothing eligible in the frontier

use rand::Rng;
use std::time::Duration;

/// Bounded exponential backoff with additive jitter
///
/// Each call to `next_delay` doubles the base delay up to `max`, then adds up
/// to a tenth of it as random jitter so idle workers do not wake in lockstep.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial_ms: u64,
    max_ms: u64,
    jitter_percent: u64,
    attempt: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial_ms = (initial.as_millis() as u64).max(1);
        Self {
            initial_ms,
            max_ms: (max.as_millis() as u64).max(initial_ms),
            jitter_percent: 10,
            attempt: 0,
        }
    }

    pub fn with_jitter(mut self, jitter_percent: u64) -> Self {
        self.jitter_percent = jitter_percent;
        self
    }

    /// Returns the delay for the current attempt and advances to the next
    pub fn next_delay(&mut self) -> Duration {
        let exponential = self
            .initial_ms
            .saturating_mul(2u64.saturating_pow(self.attempt.min(20)));
        let capped = exponential.min(self.max_ms);
        let jitter = if self.jitter_percent > 0 {
            let spread = capped.saturating_mul(self.jitter_percent) / 100;
            rand::thread_rng().gen_range(0..=spread)
        } else {
            0
        };

        self.attempt = self.attempt.saturating_add(1);
        Duration::from_millis(capped.saturating_add(jitter))
    }

    /// Starts over from the initial delay
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
