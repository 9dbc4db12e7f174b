//! Retry policy for tab requests.
//!
//! Two shapes are supported: the legacy "retry immediately, forever" loop and
//! a capped exponential backoff with jitter that eventually gives up.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts allowed per tab; `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Delay before the second attempt; doubled for each further attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay (after jitter).
    pub max_delay: Duration,
    /// Relative jitter in `[0, 1]`; 0.25 spreads a delay over ±25%.
    pub jitter: f64,
}

impl RetryPolicy {
    /// No delay and no attempt cap. Blocks forever against a dead endpoint.
    pub fn unbounded_immediate() -> Self {
        Self {
            max_attempts: None,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// Whether another attempt may follow `attempts_made` failed ones.
    pub fn allows_another(&self, attempts_made: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts_made < max)
    }

    /// Delay to wait after `attempts_made` failed attempts, jitter excluded.
    pub fn nominal_delay(&self, attempts_made: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = attempts_made.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Delay to wait after `attempts_made` failed attempts, jitter included.
    pub fn delay<R: Rng + ?Sized>(&self, attempts_made: u32, rng: &mut R) -> Duration {
        let nominal = self.nominal_delay(attempts_made);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if nominal.is_zero() || jitter == 0.0 {
            return nominal;
        }
        let factor = rng.gen_range((1.0 - jitter)..=(1.0 + jitter));
        nominal.mul_f64(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(8),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: 0.25,
        }
    }
}
