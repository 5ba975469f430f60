//! Bounded exponential backoff for transient dispatch failures.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for transient exchange errors.
///
/// Permanent errors (rejections, insufficient funds) are never retried;
/// this policy only shapes the transient path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Backoff multiplier per attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Random jitter as a fraction of the delay (0.1 = +/-10%).
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.1
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry after failed attempt `attempt` (1-based).
    ///
    /// Exponential in the attempt number, capped at `max_delay_ms`, with
    /// jitter applied after the cap so the ceiling still staggers.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let raw = (self.base_delay_ms as f64 * exp).min(self.max_delay_ms as f64);

        let jittered = if self.jitter > 0.0 {
            let factor = rand::thread_rng().gen_range(-self.jitter..=self.jitter);
            raw * (1.0 + factor)
        } else {
            raw
        };
        Duration::from_millis(jittered.max(0.0) as u64)
    }
}
