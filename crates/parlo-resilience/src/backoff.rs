// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capped exponential backoff with jitter.
//!
//! `delay = min(base * 2^retry + jitter, max)`, jitter drawn uniformly from
//! `[0, max_jitter]`. Arithmetic saturates, so large retry indices clamp to
//! `max` instead of overflowing.

use std::time::Duration;

use parlo_config::model::DeliveryConfig;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
    pub max_jitter: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration, max_jitter: Duration) -> Self {
        Self {
            base,
            max,
            max_jitter,
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(config.base_delay(), config.max_delay(), config.max_jitter())
    }

    /// Deterministic delay before retry number `retry` (0-based) with the given jitter.
    pub fn delay_for(&self, retry: u32, jitter: Duration) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        let exponential = self.base.checked_mul(factor).unwrap_or(Duration::MAX);
        exponential
            .saturating_add(jitter.min(self.max_jitter))
            .min(self.max)
    }

    /// Delay before retry number `retry` with freshly drawn jitter.
    pub fn next_delay(&self, retry: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis().min(u64::MAX as u128) as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        self.delay_for(retry, jitter)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&DeliveryConfig::default())
    }
}
