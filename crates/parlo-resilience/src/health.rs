// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server health tracker.
//!
//! Pure bookkeeping, no I/O. The endpoint is healthy when a success happened
//! within the success window, or when fewer than `failure_threshold`
//! consecutive failures have accumulated. Any success resets the failure
//! counter. State starts healthy and is never persisted.

use std::sync::Arc;
use std::time::Duration;

use parlo_config::model::HealthConfig;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Health tracker shared between the components that record and read it.
pub type SharedHealth = Arc<Mutex<HealthTracker>>;

#[derive(Debug, Clone)]
pub struct HealthTracker {
    success_window: Duration,
    failure_threshold: u32,
    last_success: Option<Instant>,
    consecutive_failures: u32,
    healthy: bool,
}

impl HealthTracker {
    pub fn new(success_window: Duration, failure_threshold: u32) -> Self {
        Self {
            success_window,
            failure_threshold,
            last_success: None,
            consecutive_failures: 0,
            healthy: true,
        }
    }

    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new(config.success_window(), config.failure_threshold)
    }

    /// Wraps the tracker for sharing.
    pub fn shared(self) -> SharedHealth {
        Arc::new(Mutex::new(self))
    }

    /// Records the outcome of one completed attempt and recomputes health.
    pub fn record_outcome(&mut self, success: bool) {
        let now = Instant::now();
        if success {
            self.last_success = Some(now);
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }

        let was_healthy = self.healthy;
        let recent_success = self
            .last_success
            .is_some_and(|at| now.duration_since(at) <= self.success_window);
        self.healthy = recent_success || self.consecutive_failures < self.failure_threshold;

        match (was_healthy, self.healthy) {
            (true, false) => warn!(
                consecutive_failures = self.consecutive_failures,
                "endpoint marked unhealthy"
            ),
            (false, true) => debug!("endpoint healthy again"),
            _ => {}
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::from_config(&HealthConfig::default())
    }
}
