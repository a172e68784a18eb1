// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for webhook delivery.
//!
//! - [`HealthTracker`]: rolling success/failure bookkeeping that decides
//!   whether the endpoint deserves aggressive retrying.
//! - [`BackoffPolicy`]: capped exponential backoff with jitter.

pub mod backoff;
pub mod health;

pub use backoff::BackoffPolicy;
pub use health::{HealthTracker, SharedHealth};
