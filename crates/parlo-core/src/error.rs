// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parlo chat pipeline.

use thiserror::Error;

use crate::types::{DeliveryFailure, DeliveryStatus};

/// The primary error type used across all Parlo adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ParloError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure reaching the webhook (connection refused, DNS, TLS).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A delivery gave up: retries exhausted, reply rejected, or cancelled.
    #[error("delivery failed ({reason}): {message}")]
    Delivery {
        reason: DeliveryFailure,
        message: String,
    },

    /// The webhook reply did not have the expected shape.
    #[error("format error: {0}")]
    Format(String),

    /// Speech synthesis failed.
    #[error("synthesis error: {message}")]
    Synthesis {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Audio playback failed.
    #[error("playback error: {message}")]
    Playback {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Preference store errors (file I/O, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A message status change that would move backwards.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    /// Caller-supplied input was rejected (for example an empty submission).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParloError {
    /// Returns true when a delivery was cancelled by its caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ParloError::Delivery {
                reason: DeliveryFailure::Cancelled,
                ..
            }
        )
    }

    /// Returns true for reply-shape failures, whether raised directly or as a delivery reason.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            ParloError::Format(_)
                | ParloError::Delivery {
                    reason: DeliveryFailure::InvalidFormat,
                    ..
                }
        )
    }

    /// Shorthand for a cancelled delivery.
    pub fn cancelled() -> Self {
        ParloError::Delivery {
            reason: DeliveryFailure::Cancelled,
            message: "delivery cancelled by caller".into(),
        }
    }
}
