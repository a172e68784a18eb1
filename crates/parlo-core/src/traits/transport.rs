// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook transport trait: one JSON POST, raw response back.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ParloError;
use crate::traits::adapter::PluginAdapter;

/// Raw response from the webhook, before any shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Server-provided `Retry-After`, if any.
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            retry_after: None,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a JSON body to the webhook endpoint.
///
/// Implementations perform exactly one attempt. Retry, timeout, and
/// validation are the delivery client's job.
#[async_trait]
pub trait WebhookTransport: PluginAdapter {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, ParloError>;
}
