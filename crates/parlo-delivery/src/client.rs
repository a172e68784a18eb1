// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery client: posts a payload to the active webhook endpoint with
//! per-attempt timeout, capped exponential backoff, health-aware retry
//! ceiling, and reply validation.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use parlo_config::model::{DeliveryConfig, EndpointMode, EndpointsConfig};
use parlo_core::traits::{TransportResponse, WebhookTransport};
use parlo_core::{DeliveryFailure, ParloError};
use parlo_resilience::{BackoffPolicy, SharedHealth};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::payload::OutboundPayload;
use crate::reply::{ServerReply, parse_reply};

/// Classified result of a single attempt.
enum AttemptOutcome {
    Success(ServerReply),
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },
    Rejected {
        status: u16,
        message: String,
    },
    InvalidFormat(String),
}

/// Sends user messages to the webhook.
///
/// Cheap to share behind an `Arc`; the endpoint mode can be switched while
/// deliveries are in flight (in-flight deliveries keep the URL they started with).
pub struct DeliveryClient {
    transport: Arc<dyn WebhookTransport>,
    endpoints: ArcSwap<EndpointsConfig>,
    policy: BackoffPolicy,
    max_retries: u32,
    unhealthy_retry_cap: u32,
    request_timeout: Duration,
    max_retry_after: Duration,
    health: SharedHealth,
}

impl DeliveryClient {
    pub fn new(
        transport: Arc<dyn WebhookTransport>,
        endpoints: EndpointsConfig,
        delivery: &DeliveryConfig,
        health: SharedHealth,
    ) -> Self {
        Self {
            transport,
            endpoints: ArcSwap::from_pointee(endpoints),
            policy: BackoffPolicy::from_config(delivery),
            max_retries: delivery.max_retries,
            unhealthy_retry_cap: delivery.unhealthy_retry_cap,
            request_timeout: delivery.request_timeout(),
            max_retry_after: delivery.max_retry_after(),
            health,
        }
    }

    /// Returns the shared health tracker.
    pub fn health(&self) -> &SharedHealth {
        &self.health
    }

    pub fn mode(&self) -> EndpointMode {
        self.endpoints.load().mode
    }

    /// Switches between the test and production endpoints.
    pub fn set_mode(&self, mode: EndpointMode) {
        self.endpoints.rcu(|current| {
            let mut next = EndpointsConfig::clone(current);
            next.mode = mode;
            next
        });
        info!(?mode, "endpoint mode switched");
    }

    /// URL the next delivery will use.
    pub fn current_url(&self) -> String {
        let endpoints = self.endpoints.load();
        endpoints.url_for(endpoints.mode).to_string()
    }

    /// Delivers `payload` and returns the validated reply.
    ///
    /// Fails with [`ParloError::Delivery`] when retries are exhausted, the
    /// reply is malformed, the endpoint rejects the request, or `cancel`
    /// fires. Cancellation wins over a reply that arrives at the same time
    /// and is never recorded against the endpoint's health.
    pub async fn send(
        &self,
        payload: &OutboundPayload,
        cancel: &CancellationToken,
    ) -> Result<ServerReply, ParloError> {
        let body = payload.to_json()?;
        let url = self.current_url();

        let healthy = self.health.lock().await.is_healthy();
        let max_retries = if healthy {
            self.max_retries
        } else {
            self.max_retries.min(self.unhealthy_retry_cap)
        };
        let max_attempts = max_retries.saturating_add(1);
        if !healthy {
            warn!(max_retries, "endpoint unhealthy, lowering retry ceiling");
        }

        let mut last_error = String::from("no attempt made");
        let mut server_delay: Option<Duration> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = match server_delay.take() {
                    Some(requested) => requested.min(self.max_retry_after),
                    None => self.policy.next_delay(attempt - 1),
                };
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying delivery after transient error"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ParloError::cancelled()),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ParloError::cancelled()),
                r = tokio::time::timeout(self.request_timeout, self.transport.post_json(&url, &body)) => r,
            };
            if cancel.is_cancelled() {
                return Err(ParloError::cancelled());
            }

            let outcome = match result {
                Ok(Ok(response)) => classify_response(response),
                Ok(Err(e)) => AttemptOutcome::Transient {
                    message: e.to_string(),
                    retry_after: None,
                },
                Err(_) => AttemptOutcome::Transient {
                    message: ParloError::Timeout {
                        duration: self.request_timeout,
                    }
                    .to_string(),
                    retry_after: None,
                },
            };

            let success = matches!(outcome, AttemptOutcome::Success(_));
            self.health.lock().await.record_outcome(success);

            match outcome {
                AttemptOutcome::Success(reply) => {
                    debug!(attempt, "delivery succeeded");
                    return Ok(reply);
                }
                AttemptOutcome::InvalidFormat(message) => {
                    warn!(attempt, error = %message, "reply failed validation, not retrying");
                    return Err(ParloError::Delivery {
                        reason: DeliveryFailure::InvalidFormat,
                        message,
                    });
                }
                AttemptOutcome::Rejected { status, message } => {
                    warn!(attempt, status, "endpoint rejected delivery, not retrying");
                    return Err(ParloError::Delivery {
                        reason: DeliveryFailure::Rejected { status },
                        message,
                    });
                }
                AttemptOutcome::Transient {
                    message,
                    retry_after,
                } => {
                    debug!(attempt, error = %message, "transient delivery failure");
                    last_error = message;
                    server_delay = retry_after;
                }
            }
        }

        Err(ParloError::Delivery {
            reason: DeliveryFailure::Exhausted {
                attempts: max_attempts,
            },
            message: last_error,
        })
    }
}

/// Maps a raw response onto an attempt outcome.
fn classify_response(response: TransportResponse) -> AttemptOutcome {
    let status = response.status;
    if response.is_success() {
        return match parse_reply(&response.body) {
            Ok(reply) => AttemptOutcome::Success(reply),
            Err(e) => AttemptOutcome::InvalidFormat(e.to_string()),
        };
    }
    if is_transient_status(status) {
        return AttemptOutcome::Transient {
            message: format!("endpoint returned {status}: {}", response.body),
            retry_after: if status == 429 {
                response.retry_after
            } else {
                None
            },
        };
    }
    AttemptOutcome::Rejected {
        status,
        message: format!("endpoint returned {status}: {}", response.body),
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
