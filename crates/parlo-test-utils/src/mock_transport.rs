// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock webhook transport for deterministic delivery tests.
//!
//! `MockTransport` implements `WebhookTransport` with a scripted FIFO of
//! outcomes and records every request it sees.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use parlo_core::ParloError;
use parlo_core::traits::{PluginAdapter, TransportResponse, WebhookTransport};
use parlo_core::types::AdapterType;

/// One scripted outcome of a `post_json` call.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// 200 with the given body.
    Reply(String),
    /// 200 with the given body after a delay.
    DelayedReply(Duration, String),
    /// Empty response with the given status.
    Status(u16),
    /// 429 with an optional `Retry-After`.
    RateLimited(Option<Duration>),
    /// Connection-level failure.
    NetworkError,
    /// Never completes.
    Hang,
}

/// A mock transport that plays back scripted responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty the
/// fallback response is used; without a fallback, a plain
/// `{"message": "mock reply"}` is returned.
pub struct MockTransport {
    script: Mutex<VecDeque<ScriptedResponse>>,
    fallback: Option<ScriptedResponse>,
    attempts: AtomicU32,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockTransport {
    /// Create a mock transport with an empty script.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            attempts: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock transport pre-loaded with the given outcomes.
    pub fn with_script(script: Vec<ScriptedResponse>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(script)),
            ..Self::new()
        }
    }

    /// Create a mock transport that answers every call the same way.
    pub fn always(response: ScriptedResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new()
        }
    }

    /// Append an outcome to the script.
    pub fn push(&self, response: ScriptedResponse) {
        lock(&self.script).push_back(response);
    }

    /// Number of `post_json` calls made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// URL of the most recent request.
    pub fn last_url(&self) -> Option<String> {
        lock(&self.requests).last().map(|(url, _)| url.clone())
    }

    /// All request bodies in call order.
    pub fn bodies(&self) -> Vec<serde_json::Value> {
        lock(&self.requests)
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn next_response(&self) -> ScriptedResponse {
        lock(&self.script)
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| ScriptedResponse::Reply(r#"{"message": "mock reply"}"#.into()))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }
}

#[async_trait]
impl WebhookTransport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, ParloError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push((url.to_string(), body.clone()));

        match self.next_response() {
            ScriptedResponse::Reply(body) => Ok(TransportResponse::ok(body)),
            ScriptedResponse::DelayedReply(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(TransportResponse::ok(body))
            }
            ScriptedResponse::Status(status) => Ok(TransportResponse::status(status)),
            ScriptedResponse::RateLimited(retry_after) => Ok(TransportResponse {
                status: 429,
                retry_after,
                body: String::new(),
            }),
            ScriptedResponse::NetworkError => Err(ParloError::Transport {
                message: "connection refused".into(),
                source: None,
            }),
            ScriptedResponse::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn plays_script_then_fallback() {
        let transport = MockTransport::with_script(vec![ScriptedResponse::Status(503)]);
        let first = transport.post_json("http://a", &json!({})).await.unwrap();
        let second = transport.post_json("http://b", &json!({"n": 2})).await.unwrap();

        assert_eq!(first.status, 503);
        assert!(second.is_success());
        assert_eq!(transport.attempts(), 2);
        assert_eq!(transport.last_url().as_deref(), Some("http://b"));
        assert_eq!(transport.bodies()[1], json!({"n": 2}));
    }

    #[tokio::test]
    async fn network_error_is_transport_error() {
        let transport = MockTransport::always(ScriptedResponse::NetworkError);
        let err = transport.post_json("http://a", &json!({})).await.unwrap_err();
        assert!(matches!(err, ParloError::Transport { .. }));
    }
}
