// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook delivery for Parlo.
//!
//! [`DeliveryClient`] posts an [`OutboundPayload`] to the active endpoint,
//! retries transient failures with capped exponential backoff, lowers its
//! retry ceiling while the endpoint is unhealthy, and validates the reply
//! into a [`ServerReply`].
//!
//! [`SimulatedWebhook`] is an offline transport with canned replies.

pub mod client;
pub mod http;
pub mod payload;
pub mod reply;
pub mod simulated;

pub use client::DeliveryClient;
pub use http::HttpTransport;
pub use payload::{FilePayload, FileUpload, OutboundPayload, guess_mime_type};
pub use reply::{ReplyItem, ReplyShape, ServerReply, classify, parse_reply};
pub use simulated::{DEFAULT_SIMULATED_LATENCY, SimulatedWebhook, match_reply};
