// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external collaborators Parlo drives.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod speech;
pub mod transport;

pub use adapter::PluginAdapter;
pub use speech::{AudioSink, SpeechSynthesizer, SynthesizedAudio, WordTiming};
pub use transport::{TransportResponse, WebhookTransport};
