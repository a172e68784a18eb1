// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Parlo.
//!
//! This crate provides the error type, the shared message model, resource
//! handles, and the adapter traits for the external collaborators (webhook
//! transport, speech synthesizer, audio sink) used throughout the workspace.

pub mod error;
pub mod resource;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParloError;
pub use resource::{ResourceHandle, ResourceKind, ResourceRegistry};
pub use types::{
    AdapterType, Attachment, DeliveryFailure, DeliveryStatus, Emotion, HealthStatus,
    HighlightState, Message, MessageId, Sender, VoiceSelector,
};

pub use traits::{
    AudioSink, PluginAdapter, SpeechSynthesizer, SynthesizedAudio, TransportResponse,
    WebhookTransport, WordTiming,
};
