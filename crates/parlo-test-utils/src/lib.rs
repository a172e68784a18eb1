// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for Parlo integration tests.
//!
//! Provides adapters that stand in for the webhook, the speech engine, and
//! the audio device so the pipeline can be driven deterministically, without
//! network or sound hardware.
//!
//! # Components
//!
//! - [`MockTransport`] - scripted webhook responses with attempt counting
//! - [`MockSynthesizer`] - synthesizer with configurable timing and failures
//! - [`RecordingSink`] - audio sink that records playback order

pub mod mock_synthesizer;
pub mod mock_transport;
pub mod recording_sink;

pub use mock_synthesizer::MockSynthesizer;
pub use mock_transport::{MockTransport, ScriptedResponse};
pub use recording_sink::{RecordingSink, SinkEvent};
