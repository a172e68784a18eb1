// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech output for Parlo.
//!
//! Bot replies are sanitized for speech, synthesized by a
//! [`SpeechSynthesizer`](parlo_core::SpeechSynthesizer), and played one at a
//! time by the [`PlaybackQueue`], which publishes word highlights that map
//! back onto the original message text.

pub mod cloud;
pub mod native;
pub mod queue;
pub mod sanitize;
pub mod sink;
pub mod words;

use std::sync::Arc;

use parlo_config::model::{SpeechBackend, SpeechConfig};
use parlo_core::{ParloError, SpeechSynthesizer};
use tracing::info;

pub use cloud::CloudSynthesizer;
pub use native::NativeSynthesizer;
pub use queue::{PlaybackEvent, PlaybackOptions, PlaybackQueue, SkipReason};
pub use sanitize::{SanitizedText, sanitize};
pub use sink::SilentSink;
pub use words::{WordSpan, split_words, word_index_at};

/// Builds the synthesizer selected by `[speech] backend`.
pub fn synthesizer_from_config(
    config: &SpeechConfig,
) -> Result<Arc<dyn SpeechSynthesizer>, ParloError> {
    info!(backend = ?config.backend, language = %config.language_code, "speech backend selected");
    Ok(match config.backend {
        SpeechBackend::Native => Arc::new(NativeSynthesizer::from_config(config)),
        SpeechBackend::Cloud => Arc::new(CloudSynthesizer::new(config)?),
    })
}

impl PlaybackOptions {
    pub fn from_config(config: &SpeechConfig) -> Self {
        Self {
            start_delay: config.start_delay(),
            ..Self::default()
        }
    }
}
