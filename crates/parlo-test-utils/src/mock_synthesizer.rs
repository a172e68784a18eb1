// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock speech synthesizer.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use parlo_core::ParloError;
use parlo_core::traits::{PluginAdapter, SpeechSynthesizer, SynthesizedAudio, WordTiming};
use parlo_core::types::{AdapterType, HealthStatus};

/// A synthesizer that never touches a speech engine.
///
/// With `BoundaryEvents` timing it returns utterances; with `Estimated`
/// timing it returns clips whose bytes are the UTF-8 text, so sinks can
/// still tell items apart.
pub struct MockSynthesizer {
    timing: WordTiming,
    available: bool,
    fail_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new(timing: WordTiming) -> Self {
        Self {
            timing,
            available: true,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Utterance-producing synthesizer with boundary events.
    pub fn native() -> Self {
        Self::new(WordTiming::BoundaryEvents)
    }

    /// Clip-producing synthesizer with estimated word timing.
    pub fn clips(per_word: Duration) -> Self {
        Self::new(WordTiming::Estimated { per_word })
    }

    /// Synthesizer whose capability is absent: every call returns `Ok(None)`.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::native()
        }
    }

    /// Fail synthesis for any text containing `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    /// Texts passed to `synthesize`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl PluginAdapter for MockSynthesizer {
    fn name(&self) -> &str {
        "mock-synthesizer"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Synthesizer
    }

    async fn health_check(&self) -> Result<HealthStatus, ParloError> {
        Ok(if self.available {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded("speech unavailable".into())
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    fn word_timing(&self) -> WordTiming {
        self.timing
    }

    async fn synthesize(&self, text: &str) -> Result<Option<SynthesizedAudio>, ParloError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(text.to_string());

        if !self.available {
            return Ok(None);
        }
        if self.fail_on.as_deref().is_some_and(|n| text.contains(n)) {
            return Err(ParloError::Synthesis {
                message: format!("mock synthesis failure for {text:?}"),
                source: None,
            });
        }

        Ok(Some(match self.timing {
            WordTiming::BoundaryEvents => SynthesizedAudio::Utterance {
                text: text.to_string(),
                language: "es-ES".into(),
            },
            WordTiming::Estimated { .. } => SynthesizedAudio::Clip {
                data: text.as_bytes().to_vec(),
                mime_type: "audio/mpeg".into(),
            },
        }))
    }
}
