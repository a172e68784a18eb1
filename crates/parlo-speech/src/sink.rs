// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Headless audio sink.

use std::time::Duration;

use async_trait::async_trait;
use parlo_core::ParloError;
use parlo_core::traits::{AudioSink, PluginAdapter, SynthesizedAudio};
use parlo_core::types::AdapterType;
use tokio::sync::mpsc;
use tracing::trace;

use crate::words::split_words;

/// Approximate MP3 byte rate at 128 kbit/s.
const CLIP_BYTES_PER_SEC: f64 = 16_000.0;

/// Plays nothing, but takes as long as speaking would.
///
/// Utterances advance one word per `per_word` and report each word's
/// boundary; clips last as long as their encoded size suggests.
#[derive(Debug, Clone)]
pub struct SilentSink {
    per_word: Duration,
}

impl SilentSink {
    pub fn new(per_word: Duration) -> Self {
        Self { per_word }
    }
}

#[async_trait]
impl PluginAdapter for SilentSink {
    fn name(&self) -> &str {
        "silent"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AudioSink
    }
}

#[async_trait]
impl AudioSink for SilentSink {
    async fn play(
        &self,
        audio: &SynthesizedAudio,
        boundaries: mpsc::UnboundedSender<usize>,
    ) -> Result<(), ParloError> {
        match audio {
            SynthesizedAudio::Utterance { text, .. } => {
                for word in split_words(text) {
                    trace!(word = %word.text, "speaking");
                    if boundaries.send(word.start).is_err() {
                        break;
                    }
                    tokio::time::sleep(self.per_word).await;
                }
            }
            SynthesizedAudio::Clip { data, .. } => {
                let secs = data.len() as f64 / CLIP_BYTES_PER_SEC;
                tokio::time::sleep(Duration::from_secs_f64(secs)).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn utterance_takes_per_word_time_and_reports_boundaries() {
        let sink = SilentSink::new(Duration::from_millis(300));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = tokio::time::Instant::now();

        sink.play(
            &SynthesizedAudio::Utterance {
                text: "Hola  qué tal".into(),
                language: "es-ES".into(),
            },
            tx,
        )
        .await
        .unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(900));
        let mut offsets = Vec::new();
        while let Some(offset) = rx.recv().await {
            offsets.push(offset);
        }
        assert_eq!(offsets, vec![0, 6, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn clip_duration_follows_size() {
        let sink = SilentSink::new(Duration::from_millis(300));
        let (tx, _rx) = mpsc::unbounded_channel();
        let started = tokio::time::Instant::now();

        sink.play(
            &SynthesizedAudio::Clip {
                data: vec![0; 32_000],
                mime_type: "audio/mpeg".into(),
            },
            tx,
        )
        .await
        .unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
