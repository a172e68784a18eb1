// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio sink that records what it played and in which order.
//!
//! Playback takes `per_word` of (tokio) time per whitespace-delimited word,
//! so tests with paused time can observe an item mid-playback.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use parlo_core::ParloError;
use parlo_core::traits::{AudioSink, PluginAdapter, SynthesizedAudio};
use parlo_core::types::AdapterType;

/// One observation made by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Started(String),
    Finished(String),
    /// Playback future was dropped before it finished.
    Interrupted(String),
    Failed(String),
}

pub struct RecordingSink {
    per_word: Duration,
    fail_on: Option<String>,
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new(per_word: Duration) -> Self {
        Self {
            per_word,
            fail_on: None,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail playback for any item containing `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        lock(&self.events).clone()
    }

    /// Texts whose playback started, in order.
    pub fn started(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Started(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn spoken_text(audio: &SynthesizedAudio) -> String {
    match audio {
        SynthesizedAudio::Utterance { text, .. } => text.clone(),
        SynthesizedAudio::Clip { data, .. } => String::from_utf8_lossy(data).into_owned(),
    }
}

/// Character offsets of each whitespace-delimited word.
fn word_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut in_word = false;
    for (i, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            starts.push(i);
        }
    }
    starts
}

/// Records `Interrupted` unless disarmed by a normal finish.
struct PlaybackGuard {
    text: String,
    events: Arc<Mutex<Vec<SinkEvent>>>,
    armed: bool,
}

impl Drop for PlaybackGuard {
    fn drop(&mut self) {
        if self.armed {
            lock(&self.events).push(SinkEvent::Interrupted(std::mem::take(&mut self.text)));
        }
    }
}

#[async_trait]
impl PluginAdapter for RecordingSink {
    fn name(&self) -> &str {
        "recording-sink"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AudioSink
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(
        &self,
        audio: &SynthesizedAudio,
        boundaries: mpsc::UnboundedSender<usize>,
    ) -> Result<(), ParloError> {
        let text = spoken_text(audio);
        lock(&self.events).push(SinkEvent::Started(text.clone()));

        if self.fail_on.as_deref().is_some_and(|n| text.contains(n)) {
            lock(&self.events).push(SinkEvent::Failed(text));
            return Err(ParloError::Playback {
                message: "mock playback failure".into(),
                source: None,
            });
        }

        let mut guard = PlaybackGuard {
            text: text.clone(),
            events: Arc::clone(&self.events),
            armed: true,
        };

        let report = matches!(audio, SynthesizedAudio::Utterance { .. });
        for start in word_starts(&text) {
            if report {
                let _ = boundaries.send(start);
            }
            tokio::time::sleep(self.per_word).await;
        }

        guard.armed = false;
        lock(&self.events).push(SinkEvent::Finished(text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_starts_are_char_offsets() {
        assert_eq!(word_starts("hola  qué tal"), vec![0, 6, 10]);
        assert!(word_starts("   ").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn utterance_reports_boundaries() {
        let sink = RecordingSink::new(Duration::from_millis(100));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let audio = SynthesizedAudio::Utterance {
            text: "uno dos".into(),
            language: "es-ES".into(),
        };
        sink.play(&audio, tx).await.unwrap();

        assert_eq!(rx.recv().await, Some(0));
        assert_eq!(rx.recv().await, Some(4));
        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Started("uno dos".into()),
                SinkEvent::Finished("uno dos".into())
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_playback_is_interrupted() {
        let sink = RecordingSink::new(Duration::from_secs(1));
        let (tx, _rx) = mpsc::unbounded_channel();
        let audio = SynthesizedAudio::Utterance {
            text: "uno dos tres".into(),
            language: "es-ES".into(),
        };
        let _ = tokio::time::timeout(Duration::from_millis(1500), sink.play(&audio, tx)).await;

        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Started("uno dos tres".into()),
                SinkEvent::Interrupted("uno dos tres".into())
            ]
        );
    }
}
