// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech synthesis and audio output traits.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ParloError;
use crate::traits::adapter::PluginAdapter;

/// Playable audio produced by a synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesizedAudio {
    /// Pre-rendered clip (cloud synthesis). Word timing is not available.
    Clip { data: Vec<u8>, mime_type: String },
    /// Text handed to a platform speech engine that reports word boundaries.
    Utterance { text: String, language: String },
}

/// How word highlights are timed while audio plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordTiming {
    /// The sink reports real word boundaries during playback.
    BoundaryEvents,
    /// One highlight per word on a fixed schedule.
    Estimated { per_word: Duration },
}

/// Turns plain text into playable audio.
#[async_trait]
pub trait SpeechSynthesizer: PluginAdapter {
    /// Timing strategy matching the audio this synthesizer produces.
    fn word_timing(&self) -> WordTiming;

    /// Synthesizes `text`. `Ok(None)` means the capability is unavailable
    /// (for example a missing credential) and nothing should be played.
    async fn synthesize(&self, text: &str) -> Result<Option<SynthesizedAudio>, ParloError>;
}

/// Plays synthesized audio.
///
/// `play` resolves when playback ends. Dropping the future stops playback.
#[async_trait]
pub trait AudioSink: PluginAdapter {
    /// Plays `audio` to completion. Sinks that can observe word boundaries
    /// send the character offset (into the spoken text) of each word as it
    /// starts.
    async fn play(
        &self,
        audio: &SynthesizedAudio,
        boundaries: mpsc::UnboundedSender<usize>,
    ) -> Result<(), ParloError>;
}
