// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform speech engine path: the text itself is the audio, and the sink
//! reports word boundaries while speaking it.

use async_trait::async_trait;
use parlo_config::model::SpeechConfig;
use parlo_core::ParloError;
use parlo_core::traits::{PluginAdapter, SpeechSynthesizer, SynthesizedAudio, WordTiming};
use parlo_core::types::{AdapterType, VoiceSelector};

#[derive(Debug, Clone, Default)]
pub struct NativeSynthesizer {
    voice: VoiceSelector,
}

impl NativeSynthesizer {
    pub fn new(voice: VoiceSelector) -> Self {
        Self { voice }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(VoiceSelector {
            language_code: config.language_code.clone(),
            voice_name: None,
        })
    }
}

#[async_trait]
impl PluginAdapter for NativeSynthesizer {
    fn name(&self) -> &str {
        "native"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Synthesizer
    }
}

#[async_trait]
impl SpeechSynthesizer for NativeSynthesizer {
    fn word_timing(&self) -> WordTiming {
        WordTiming::BoundaryEvents
    }

    async fn synthesize(&self, text: &str) -> Result<Option<SynthesizedAudio>, ParloError> {
        Ok(Some(SynthesizedAudio::Utterance {
            text: text.to_string(),
            language: self.voice.language_code.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_utterance_in_configured_language() {
        let config = SpeechConfig {
            language_code: "en-GB".into(),
            ..SpeechConfig::default()
        };
        let synth = NativeSynthesizer::from_config(&config);
        let audio = synth.synthesize("hello").await.unwrap();
        assert_eq!(
            audio,
            Some(SynthesizedAudio::Utterance {
                text: "hello".into(),
                language: "en-GB".into()
            })
        );
        assert_eq!(synth.word_timing(), WordTiming::BoundaryEvents);
    }
}
