// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Cloud Text-to-Speech synthesizer.
//!
//! Renders MP3 clips through the `text:synthesize` REST method. Clips carry no
//! word timing, so highlights are scheduled at a fixed per-word cadence.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parlo_config::model::SpeechConfig;
use parlo_core::ParloError;
use parlo_core::traits::{PluginAdapter, SpeechSynthesizer, SynthesizedAudio, WordTiming};
use parlo_core::types::{AdapterType, HealthStatus, VoiceSelector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Header carrying the API key. Keys never go in the request URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: TextInput<'a>,
    voice: VoiceParams<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceParams<'a> {
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

pub struct CloudSynthesizer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    voice: VoiceSelector,
    word_duration: Duration,
}

impl CloudSynthesizer {
    pub fn new(config: &SpeechConfig) -> Result<Self, ParloError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ParloError::Synthesis {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            voice: VoiceSelector {
                language_code: config.language_code.clone(),
                voice_name: Some(config.voice_name.clone()),
            },
            word_duration: config.word_duration(),
        })
    }

    /// Whether an API key is configured.
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl PluginAdapter for CloudSynthesizer {
    fn name(&self) -> &str {
        "google-cloud-tts"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Synthesizer
    }

    async fn health_check(&self) -> Result<HealthStatus, ParloError> {
        if self.is_available() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(
                "no API key configured, replies are not spoken".into(),
            ))
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for CloudSynthesizer {
    fn word_timing(&self) -> WordTiming {
        WordTiming::Estimated {
            per_word: self.word_duration,
        }
    }

    async fn synthesize(&self, text: &str) -> Result<Option<SynthesizedAudio>, ParloError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("no cloud TTS API key configured, skipping synthesis");
            return Ok(None);
        };

        let request = SynthesizeRequest {
            input: TextInput { text },
            voice: VoiceParams {
                language_code: &self.voice.language_code,
                name: self.voice.voice_name.as_deref(),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                ParloError::Synthesis {
                    message: format!("TTS request failed: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ParloError::Synthesis {
                message: format!("TTS API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: SynthesizeResponse =
            response.json().await.map_err(|e| {
                let e = e.without_url();
                ParloError::Synthesis {
                    message: format!("failed to parse TTS response: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;
        let data = STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| ParloError::Synthesis {
                message: format!("invalid base64 audio content: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(bytes = data.len(), "synthesized clip");

        Ok(Some(SynthesizedAudio::Clip {
            data,
            mime_type: "audio/mpeg".into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, api_key: Option<&str>) -> SpeechConfig {
        SpeechConfig {
            api_url: format!("{}/v1/text:synthesize", server.uri()),
            api_key: api_key.map(str::to_string),
            ..SpeechConfig::default()
        }
    }

    #[tokio::test]
    async fn sends_google_request_and_decodes_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text:synthesize"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_json(json!({
                "input": {"text": "Hola mundo"},
                "voice": {"languageCode": "es-ES", "name": "es-ES-Standard-A"},
                "audioConfig": {"audioEncoding": "MP3"}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"audioContent": "SUQz"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let synth = CloudSynthesizer::new(&config(&server, Some("secret"))).unwrap();
        let audio = synth.synthesize("Hola mundo").await.unwrap();

        assert_eq!(
            audio,
            Some(SynthesizedAudio::Clip {
                data: b"ID3".to_vec(),
                mime_type: "audio/mpeg".into()
            })
        );
    }

    #[tokio::test]
    async fn missing_key_means_capability_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let synth = CloudSynthesizer::new(&config(&server, Some("  "))).unwrap();
        assert!(!synth.is_available());
        assert_eq!(synth.synthesize("hola").await.unwrap(), None);
        assert!(matches!(
            synth.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[tokio::test]
    async fn api_error_is_synthesis_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let synth = CloudSynthesizer::new(&config(&server, Some("bad"))).unwrap();
        let err = synth.synthesize("hola").await.unwrap_err();
        assert!(matches!(err, ParloError::Synthesis { ref message, .. } if message.contains("403")));
    }

    #[tokio::test]
    async fn key_is_not_sent_in_the_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"audioContent": "SUQz"})),
            )
            .mount(&server)
            .await;

        let synth = CloudSynthesizer::new(&config(&server, Some("secret"))).unwrap();
        synth.synthesize("hola").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.query(), None);
        assert!(!requests[0].url.as_str().contains("secret"));
    }

    #[tokio::test]
    async fn connection_errors_do_not_leak_the_key() {
        let config = SpeechConfig {
            api_url: "http://127.0.0.1:9/v1/text:synthesize".into(),
            api_key: Some("SECRET123".into()),
            ..SpeechConfig::default()
        };
        let synth = CloudSynthesizer::new(&config).unwrap();
        let err = synth.synthesize("hola").await.unwrap_err();

        assert!(matches!(err, ParloError::Synthesis { .. }));
        assert!(!err.to_string().contains("SECRET123"), "{err}");
        assert!(!format!("{err:?}").contains("SECRET123"), "{err:?}");
    }

    #[test]
    fn timing_is_estimated_from_config() {
        let config = SpeechConfig {
            word_duration_ms: 200,
            ..SpeechConfig::default()
        };
        let synth = CloudSynthesizer::new(&config).unwrap();
        assert_eq!(
            synth.word_timing(),
            WordTiming::Estimated {
                per_word: Duration::from_millis(200)
            }
        );
    }
}
