// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Parlo.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Parlo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParloConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Webhook endpoints.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Retry and timeout tunables for message delivery.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Server health tracking thresholds.
    #[serde(default)]
    pub health: HealthConfig,

    /// Text-to-speech settings.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Header emotion display settings.
    #[serde(default)]
    pub header: HeaderConfig,

    /// Persisted user preferences.
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

/// Process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which webhook endpoint receives messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointMode {
    Test,
    #[default]
    Production,
}

/// Webhook endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointsConfig {
    /// Endpoint used while testing the bot flow.
    #[serde(default = "default_test_endpoint")]
    pub test: String,

    /// Live endpoint.
    #[serde(default = "default_production_endpoint")]
    pub production: String,

    /// Endpoint selected at startup. Can be switched at runtime.
    #[serde(default)]
    pub mode: EndpointMode,
}

impl EndpointsConfig {
    /// Returns the URL for the given mode.
    pub fn url_for(&self, mode: EndpointMode) -> &str {
        match mode {
            EndpointMode::Test => &self.test,
            EndpointMode::Production => &self.production,
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            test: default_test_endpoint(),
            production: default_production_endpoint(),
            mode: EndpointMode::default(),
        }
    }
}

fn default_test_endpoint() -> String {
    "http://localhost:5678/webhook-test/parlo".to_string()
}

fn default_production_endpoint() -> String {
    "http://localhost:5678/webhook/parlo".to_string()
}

/// Delivery retry and timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Retries after the first attempt while the endpoint is healthy.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for any backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Upper bound of the random jitter added to each delay, in milliseconds.
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Timeout for a single attempt, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retry ceiling while the endpoint is considered unhealthy.
    #[serde(default = "default_unhealthy_retry_cap")]
    pub unhealthy_retry_cap: u32,

    /// Longest server-requested `Retry-After` wait honored, in seconds.
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,
}

impl DeliveryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_secs)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            unhealthy_retry_cap: default_unhealthy_retry_cap(),
            max_retry_after_secs: default_max_retry_after_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_max_jitter_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_unhealthy_retry_cap() -> u32 {
    2
}

fn default_max_retry_after_secs() -> u64 {
    60
}

/// Server health thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// A success within this window keeps the endpoint healthy, in seconds.
    #[serde(default = "default_success_window_secs")]
    pub success_window_secs: u64,

    /// Consecutive failures at which the endpoint becomes unhealthy.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

impl HealthConfig {
    pub fn success_window(&self) -> Duration {
        Duration::from_secs(self.success_window_secs)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            success_window_secs: default_success_window_secs(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

fn default_success_window_secs() -> u64 {
    120
}

fn default_failure_threshold() -> u32 {
    3
}

/// Speech synthesis backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackend {
    /// Platform speech engine with word-boundary callbacks.
    #[default]
    Native,
    /// Google Cloud Text-to-Speech, pre-rendered MP3 clips.
    Cloud,
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    #[serde(default)]
    pub backend: SpeechBackend,

    /// BCP-47 language code passed to the synthesizer.
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Cloud voice name.
    #[serde(default = "default_voice_name")]
    pub voice_name: String,

    /// Cloud API key. `None` disables cloud synthesis.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Cloud synthesis endpoint.
    #[serde(default = "default_tts_api_url")]
    pub api_url: String,

    /// Estimated time per spoken word for clips without timing data, in milliseconds.
    #[serde(default = "default_word_duration_ms")]
    pub word_duration_ms: u64,

    /// Pause before each item starts speaking, in milliseconds.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
}

impl SpeechConfig {
    pub fn word_duration(&self) -> Duration {
        Duration::from_millis(self.word_duration_ms)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: SpeechBackend::default(),
            language_code: default_language_code(),
            voice_name: default_voice_name(),
            api_key: None,
            api_url: default_tts_api_url(),
            word_duration_ms: default_word_duration_ms(),
            start_delay_ms: default_start_delay_ms(),
        }
    }
}

fn default_language_code() -> String {
    "es-ES".to_string()
}

fn default_voice_name() -> String {
    "es-ES-Standard-A".to_string()
}

fn default_tts_api_url() -> String {
    "https://texttospeech.googleapis.com/v1/text:synthesize".to_string()
}

fn default_word_duration_ms() -> u64 {
    350
}

fn default_start_delay_ms() -> u64 {
    50
}

/// Header display configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderConfig {
    /// How long a reply emotion stays in the header before reverting, in seconds.
    #[serde(default = "default_emotion_display_secs")]
    pub emotion_display_secs: u64,
}

impl HeaderConfig {
    pub fn emotion_display(&self) -> Duration {
        Duration::from_secs(self.emotion_display_secs)
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            emotion_display_secs: default_emotion_display_secs(),
        }
    }
}

fn default_emotion_display_secs() -> u64 {
    8
}

/// Preference persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PreferencesConfig {
    /// Path of the JSON preference file.
    #[serde(default = "default_preferences_path")]
    pub path: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("parlo").join("preferences.json"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "parlo-preferences.json".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_defaults_match_retry_policy() {
        let d = DeliveryConfig::default();
        assert_eq!(d.max_retries, 5);
        assert_eq!(d.base_delay(), Duration::from_millis(1000));
        assert_eq!(d.max_delay(), Duration::from_millis(8000));
        assert_eq!(d.max_jitter(), Duration::from_millis(1000));
        assert_eq!(d.request_timeout(), Duration::from_secs(20));
        assert_eq!(d.unhealthy_retry_cap, 2);
        assert_eq!(d.max_retry_after(), Duration::from_secs(60));
    }

    #[test]
    fn endpoint_mode_selects_url() {
        let e = EndpointsConfig::default();
        assert_eq!(e.url_for(EndpointMode::Test), e.test);
        assert_eq!(e.url_for(EndpointMode::Production), e.production);
        assert_eq!(e.mode, EndpointMode::Production);
    }

    #[test]
    fn speech_backend_parses_lowercase() {
        let s: SpeechConfig = toml::from_str("backend = \"cloud\"").unwrap();
        assert_eq!(s.backend, SpeechBackend::Cloud);
        assert_eq!(s.language_code, "es-ES");
    }
}
