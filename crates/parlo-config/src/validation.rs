// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, delay ordering, and non-zero thresholds.

use crate::diagnostic::ConfigError;
use crate::model::{ParloConfig, SpeechBackend};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParloConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    for (key, url) in [
        ("endpoints.test", &config.endpoints.test),
        ("endpoints.production", &config.endpoints.production),
    ] {
        check_http_url(key, url, &mut errors);
    }

    let delivery = &config.delivery;
    if delivery.base_delay_ms == 0 {
        errors.push(validation("delivery.base_delay_ms must be greater than 0"));
    }
    if delivery.max_delay_ms < delivery.base_delay_ms {
        errors.push(validation(format!(
            "delivery.max_delay_ms ({}) must be at least delivery.base_delay_ms ({})",
            delivery.max_delay_ms, delivery.base_delay_ms
        )));
    }
    if delivery.request_timeout_secs == 0 {
        errors.push(validation("delivery.request_timeout_secs must be greater than 0"));
    }

    if config.health.failure_threshold == 0 {
        errors.push(validation("health.failure_threshold must be at least 1"));
    }

    if config.speech.word_duration_ms == 0 {
        errors.push(validation("speech.word_duration_ms must be greater than 0"));
    }
    if config.speech.language_code.trim().is_empty() {
        errors.push(validation("speech.language_code must not be empty"));
    }
    if config.speech.backend == SpeechBackend::Cloud {
        check_http_url("speech.api_url", &config.speech.api_url, &mut errors);
    }

    if config.preferences.path.trim().is_empty() {
        errors.push(validation("preferences.path must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(key: &str, url: &str, errors: &mut Vec<ConfigError>) {
    let url = url.trim();
    if url.is_empty() {
        errors.push(validation(format!("{key} must not be empty")));
    } else if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(validation(format!(
            "{key} `{url}` must start with http:// or https://"
        )));
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
