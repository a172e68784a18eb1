// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Parlo configuration system.

use parlo_config::diagnostic::{ConfigError, suggest_key};
use parlo_config::model::{EndpointMode, ParloConfig, SpeechBackend};
use parlo_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_parlo_config() {
    let toml = r#"
[app]
log_level = "debug"

[endpoints]
test = "https://hooks.example.com/test/chat"
production = "https://hooks.example.com/chat"
mode = "test"

[delivery]
max_retries = 3
base_delay_ms = 250
max_delay_ms = 4000
max_jitter_ms = 100
request_timeout_secs = 10
unhealthy_retry_cap = 1

[health]
success_window_secs = 60
failure_threshold = 4

[speech]
backend = "cloud"
language_code = "en-US"
voice_name = "en-US-Standard-C"
api_key = "key-123"
word_duration_ms = 300

[header]
emotion_display_secs = 5

[preferences]
path = "/tmp/parlo-prefs.json"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.endpoints.mode, EndpointMode::Test);
    assert_eq!(
        config.endpoints.url_for(config.endpoints.mode),
        "https://hooks.example.com/test/chat"
    );
    assert_eq!(config.delivery.max_retries, 3);
    assert_eq!(config.delivery.base_delay_ms, 250);
    assert_eq!(config.delivery.unhealthy_retry_cap, 1);
    assert_eq!(config.health.failure_threshold, 4);
    assert_eq!(config.speech.backend, SpeechBackend::Cloud);
    assert_eq!(config.speech.api_key.as_deref(), Some("key-123"));
    assert_eq!(config.speech.word_duration_ms, 300);
    assert_eq!(config.header.emotion_display_secs, 5);
    assert_eq!(config.preferences.path, "/tmp/parlo-prefs.json");
}

/// Unknown field in [delivery] produces an error naming the bad key.
#[test]
fn unknown_field_in_delivery_produces_error() {
    let toml = r#"
[delivery]
max_retires = 3
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("max_retires"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown keys become UnknownKey diagnostics with a suggestion.
#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let toml = r#"
[speech]
api_kye = "abc"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, .. }
            if key == "api_kye" && suggestion.as_deref() == Some("api_key"))
    });
    assert!(found, "expected an UnknownKey suggestion, got: {errors:?}");
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.endpoints.mode, EndpointMode::Production);
    assert_eq!(config.delivery.max_retries, 5);
    assert_eq!(config.delivery.base_delay_ms, 1000);
    assert_eq!(config.delivery.max_delay_ms, 8000);
    assert_eq!(config.delivery.request_timeout_secs, 20);
    assert_eq!(config.health.success_window_secs, 120);
    assert_eq!(config.health.failure_threshold, 3);
    assert_eq!(config.speech.backend, SpeechBackend::Native);
    assert!(config.speech.api_key.is_none());
    assert_eq!(config.header.emotion_display_secs, 8);
}

/// Dotted overrides (what the env provider produces) land on the right keys.
#[test]
fn dotted_override_sets_delivery_key() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: ParloConfig = Figment::new()
        .merge(Serialized::defaults(ParloConfig::default()))
        .merge(Toml::string("[delivery]\nmax_retries = 2\n"))
        .merge(("delivery.max_retries", 7))
        .merge(("speech.api_key", "from-env"))
        .extract()
        .expect("should merge overrides");

    assert_eq!(config.delivery.max_retries, 7);
    assert_eq!(config.speech.api_key.as_deref(), Some("from-env"));
}

/// Missing config files are silently skipped.
#[test]
fn missing_config_files_silently_skipped() {
    let config = parlo_config::load_config_from_path(std::path::Path::new(
        "/nonexistent/path/parlo.toml",
    ))
    .expect("missing file should be silently skipped");
    assert_eq!(config.delivery.max_retries, 5);
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telemetry]
enabled = true
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("telemetry"),
        "got: {err_str}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_errors_surface_from_str_loader() {
    let toml = r#"
[delivery]
base_delay_ms = 5000
max_delay_ms = 1000
"#;

    let errors = load_and_validate_str(toml).expect_err("delays out of order");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("max_delay_ms"))
    ));
}

/// Wrong value type is reported as InvalidValue.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[delivery]
max_retries = "five"
"#;

    let errors = load_and_validate_str(toml).expect_err("string for integer");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidValue { .. } | ConfigError::Other(_))),
        "got: {errors:?}"
    );
}

#[test]
fn suggestion_threshold_filters_noise() {
    assert_eq!(suggest_key("mod", &["mode", "test"]), Some("mode".to_string()));
    assert_eq!(suggest_key("xyz", &["production"]), None);
}
