// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./parlo.toml` > `~/.config/parlo/parlo.toml` > `/etc/parlo/parlo.toml`
//! with environment variable overrides via `PARLO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ParloConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/parlo/parlo.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "parlo.toml";

/// Path of the per-user config file, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("parlo/parlo.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parlo/parlo.toml` (system-wide)
/// 3. `~/.config/parlo/parlo.toml` (user XDG config)
/// 4. `./parlo.toml` (local directory)
/// 5. `PARLO_*` environment variables
pub fn load_config() -> Result<ParloConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ParloConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParloConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParloConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParloConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ParloConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PARLO_DELIVERY_MAX_RETRIES` must map to
/// `delivery.max_retries`, not `delivery.max.retries`.
fn env_provider() -> Env {
    Env::prefixed("PARLO_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name onto a dotted config key.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 7] = [
        "app",
        "endpoints",
        "delivery",
        "health",
        "speech",
        "header",
        "preferences",
    ];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
