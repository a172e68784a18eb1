// SPDX-FileCopyrightText: 2026 Parlo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted user preferences. The only key in use is the speech mute flag.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parlo_core::ParloError;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

/// Preference key holding the speech mute flag.
pub const MUTED_KEY: &str = "parlo.tts.muted";

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Reads a boolean preference. `None` when never set.
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, ParloError>;

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), ParloError>;
}

fn storage_error(e: impl std::error::Error + Send + Sync + 'static) -> ParloError {
    ParloError::Storage {
        source: Box::new(e),
    }
}

/// Preferences kept in a JSON object file.
pub struct FilePreferenceStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<Map<String, Value>, ParloError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(storage_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw).map_err(storage_error)? {
            Value::Object(map) => Ok(map),
            _ => Err(ParloError::Storage {
                source: format!("{} does not hold a JSON object", self.path.display()).into(),
            }),
        }
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, ParloError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.get(key).and_then(Value::as_bool))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), ParloError> {
        let _guard = self.lock.lock().await;
        // A corrupt file is replaced rather than blocking every write.
        let mut map = self.read_map().await.unwrap_or_default();
        map.insert(key.to_string(), Value::Bool(value));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(storage_error)?;
        }
        let body = serde_json::to_string_pretty(&Value::Object(map)).map_err(storage_error)?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(storage_error)?;
        debug!(key, value, path = %self.path.display(), "preference saved");
        Ok(())
    }
}

/// Preferences that live only as long as the process.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, bool>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, ParloError> {
        Ok(self.values.lock().await.get(key).copied())
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), ParloError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}
