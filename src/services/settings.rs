//! Settings store — the two locally persisted preferences.
//!
//! Values live in a flat JSON object (`{"user_name": "...", "gemini_api_key": "..."}`)
//! at a configurable path. A missing file is an empty store. Every write
//! rewrites the whole file while holding the lock, so the file always
//! matches the last committed value.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

pub const USER_NAME_KEY: &str = "user_name";
pub const API_KEY_KEY: &str = "gemini_api_key";
pub const DEFAULT_SETTINGS_PATH: &str = "databot-settings.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings parse: {0}")]
    Parse(#[from] serde_json::Error),
}

impl crate::error::ErrorCode for SettingsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_SETTINGS_IO",
            Self::Parse(_) => "E_SETTINGS_PARSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl SettingsStore {
    /// Load settings from `path`. A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file exists but cannot be read or is not
    /// a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values: BTreeMap<String, String> = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = values.len(), "settings: loaded");
        Ok(Self { path, values: Mutex::new(values) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.values.lock().await.get(key).cloned()
    }

    /// Store `value` under `key`. `None` or a blank value removes the key.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file cannot be written. The in-memory
    /// value is left unchanged in that case.
    pub async fn set(&self, key: &str, value: Option<&str>) -> Result<(), SettingsError> {
        self.set_many(&[(key, value)]).await
    }

    /// Apply several `set`s with a single file rewrite. Either every change
    /// is committed or none is.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file cannot be written.
    pub async fn set_many(&self, changes: &[(&str, Option<&str>)]) -> Result<(), SettingsError> {
        let mut values = self.values.lock().await;
        let mut next = values.clone();
        for (key, value) in changes {
            match value.map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => next.insert((*key).to_string(), v.to_string()),
                None => next.remove(*key),
            };
        }
        if next == *values {
            return Ok(());
        }

        let contents = serde_json::to_string_pretty(&next)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&self.path, contents).await?;
        *values = next;
        info!(keys = changes.len(), "settings: saved");
        Ok(())
    }

    pub async fn user_name(&self) -> Option<String> {
        self.get(USER_NAME_KEY).await
    }

    pub async fn api_key(&self) -> Option<String> {
        self.get(API_KEY_KEY).await
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
