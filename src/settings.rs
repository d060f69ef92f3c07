use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid base URI {uri:?}: {reason}")]
    InvalidBaseUri { uri: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Caption of the entry `clear()` resets to.
    pub home_title: String,
    /// Location of the Home entry; the navigator's base URI when unset.
    pub base_uri: Option<String>,
    pub log_level: String, // "error", "warn", "info", "debug", "trace", "off"
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home_title: "Home".to_string(),
            base_uri: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from `path`, falling back to defaults if the file is
    /// missing, unreadable or not valid JSON. An invalid `base_uri` is dropped
    /// on its own.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let mut settings = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<Settings>(&content).unwrap_or_else(|e| {
                log::warn!("[Settings] Failed to parse settings: {}, returning defaults", e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("[Settings] Failed to read file: {}, returning defaults", e);
                return Self::default();
            }
        };

        if let Err(e) = settings.validate() {
            log::warn!("[Settings] {}, ignoring base_uri", e);
            settings.base_uri = None;
        }
        settings
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        self.validate()?;
        let tmp_path = path.with_extension("tmp");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        // Write to tmp, then rename, so a crash never leaves a half-written file.
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, path)?;

        Ok(())
    }

    /// Accepts an absolute URL or an absolute path such as `/admin`.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let Some(uri) = self.base_uri.as_deref() else {
            return Ok(());
        };

        let parsed = if uri.starts_with('/') {
            Url::parse("http://localhost").and_then(|root| root.join(uri))
        } else {
            Url::parse(uri)
        };

        parsed.map(|_| ()).map_err(|e| SettingsError::InvalidBaseUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })
    }

    /// Unknown levels fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
