//! Settings persistence
//!
//! One JSON file. A missing file reads as defaults and is only created on
//! the first save; unknown sections are filled from defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::models::settings::AppSettings;
use crate::utils::error::{AppError, AppResult};

/// The settings file on disk
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> AppResult<AppSettings> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No settings at {}, using defaults", self.path.display());
                return Ok(AppSettings::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            AppError::Config(format!("malformed settings in {}: {}", self.path.display(), e))
        })
    }

    /// Written to a sibling temp file, then renamed over the target
    pub fn save(&self, settings: &AppSettings) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Config(format!("cannot serialize settings: {}", e)))?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)
            .and_then(|_| fs::rename(&staging, &self.path))
            .map_err(|e| AppError::Config(format!("cannot write {}: {}", self.path.display(), e)))?;

        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    pub fn reset(&self) -> AppResult<AppSettings> {
        let defaults = AppSettings::default();
        self.save(&defaults)?;
        Ok(defaults)
    }
}
