//! Application directories
//!
//! PicSort keeps two things outside a dataset: its settings file and its
//! log files. Per-dataset state lives in the dataset root instead (see
//! [`crate::db::store_path`]).

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

pub const APP_DIR_NAME: &str = "picsort";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const LOG_DIR_NAME: &str = "logs";

/// Where PicSort keeps its settings and logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    config_dir: PathBuf,
}

impl AppDirs {
    /// `<platform config dir>/picsort`
    pub fn locate() -> AppResult<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| AppError::Config("no config directory on this platform".to_string()))?;
        Ok(Self::at(base.join(APP_DIR_NAME)))
    }

    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config_dir.join(LOG_DIR_NAME)
    }
}
