//! Error handling for the PicSort core
//!
//! Defines the application error taxonomy

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Dataset walk failed; fatal to the load
    #[error("failed to scan dataset {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The backing store for a dataset root could not be opened or initialized
    #[error("failed to open store {}: {source}", path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A store transaction could not begin or commit
    #[error("failed to write to store: {0}")]
    StoreWrite(#[source] rusqlite::Error),

    /// No dataset is loaded
    #[error("no dataset loaded")]
    StoreUnavailable,

    /// A single image could not be decoded
    #[error("could not decode image {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// Export target equals the loaded dataset root
    #[error(
        "cannot export dataset to the same location, please choose a different destination: {}",
        .0.display()
    )]
    InvalidDestination(PathBuf),

    /// One or more files failed to copy during export
    #[error("failed to copy {failed} files, check logfile for more details")]
    Copy { failed: usize },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid path
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl AppError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Scan { .. } => "E_SCAN",
            AppError::StoreOpen { .. } => "E_STORE_OPEN",
            AppError::StoreWrite(_) => "E_STORE_WRITE",
            AppError::StoreUnavailable => "E_STORE_UNAVAILABLE",
            AppError::Decode { .. } => "E_DECODE",
            AppError::InvalidDestination(_) => "E_INVALID_DESTINATION",
            AppError::Copy { .. } => "E_COPY",
            AppError::Database(_) => "E_DB_ERROR",
            AppError::Io(_) => "E_IO_ERROR",
            AppError::Image(_) => "E_IMAGE_ERROR",
            AppError::InvalidPath(_) => "E_PATH_INVALID",
            AppError::Config(_) => "E_CONFIG",
            AppError::General(_) => "E_GENERAL",
        }
    }
}

/// Error wrapper for collaborators that ship errors across a boundary
#[derive(Debug, Clone, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for CommandError {
    fn from(err: &AppError) -> Self {
        CommandError {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        CommandError::from(&err)
    }
}

/// Application result alias
pub type AppResult<T> = Result<T, AppError>;
