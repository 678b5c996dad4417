//! Dataset scanner
//!
//! Walks a dataset root and collects image files by extension

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::models::settings::ScanSettings;
use crate::utils::error::{AppError, AppResult};

/// Extension allow-list (lower-case, without the dot)
pub const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Optional extension, enabled by [`ScanOptions::include_gif`]
pub const GIF_FORMAT: &str = "gif";

/// Scan result
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Image paths in walk order
    pub files: Vec<PathBuf>,
    /// Directories visited
    pub dirs_scanned: usize,
    /// Non-image files seen
    pub files_skipped: usize,
}

/// Scan options
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    pub include_gif: bool,
    pub follow_links: bool,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self {
            include_gif: true,
            follow_links: false,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&ScanSettings> for ScanOptions {
    fn from(settings: &ScanSettings) -> Self {
        Self {
            include_gif: settings.include_gif,
            follow_links: settings.follow_links,
        }
    }
}

/// File scanner
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn with_defaults() -> Self {
        Self::new(ScanOptions::new())
    }

    /// Recursively collect image paths under `path`
    ///
    /// All-or-nothing: any unreadable entry aborts the scan with
    /// [`AppError::Scan`] and the partial result is discarded.
    pub fn scan_directory(&self, path: &Path) -> AppResult<ScanResult> {
        if path.exists() && !path.is_dir() {
            return Err(AppError::InvalidPath(format!(
                "not a directory: {}",
                path.display()
            )));
        }

        let walker = WalkDir::new(path).follow_links(self.options.follow_links);

        let mut files = Vec::new();
        let mut dirs_scanned = 0usize;
        let mut files_skipped = 0usize;

        for entry in walker {
            let entry = entry.map_err(|source| AppError::Scan {
                path: path.to_path_buf(),
                source,
            })?;

            if entry.file_type().is_dir() {
                dirs_scanned += 1;
            } else if self.is_supported_image(entry.path()) {
                files.push(entry.into_path());
            } else {
                files_skipped += 1;
            }
        }

        tracing::info!(
            "Scan finished: {} directories, {} images, {} skipped",
            dirs_scanned,
            files.len(),
            files_skipped
        );

        Ok(ScanResult {
            files,
            dirs_scanned,
            files_skipped,
        })
    }

    fn is_supported_image(&self, path: &Path) -> bool {
        match lower_extension(path) {
            Some(ext) => {
                SUPPORTED_FORMATS.contains(&ext.as_str())
                    || (self.options.include_gif && ext == GIF_FORMAT)
            }
            None => false,
        }
    }
}

/// Quick check against the default allow-list (gif included)
pub fn is_image_file(path: &Path) -> bool {
    lower_extension(path)
        .map(|ext| SUPPORTED_FORMATS.contains(&ext.as_str()) || ext == GIF_FORMAT)
        .unwrap_or(false)
}

fn lower_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
