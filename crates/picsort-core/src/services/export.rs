//! Dataset export
//!
//! Materializes the bin layout as a directory tree:
//! `<destination>/<export dir>/<bin_id>/<file name>`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::db::Database;
use crate::utils::error::{AppError, AppResult};

/// Outcome of a fully successful export
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub export_root: PathBuf,
    /// Files copied
    pub copied: usize,
    /// Bin directories written
    pub bins: usize,
}

/// Copies every bin's members out of a loaded dataset
pub struct Exporter<'a> {
    db: &'a Database,
    dataset_root: &'a Path,
    dir_name: &'a str,
}

impl<'a> Exporter<'a> {
    pub fn new(db: &'a Database, dataset_root: &'a Path, dir_name: &'a str) -> Self {
        Self {
            db,
            dataset_root,
            dir_name,
        }
    }

    /// Export bins `0..=bin_count` below `destination`
    ///
    /// Rejects the dataset root itself as destination before touching the
    /// filesystem. Per-file copy failures are collected and reported as one
    /// [`AppError::Copy`] after every other file has been copied; failing to
    /// create a directory aborts at once.
    pub fn export<F>(&self, destination: &Path, bin_count: i64, on_progress: F) -> AppResult<ExportReport>
    where
        F: Fn(f64, &str),
    {
        if same_location(destination, self.dataset_root) {
            return Err(AppError::InvalidDestination(destination.to_path_buf()));
        }

        let mut plan = Vec::new();
        for bin_id in 0..=bin_count.max(0) {
            plan.push((bin_id, self.db.get_image_paths(bin_id)?));
        }
        let total: usize = plan.iter().map(|(_, paths)| paths.len()).sum();

        let export_root = destination.join(self.dir_name);
        fs::create_dir_all(&export_root)?;
        tracing::info!(
            "Exporting {} files in {} bins to {}",
            total,
            plan.len(),
            export_root.display()
        );

        let mut done = 0usize;
        let mut copied = 0usize;
        let mut failed: Vec<PathBuf> = Vec::new();

        for (bin_id, paths) in &plan {
            let bin_dir = export_root.join(bin_id.to_string());
            fs::create_dir_all(&bin_dir)?;

            for source in paths {
                let name = match source.file_name() {
                    Some(name) => name,
                    None => {
                        tracing::warn!("Cannot export {}: no file name", source.display());
                        failed.push(source.clone());
                        done += 1;
                        continue;
                    }
                };

                match copy_bytes(source, &bin_dir.join(name)) {
                    Ok(()) => copied += 1,
                    Err(e) => {
                        tracing::warn!("Failed to copy {}: {}", source.display(), e);
                        failed.push(source.clone());
                    }
                }

                done += 1;
                let label = format!("bin {}/{}", bin_id, name.to_string_lossy());
                on_progress(done as f64 / total as f64, &label);
            }
        }

        if !failed.is_empty() {
            tracing::error!(
                "Export finished with {} failed copies: {:?}",
                failed.len(),
                failed
            );
            return Err(AppError::Copy {
                failed: failed.len(),
            });
        }

        tracing::info!("Exported {} files to {}", copied, export_root.display());
        Ok(ExportReport {
            export_root,
            copied,
            bins: plan.len(),
        })
    }
}

fn copy_bytes(source: &Path, target: &Path) -> std::io::Result<()> {
    let bytes = fs::read(source)?;
    fs::write(target, bytes)
}

/// Path equality after resolving both sides when possible
fn same_location(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
