//! Bin membership data access

use std::path::{Path, PathBuf};

use rusqlite::params;

use crate::models::artifact::ALL_BINS;
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;
use super::path_key;

impl Database {
    /// Paths in a bin; [`ALL_BINS`] lists every path that has an artifact
    ///
    /// Ordering is storage order and not stable across reloads.
    pub fn get_image_paths(&self, bin_id: i64) -> AppResult<Vec<PathBuf>> {
        let conn = self.connection()?;

        let paths = if bin_id == ALL_BINS {
            let mut stmt = conn.prepare("SELECT path FROM artifacts")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        } else {
            let mut stmt = conn.prepare("SELECT path FROM bins WHERE bin_id = ?1")?;
            let rows = stmt
                .query_map(params![bin_id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        Ok(paths.into_iter().map(PathBuf::from).collect())
    }

    /// Move paths from `source_bin` to `dest_bin` in one transaction
    ///
    /// A path not currently in `source_bin` is left untouched, which makes
    /// the move safe to retry. If a path is already tagged into `dest_bin`,
    /// its `source_bin` row is dropped instead.
    ///
    /// Returns the number of paths that left `source_bin`.
    pub fn update_images(
        &self,
        paths: &[PathBuf],
        source_bin: i64,
        dest_bin: i64,
    ) -> AppResult<usize> {
        if source_bin == dest_bin || paths.is_empty() {
            return Ok(0);
        }

        self.transaction(|conn| {
            let mut update = conn
                .prepare("UPDATE OR IGNORE bins SET bin_id = ?3 WHERE path = ?1 AND bin_id = ?2")
                .map_err(AppError::StoreWrite)?;
            let mut drop_source = conn
                .prepare("DELETE FROM bins WHERE path = ?1 AND bin_id = ?2")
                .map_err(AppError::StoreWrite)?;

            let mut moved = 0usize;
            for path in paths {
                let key = path_key(path);
                moved += update.execute(params![key, source_bin, dest_bin])?;
                moved += drop_source.execute(params![key, source_bin])?;
            }

            tracing::info!(
                "Moved {} of {} images from bin {} to bin {}",
                moved,
                paths.len(),
                source_bin,
                dest_bin
            );
            Ok(moved)
        })
    }

    /// Tag paths into `dest_bin` without removing them from other bins
    ///
    /// Returns the number of new membership rows.
    pub fn add_images_to_bin(&self, paths: &[PathBuf], dest_bin: i64) -> AppResult<usize> {
        if paths.is_empty() {
            return Ok(0);
        }

        self.transaction(|conn| {
            let mut stmt = conn
                .prepare("INSERT OR IGNORE INTO bins (path, bin_id) VALUES (?1, ?2)")
                .map_err(AppError::StoreWrite)?;

            let mut added = 0usize;
            for path in paths {
                added += stmt.execute(params![path_key(path), dest_bin])?;
            }

            tracing::info!("Added {} images to bin {}", added, dest_bin);
            Ok(added)
        })
    }

    /// Bins a path currently belongs to, ascending
    pub fn bins_for_path(&self, path: &Path) -> AppResult<Vec<i64>> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare("SELECT bin_id FROM bins WHERE path = ?1 ORDER BY bin_id")?;
        let bins = stmt
            .query_map(params![path_key(path)], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(bins)
    }

    /// `(bin_id, member count)` for every non-empty bin, ascending
    pub fn bin_counts(&self) -> AppResult<Vec<(i64, i64)>> {
        let conn = self.connection()?;

        let mut stmt =
            conn.prepare("SELECT bin_id, COUNT(*) FROM bins GROUP BY bin_id ORDER BY bin_id")?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
