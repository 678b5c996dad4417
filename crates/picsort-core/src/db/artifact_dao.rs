//! Cached artifact data access

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use rusqlite::params;

use crate::models::artifact::{Artifact, UNSORTED_BIN};
use crate::services::thumbnail::{decode_image, encode_jpeg};
use crate::utils::error::{AppError, AppResult};

use super::connection::Database;
use super::path_key;

const SELECT_THUMBNAIL: &str = "SELECT thumbnail FROM artifacts WHERE path = ?1";
const SELECT_PREVIEW: &str = "SELECT preview FROM artifacts WHERE path = ?1";

impl Database {
    /// Stored thumbnail for `path`
    ///
    /// A stored blob that fails to decode is logged and reported as absent.
    pub fn get_thumbnail(&self, path: &Path) -> Option<DynamicImage> {
        self.load_image(SELECT_THUMBNAIL, path, "thumbnail")
    }

    /// Stored preview for `path`
    pub fn get_preview(&self, path: &Path) -> Option<DynamicImage> {
        self.load_image(SELECT_PREVIEW, path, "preview")
    }

    fn load_image(&self, sql: &str, path: &Path, kind: &str) -> Option<DynamicImage> {
        let data: Vec<u8> = {
            let conn = match self.connection() {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!("Error reading {} for {}: {}", kind, path.display(), e);
                    return None;
                }
            };

            match conn.query_row(sql, params![path_key(path)], |row| row.get(0)) {
                Ok(data) => data,
                Err(rusqlite::Error::QueryReturnedNoRows) => return None,
                Err(e) => {
                    tracing::warn!("Error reading {} for {}: {}", kind, path.display(), e);
                    return None;
                }
            }
        };

        match decode_image(&data) {
            Ok(img) => Some(img),
            Err(e) => {
                tracing::warn!("Error decoding stored {} for {}: {}", kind, path.display(), e);
                None
            }
        }
    }

    /// Upsert artifacts and seed bin membership in one transaction
    ///
    /// Every path gets a bin-0 membership row only if it has no membership
    /// row yet, so re-running a load never resets a sorted image. Items that
    /// fail to encode or write are logged and skipped; the rest commit.
    ///
    /// Returns the number of artifacts written.
    pub fn set_images(&self, images: &HashMap<PathBuf, Arc<Artifact>>) -> AppResult<usize> {
        if images.is_empty() {
            return Ok(0);
        }

        let quality = self.jpeg_quality();

        let stored = self.transaction(|conn| {
            let mut upsert = conn
                .prepare(
                    r#"
                    INSERT INTO artifacts (path, thumbnail, preview) VALUES (?1, ?2, ?3)
                    ON CONFLICT(path) DO UPDATE SET
                        thumbnail = excluded.thumbnail,
                        preview = excluded.preview
                    "#,
                )
                .map_err(AppError::StoreWrite)?;

            let mut seed = conn
                .prepare(
                    r#"
                    INSERT INTO bins (path, bin_id)
                    SELECT ?1, ?2
                    WHERE NOT EXISTS (SELECT 1 FROM bins WHERE path = ?1)
                    "#,
                )
                .map_err(AppError::StoreWrite)?;

            let mut stored = 0usize;

            for (path, artifact) in images {
                let encoded = encode_jpeg(&artifact.thumbnail, quality)
                    .and_then(|thumb| encode_jpeg(&artifact.preview, quality).map(|prev| (thumb, prev)));

                let (thumbnail, preview) = match encoded {
                    Ok(blobs) => blobs,
                    Err(e) => {
                        tracing::warn!("Error encoding artifact for {}: {}", path.display(), e);
                        continue;
                    }
                };

                let key = path_key(path);

                if let Err(e) = upsert.execute(params![key, thumbnail, preview]) {
                    tracing::warn!("Error writing artifact for {}: {}", path.display(), e);
                    continue;
                }

                if let Err(e) = seed.execute(params![key, UNSORTED_BIN]) {
                    tracing::warn!("Error seeding bin membership for {}: {}", path.display(), e);
                }

                stored += 1;
            }

            Ok(stored)
        })?;

        tracing::info!("Stored {} of {} artifacts", stored, images.len());
        Ok(stored)
    }

    /// Number of artifact rows
    pub fn artifact_count(&self) -> AppResult<i64> {
        let conn = self.connection()?;
        let count = conn.query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))?;
        Ok(count)
    }
}
