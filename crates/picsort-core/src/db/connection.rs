//! Store connection management
//!
//! Opens the per-dataset SQLite file and runs schema initialization

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::utils::error::{AppError, AppResult};

use super::schema::{INIT_SCHEMA, METADATA_SCHEMA, SCHEMA_VERSION};

/// Name of the store file inside a dataset root
pub const STORE_FILE_NAME: &str = ".picsort.db";

/// Default JPEG quality for stored artifacts
const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Store location for a dataset root
pub fn store_path(dataset_root: &Path) -> PathBuf {
    dataset_root.join(STORE_FILE_NAME)
}

/// Handle to one dataset's artifact store
///
/// The single connection is guarded by a mutex, so at most one
/// transaction is active at a time.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
    jpeg_quality: u8,
}

impl Database {
    /// Open or create the store at `path`
    pub fn open(path: PathBuf) -> AppResult<Self> {
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .map_err(|source| AppError::StoreOpen {
            path: path.clone(),
            source,
        })?;

        Self::from_connection(conn, path)
    }

    /// Open or create the store belonging to a dataset root
    pub fn open_for_dataset(dataset_root: &Path) -> AppResult<Self> {
        let path = store_path(dataset_root);
        tracing::info!("Opening store: {}", path.display());
        Self::open(path)
    }

    /// Open an in-memory store (for tests)
    pub fn open_in_memory() -> AppResult<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| AppError::StoreOpen {
            path: path.clone(),
            source,
        })?;

        Self::from_connection(conn, path)
    }

    fn from_connection(conn: Connection, path: PathBuf) -> AppResult<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        };

        db.configure()
            .and_then(|_| db.init())
            .map_err(|e| match e {
                AppError::Database(source) | AppError::StoreWrite(source) => AppError::StoreOpen {
                    path: db.path.clone(),
                    source,
                },
                other => other,
            })?;

        Ok(db)
    }

    /// Set the JPEG quality used when encoding artifacts
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub(crate) fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    fn configure(&self) -> AppResult<()> {
        let conn = self.connection()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;

        Ok(())
    }

    /// Idempotent schema initialization gated by the stored schema version
    fn init(&self) -> AppResult<()> {
        let mut conn = self.connection()?;

        conn.execute_batch(METADATA_SCHEMA)?;

        let current = read_schema_version(&conn)?;
        if current >= SCHEMA_VERSION {
            tracing::debug!("Store schema up to date, version: {}", current);
            return Ok(());
        }

        tracing::info!("Initializing store schema version {}", SCHEMA_VERSION);

        let tx = conn.transaction()?;
        tx.execute_batch(INIT_SCHEMA)?;
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_applied_at', ?1)",
            params![chrono::Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        Ok(())
    }

    /// Stored schema version (0 when uninitialized)
    pub fn schema_version(&self) -> AppResult<i64> {
        let conn = self.connection()?;
        read_schema_version(&conn)
    }

    /// Lock the connection
    pub fn connection(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AppError::General(format!("store connection lock poisoned: {}", e)))
    }

    /// Run `f` inside one transaction
    ///
    /// Begin and commit failures are reported as [`AppError::StoreWrite`];
    /// an error returned by `f` rolls the transaction back.
    pub fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(AppError::StoreWrite)?;
        let result = f(&tx)?;
        tx.commit().map_err(AppError::StoreWrite)?;
        Ok(result)
    }

    /// Store file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Release the backing handle
    ///
    /// The connection is closed once the last clone of this handle goes away.
    pub fn close(self) -> AppResult<()> {
        let path = self.path;
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex
                    .into_inner()
                    .map_err(|e| AppError::General(format!("store connection lock poisoned: {}", e)))?;
                conn.close().map_err(|(_, e)| AppError::Database(e))?;
                tracing::info!("Closed store: {}", path.display());
            }
            Err(_) => {
                tracing::debug!("Store still shared, closing on last drop: {}", path.display());
            }
        }
        Ok(())
    }

    /// Store statistics
    pub fn stats(&self) -> AppResult<StoreStats> {
        let (artifact_count, membership_count) = {
            let conn = self.connection()?;
            let artifacts: i64 =
                conn.query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))?;
            let memberships: i64 =
                conn.query_row("SELECT COUNT(*) FROM bins", [], |row| row.get(0))?;
            (artifacts, memberships)
        };

        let bin_counts = self.bin_counts()?;

        let db_size = std::fs::metadata(&self.path)
            .map(|m| m.len() as i64)
            .unwrap_or(0);

        Ok(StoreStats {
            artifact_count,
            membership_count,
            bin_counts,
            db_size,
        })
    }
}

fn read_schema_version(conn: &Connection) -> AppResult<i64> {
    let version: Option<i64> = conn
        .query_row(
            "SELECT CAST(value AS INTEGER) FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.unwrap_or(0))
}

/// Store statistics
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub artifact_count: i64,
    pub membership_count: i64,
    /// `(bin_id, member count)` for every non-empty bin
    pub bin_counts: Vec<(i64, i64)>,
    pub db_size: i64,
}
