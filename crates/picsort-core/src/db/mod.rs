//! PicSort store module
//!
//! Connection management and data access for the per-dataset store

pub mod schema;
pub mod connection;
pub mod artifact_dao;
pub mod bin_dao;

use std::path::Path;

use crate::utils::path::normalize_path;

pub use connection::{Database, StoreStats, store_path, STORE_FILE_NAME};

/// Key under which a path is stored; differently spelled paths to the
/// same file share one key.
pub(crate) fn path_key(path: &Path) -> String {
    normalize_path(path).to_string_lossy().into_owned()
}
