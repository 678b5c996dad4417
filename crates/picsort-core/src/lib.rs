//! PicSort Core Library
//!
//! Dataset ingestion and bin-assignment engine for PicSort. The crate walks
//! a folder of images, renders a thumbnail and preview for each one on a
//! worker pool, persists them with per-image bin membership in a SQLite
//! store inside the dataset root, and exposes a small facade for listing,
//! moving and exporting images by bin.
//!
//! It is presentation-agnostic: everything it asks of a UI goes through the
//! [`CoreUi`] trait.
//!
//! # Architecture
//!
//! - `models`: Artifact and settings types
//! - `db`: Per-dataset SQLite store with DAOs
//! - `services`: Scanner, renderer, cache resolver, build pipeline, export
//! - `controller`: [`BinController`] facade
//! - `events`: UI capability abstraction ([`CoreUi`] trait)
//! - `paths`: Settings and log locations ([`AppDirs`])
//! - `utils`: Error handling
//!
//! # Example
//!
//! ```no_run
//! use picsort_core::{AppSettings, BinController, LoggingUi, UNSORTED_BIN};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let mut controller = BinController::new(Arc::new(LoggingUi::default()), AppSettings::default());
//! controller.load_dataset(Path::new("/data/photos")).unwrap();
//!
//! let unsorted = controller.get_image_paths(UNSORTED_BIN);
//! controller.move_images(&unsorted[..1], UNSORTED_BIN, 2).unwrap();
//! ```

pub mod controller;
pub mod db;
pub mod events;
pub mod models;
pub mod paths;
pub mod services;
pub mod utils;

pub use controller::{BinController, BUSY_MESSAGE};
pub use db::{store_path, Database, StoreStats, STORE_FILE_NAME};
pub use events::{CoreUi, LoggingUi, NoOpUi, SharedCoreUi};
pub use models::{Artifact, AppSettings, ALL_BINS, MAX_BIN_ID, UNSORTED_BIN};
pub use paths::AppDirs;
pub use services::{
    ArtifactCache, BuildPipeline, BuildReport, CacheResolver, ExportReport, Exporter,
    ImageRenderer, ScanOptions, ScanResult, Scanner, SettingsStore, ThumbnailService,
};
pub use utils::{AppError, AppResult, CommandError};
