//! PicSort services
//!
//! Scanning, rendering, caching, building and exporting

pub mod cache;
pub mod export;
pub mod pipeline;
pub mod scanner;
pub mod settings;
pub mod thumbnail;

pub use cache::{ArtifactCache, CacheResolver};
pub use export::{ExportReport, Exporter};
pub use pipeline::{BuildAccumulator, BuildPipeline, BuildReport};
pub use scanner::{is_image_file, ScanOptions, ScanResult, Scanner, SUPPORTED_FORMATS};
pub use settings::SettingsStore;
pub use thumbnail::{BoundingBox, ImageRenderer, ThumbnailService};
