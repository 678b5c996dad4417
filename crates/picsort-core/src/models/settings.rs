//! Application settings model

use serde::{Deserialize, Serialize};

use super::artifact::MAX_BIN_ID;

/// Number of sorting bins shown when nothing else is configured.
pub const DEFAULT_BIN_COUNT: i64 = 5;

/// Bin settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinSettings {
    /// Number of sorting bins (bin 0 "unsorted" is not counted)
    pub count: i64,
}

impl BinSettings {
    /// Configured count clamped to `1..=MAX_BIN_ID`.
    pub fn effective_count(&self) -> i64 {
        self.count.clamp(1, MAX_BIN_ID)
    }
}

impl Default for BinSettings {
    fn default() -> Self {
        Self {
            count: DEFAULT_BIN_COUNT,
        }
    }
}

/// Thumbnail and preview rendering settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThumbnailSettings {
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub preview_width: u32,
    pub preview_height: u32,
    /// JPEG quality (1-100) of stored artifacts
    pub quality: u8,
    /// Rotate/flip according to EXIF orientation before resizing
    pub apply_orientation: bool,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            thumbnail_width: 200,
            thumbnail_height: 200,
            preview_width: 800,
            preview_height: 600,
            quality: 85,
            apply_orientation: true,
        }
    }
}

/// Scan settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanSettings {
    /// Include `.gif` files in the extension allow-list
    pub include_gif: bool,
    /// Follow symbolic links while walking
    pub follow_links: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            include_gif: true,
            follow_links: false,
        }
    }
}

/// Performance settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceSettings {
    /// Build worker count (0 = number of available processing units)
    pub build_threads: usize,
}

impl PerformanceSettings {
    pub fn effective_threads(&self) -> usize {
        if self.build_threads > 0 {
            return self.build_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    /// Name of the directory created inside the export destination
    pub dir_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dir_name: String::from("dataset_export"),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub bins: BinSettings,
    pub thumbnail: ThumbnailSettings,
    pub scan: ScanSettings,
    pub performance: PerformanceSettings,
    pub export: ExportSettings,
}
