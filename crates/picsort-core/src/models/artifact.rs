//! Cached artifact and bin identifiers

use image::DynamicImage;

/// Wildcard bin id: every path that has an artifact, regardless of bin.
pub const ALL_BINS: i64 = -1;

/// Default bin every newly scanned image is seeded into.
pub const UNSORTED_BIN: i64 = 0;

/// Highest bin id a user can sort into.
pub const MAX_BIN_ID: i64 = 9;

/// Derived raster pair for one source image.
///
/// Both images are always present; a half-built artifact is never stored.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub thumbnail: DynamicImage,
    pub preview: DynamicImage,
}

impl Artifact {
    pub fn new(thumbnail: DynamicImage, preview: DynamicImage) -> Self {
        Self { thumbnail, preview }
    }
}
