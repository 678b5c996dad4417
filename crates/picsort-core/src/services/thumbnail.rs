//! Thumbnail and preview rendering
//!
//! Decodes a source image once and derives both artifacts from it

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage};

use crate::models::artifact::Artifact;
use crate::models::settings::ThumbnailSettings;
use crate::utils::error::{AppError, AppResult};

/// Produces the artifact pair for a source image.
///
/// This is the only place the build pipeline touches source files.
pub trait ImageRenderer: Send + Sync {
    fn render(&self, source_path: &Path) -> AppResult<Artifact>;
}

/// Box an artifact must fit in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Default renderer backed by the `image` crate
#[derive(Debug, Clone)]
pub struct ThumbnailService {
    thumbnail_box: BoundingBox,
    preview_box: BoundingBox,
    apply_orientation: bool,
}

impl ThumbnailService {
    pub fn new(settings: &ThumbnailSettings) -> Self {
        Self {
            thumbnail_box: BoundingBox::new(settings.thumbnail_width, settings.thumbnail_height),
            preview_box: BoundingBox::new(settings.preview_width, settings.preview_height),
            apply_orientation: settings.apply_orientation,
        }
    }

    pub fn thumbnail_box(&self) -> BoundingBox {
        self.thumbnail_box
    }

    pub fn preview_box(&self) -> BoundingBox {
        self.preview_box
    }

    /// Open and decode a source image
    pub fn decode(&self, source_path: &Path) -> AppResult<DynamicImage> {
        let img = image::open(source_path).map_err(|e| AppError::Decode {
            path: source_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if self.apply_orientation {
            Ok(apply_orientation(source_path, img))
        } else {
            Ok(img)
        }
    }
}

impl Default for ThumbnailService {
    fn default() -> Self {
        Self::new(&ThumbnailSettings::default())
    }
}

impl ImageRenderer for ThumbnailService {
    fn render(&self, source_path: &Path) -> AppResult<Artifact> {
        let img = self.decode(source_path)?;

        let thumbnail = fit_within(&img, self.thumbnail_box);
        let preview = fit_within(&img, self.preview_box);

        Ok(Artifact::new(thumbnail, preview))
    }
}

/// Downscale to fit `bounds`, keeping aspect ratio; never upsamples
pub fn fit_within(img: &DynamicImage, bounds: BoundingBox) -> DynamicImage {
    if img.width() <= bounds.width && img.height() <= bounds.height {
        return img.clone();
    }
    img.resize(bounds.width, bounds.height, FilterType::Lanczos3)
}

/// Encode as JPEG for storage
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> AppResult<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(buf)
}

/// Decode stored artifact bytes
pub fn decode_image(bytes: &[u8]) -> AppResult<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Apply EXIF orientation
fn apply_orientation(source_path: &Path, img: DynamicImage) -> DynamicImage {
    let orientation = read_exif_orientation(source_path).unwrap_or(1);

    match orientation {
        1 => img,
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Read EXIF orientation
fn read_exif_orientation(path: &Path) -> Option<u32> {
    let file = std::fs::File::open(path).ok()?;
    let mut bufreader = std::io::BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut bufreader).ok()?;

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
}
