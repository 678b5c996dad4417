#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::DynamicImage;
use picsort_core::{AppError, AppResult, AppSettings, Artifact, CoreUi, ImageRenderer, ThumbnailService};

/// UI collaborator that records what the core asked of it
#[derive(Default)]
pub struct RecordingUi {
    pub bins: i64,
    pub fractions: Mutex<Vec<f64>>,
    pub errors: Mutex<Vec<String>>,
    pub reloads: Mutex<Vec<i64>>,
}

impl RecordingUi {
    pub fn new(bins: i64) -> Arc<Self> {
        Arc::new(Self {
            bins,
            ..Default::default()
        })
    }

    pub fn max_fraction(&self) -> f64 {
        self.fractions
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .fold(0.0, f64::max)
    }

    pub fn take_reloads(&self) -> Vec<i64> {
        std::mem::take(&mut *self.reloads.lock().unwrap())
    }
}

impl CoreUi for RecordingUi {
    fn show_progress_dialog(&self, _message: &str) {
        self.fractions.lock().unwrap().clear();
    }

    fn set_progress(&self, fraction: f64, _label: &str) {
        self.fractions.lock().unwrap().push(fraction);
    }

    fn hide_progress_dialog(&self) {}

    fn show_error_dialog(&self, error: &AppError) {
        self.errors.lock().unwrap().push(error.code().to_string());
    }

    fn reload_all(&self) {}

    fn reload_bin(&self, bin_id: i64) {
        self.reloads.lock().unwrap().push(bin_id);
    }

    fn focus_thumbnails(&self, _bin_id: i64) {}

    fn bin_count(&self) -> i64 {
        self.bins
    }
}

/// Renderer that counts how often a source file is decoded
pub struct CountingRenderer {
    inner: ThumbnailService,
    calls: AtomicUsize,
}

impl CountingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: ThumbnailService::default(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageRenderer for CountingRenderer {
    fn render(&self, source_path: &Path) -> AppResult<Artifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.render(source_path)
    }
}

pub fn settings() -> AppSettings {
    let mut settings = AppSettings::default();
    settings.performance.build_threads = 4;
    settings
}

pub fn write_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::new_rgb8(640, 480).save(&path).unwrap();
    path
}

/// A file that starts like a JPEG and then stops
pub fn write_truncated(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00").unwrap();
    path
}
