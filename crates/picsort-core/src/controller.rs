//! Bin controller
//!
//! The facade a UI collaborator drives. It owns the store handle for the
//! loaded dataset and tells the UI what to refresh after each mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use crate::db::{Database, StoreStats};
use crate::events::SharedCoreUi;
use crate::models::artifact::{ALL_BINS, MAX_BIN_ID, UNSORTED_BIN};
use crate::models::settings::AppSettings;
use crate::services::cache::{ArtifactCache, CacheResolver};
use crate::services::export::{ExportReport, Exporter};
use crate::services::pipeline::{BuildPipeline, BuildReport};
use crate::services::scanner::{ScanOptions, Scanner};
use crate::services::thumbnail::{ImageRenderer, ThumbnailService};
use crate::utils::error::{AppError, AppResult};
use crate::utils::path::{absolute_path, normalize_path};

/// Message shown while a dataset loads or exports
pub const BUSY_MESSAGE: &str = "hang on, this may take a while...";

pub struct BinController {
    ui: SharedCoreUi,
    settings: AppSettings,
    renderer: Arc<dyn ImageRenderer>,
    cache: Arc<ArtifactCache>,
    store: Option<Database>,
    dataset_root: Option<PathBuf>,
    image_paths: Vec<PathBuf>,
}

impl BinController {
    pub fn new(ui: SharedCoreUi, settings: AppSettings) -> Self {
        let renderer = Arc::new(ThumbnailService::new(&settings.thumbnail));
        Self::with_renderer(ui, settings, renderer)
    }

    /// Use a custom renderer in place of [`ThumbnailService`]
    pub fn with_renderer(
        ui: SharedCoreUi,
        settings: AppSettings,
        renderer: Arc<dyn ImageRenderer>,
    ) -> Self {
        Self {
            ui,
            settings,
            renderer,
            cache: Arc::new(ArtifactCache::new()),
            store: None,
            dataset_root: None,
            image_paths: Vec::new(),
        }
    }

    /// Load a dataset: open its store, scan, and build every artifact
    ///
    /// Any previously loaded dataset is closed first. On failure the
    /// progress dialog is hidden, the error is shown, and no dataset is
    /// left loaded.
    pub fn load_dataset(&mut self, path: &Path) -> AppResult<BuildReport> {
        self.close();
        self.ui.show_progress_dialog(BUSY_MESSAGE);

        let result = self.load_inner(path);
        self.ui.hide_progress_dialog();

        match result {
            Ok(report) => {
                self.ui.reload_all();
                self.ui.focus_thumbnails(ALL_BINS);
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Failed to load dataset {}: {}", path.display(), e);
                self.ui.show_error_dialog(&e);
                Err(e)
            }
        }
    }

    fn load_inner(&mut self, path: &Path) -> AppResult<BuildReport> {
        // every spelling of the root must produce the same path keys
        let root = absolute_path(path)?;

        let db = Database::open_for_dataset(&root)?
            .with_jpeg_quality(self.settings.thumbnail.quality);

        let scan = Scanner::new(ScanOptions::from(&self.settings.scan)).scan_directory(&root)?;

        let pipeline = BuildPipeline::new(
            CacheResolver::new(self.cache.clone(), db.clone()),
            self.renderer.clone(),
            self.settings.performance.effective_threads(),
        );
        let ui = self.ui.clone();
        let report = pipeline.build(&scan.files, |fraction, label| ui.set_progress(fraction, label))?;

        tracing::info!("Loaded dataset {}", root.display());
        self.image_paths = scan.files;
        self.store = Some(db);
        self.dataset_root = Some(root);
        Ok(report)
    }

    /// Paths in a bin, or every path with an artifact for [`ALL_BINS`]
    ///
    /// Errors are shown to the user and yield an empty list.
    pub fn get_image_paths(&self, bin_id: i64) -> Vec<PathBuf> {
        let result = self.store().and_then(|db| db.get_image_paths(bin_id));
        self.surface(result).unwrap_or_default()
    }

    /// Cached thumbnail; `None` when the path has no artifact
    pub fn get_thumbnail(&self, path: &Path) -> Option<DynamicImage> {
        if let Some(artifact) = self.cache.get(&normalize_path(path)) {
            return Some(artifact.thumbnail.clone());
        }
        self.store.as_ref()?.get_thumbnail(path)
    }

    /// Cached preview; `None` when the path has no artifact
    pub fn get_preview(&self, path: &Path) -> Option<DynamicImage> {
        if let Some(artifact) = self.cache.get(&normalize_path(path)) {
            return Some(artifact.preview.clone());
        }
        self.store.as_ref()?.get_preview(path)
    }

    /// Move paths between bins and refresh both bin views
    ///
    /// A destination outside `0..=bin_count`, or equal to the source, is
    /// ignored. Returns the number of paths that moved.
    pub fn move_images(&self, paths: &[PathBuf], source_bin: i64, dest_bin: i64) -> AppResult<usize> {
        if source_bin == dest_bin || !self.is_valid_bin(dest_bin) {
            tracing::debug!("Ignoring move from bin {} to bin {}", source_bin, dest_bin);
            return Ok(0);
        }

        let moved = self.surface(
            self.store()
                .and_then(|db| db.update_images(paths, source_bin, dest_bin)),
        )?;

        self.ui.reload_bin(source_bin);
        self.ui.reload_bin(dest_bin);
        Ok(moved)
    }

    /// Tag paths into another bin without removing them from their current one
    pub fn add_images_to_bin(&self, paths: &[PathBuf], dest_bin: i64) -> AppResult<usize> {
        if !self.is_valid_bin(dest_bin) {
            tracing::debug!("Ignoring tag into bin {}", dest_bin);
            return Ok(0);
        }

        let added = self.surface(self.store().and_then(|db| db.add_images_to_bin(paths, dest_bin)))?;

        self.ui.reload_bin(dest_bin);
        Ok(added)
    }

    /// Copy every bin's members into `<destination>/<export dir>/<bin_id>/`
    pub fn export_dataset(&self, destination: &Path) -> AppResult<ExportReport> {
        let (db, root) = match (self.store.as_ref(), self.dataset_root.as_deref()) {
            (Some(db), Some(root)) => (db, root),
            _ => return self.surface(Err(AppError::StoreUnavailable)),
        };

        let bin_count = self.ui.bin_count().clamp(0, MAX_BIN_ID);
        let ui = self.ui.clone();

        ui.show_progress_dialog(BUSY_MESSAGE);
        let result = Exporter::new(db, root, &self.settings.export.dir_name).export(
            destination,
            bin_count,
            |fraction, label| ui.set_progress(fraction, label),
        );
        ui.hide_progress_dialog();

        self.surface(result)
    }

    /// Bins a path belongs to
    pub fn bins_for_path(&self, path: &Path) -> AppResult<Vec<i64>> {
        self.store()?.bins_for_path(path)
    }

    pub fn stats(&self) -> AppResult<StoreStats> {
        self.store()?.stats()
    }

    /// Close the loaded dataset, if any, and drop every cached artifact
    pub fn close(&mut self) {
        if let Some(db) = self.store.take() {
            if let Err(e) = db.close() {
                tracing::warn!("Failed to close store: {}", e);
            }
        }
        self.cache.clear();
        self.image_paths.clear();
        self.dataset_root = None;
    }

    pub fn dataset_root(&self) -> Option<&Path> {
        self.dataset_root.as_deref()
    }

    /// Image paths found by the last scan, in walk order
    pub fn image_paths(&self) -> &[PathBuf] {
        &self.image_paths
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_some()
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    fn store(&self) -> AppResult<&Database> {
        self.store.as_ref().ok_or(AppError::StoreUnavailable)
    }

    fn is_valid_bin(&self, bin_id: i64) -> bool {
        (UNSORTED_BIN..=self.ui.bin_count().min(MAX_BIN_ID)).contains(&bin_id)
    }

    /// Show an error to the user before handing it back
    fn surface<T>(&self, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = &result {
            tracing::error!("{}", e);
            self.ui.show_error_dialog(e);
        }
        result
    }
}

impl Drop for BinController {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CoreUi;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingUi {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingUi {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    impl CoreUi for RecordingUi {
        fn show_progress_dialog(&self, _message: &str) {
            self.record("show_progress".into());
        }
        fn set_progress(&self, _fraction: f64, _label: &str) {}
        fn hide_progress_dialog(&self) {
            self.record("hide_progress".into());
        }
        fn show_error_dialog(&self, error: &AppError) {
            self.record(format!("error:{}", error.code()));
        }
        fn reload_all(&self) {
            self.record("reload_all".into());
        }
        fn reload_bin(&self, bin_id: i64) {
            self.record(format!("reload_bin:{}", bin_id));
        }
        fn focus_thumbnails(&self, bin_id: i64) {
            self.record(format!("focus:{}", bin_id));
        }
        fn bin_count(&self) -> i64 {
            3
        }
    }

    fn controller() -> (BinController, Arc<RecordingUi>) {
        let ui = Arc::new(RecordingUi::default());
        let mut settings = AppSettings::default();
        settings.performance.build_threads = 2;
        (BinController::new(ui.clone(), settings), ui)
    }

    fn dataset(names: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for name in names {
            DynamicImage::new_rgb8(64, 48).save(tmp.path().join(name)).unwrap();
        }
        tmp
    }

    #[test]
    fn test_load_notifies_ui() {
        let tmp = dataset(&["a.jpg", "b.png"]);
        let (mut controller, ui) = controller();

        let report = controller.load_dataset(tmp.path()).unwrap();

        assert_eq!(report.rendered, 2);
        assert_eq!(
            ui.take(),
            vec!["show_progress", "hide_progress", "reload_all", "focus:-1"]
        );
        assert_eq!(controller.get_image_paths(0).len(), 2);
        assert!(controller.get_thumbnail(&tmp.path().join("a.jpg")).is_some());
        assert!(controller.get_preview(&tmp.path().join("b.png")).is_some());
        assert!(controller.get_thumbnail(&tmp.path().join("zzz.jpg")).is_none());
    }

    #[test]
    fn test_failed_load_shows_error_and_hides_progress() {
        let tmp = TempDir::new().unwrap();
        let (mut controller, ui) = controller();

        let err = controller
            .load_dataset(&tmp.path().join("missing"))
            .err()
            .unwrap();

        assert!(matches!(err, AppError::StoreOpen { .. }));
        assert_eq!(
            ui.take(),
            vec!["show_progress", "hide_progress", "error:E_STORE_OPEN"]
        );
        assert!(!controller.is_loaded());
        assert!(controller.dataset_root().is_none());
    }

    #[test]
    fn test_move_refreshes_exactly_two_bins() {
        let tmp = dataset(&["a.jpg", "b.jpg"]);
        let (mut controller, ui) = controller();
        controller.load_dataset(tmp.path()).unwrap();
        ui.take();

        let a = tmp.path().join("a.jpg");
        assert_eq!(controller.move_images(&[a.clone()], 0, 2).unwrap(), 1);

        assert_eq!(ui.take(), vec!["reload_bin:0", "reload_bin:2"]);
        assert_eq!(controller.get_image_paths(2), vec![a.clone()]);
        assert_eq!(controller.bins_for_path(&a).unwrap(), vec![2]);
    }

    #[test]
    fn test_move_out_of_range_is_ignored() {
        let tmp = dataset(&["a.jpg"]);
        let (mut controller, ui) = controller();
        controller.load_dataset(tmp.path()).unwrap();
        ui.take();

        let a = vec![tmp.path().join("a.jpg")];
        assert_eq!(controller.move_images(&a, 0, 4).unwrap(), 0);
        assert_eq!(controller.move_images(&a, 0, 0).unwrap(), 0);
        assert_eq!(controller.move_images(&a, 0, -1).unwrap(), 0);

        assert!(ui.take().is_empty());
        assert_eq!(controller.get_image_paths(0), a);
    }

    #[test]
    fn test_add_images_refreshes_destination_only() {
        let tmp = dataset(&["a.jpg"]);
        let (mut controller, ui) = controller();
        controller.load_dataset(tmp.path()).unwrap();
        ui.take();

        let a = tmp.path().join("a.jpg");
        assert_eq!(controller.add_images_to_bin(&[a.clone()], 1).unwrap(), 1);

        assert_eq!(ui.take(), vec!["reload_bin:1"]);
        assert_eq!(controller.bins_for_path(&a).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_queries_without_dataset_surface_errors() {
        let (controller, ui) = controller();

        assert!(controller.get_image_paths(0).is_empty());
        assert!(controller.get_thumbnail(Path::new("/nowhere.jpg")).is_none());

        let err = controller
            .export_dataset(Path::new("/tmp"))
            .err()
            .unwrap();
        assert!(matches!(err, AppError::StoreUnavailable));

        assert_eq!(
            ui.take(),
            vec!["error:E_STORE_UNAVAILABLE", "error:E_STORE_UNAVAILABLE"]
        );
    }

    #[test]
    fn test_export_to_dataset_root_is_rejected() {
        let tmp = dataset(&["a.jpg"]);
        let (mut controller, ui) = controller();
        controller.load_dataset(tmp.path()).unwrap();
        ui.take();

        let err = controller.export_dataset(tmp.path()).err().unwrap();

        assert!(matches!(err, AppError::InvalidDestination(_)));
        assert_eq!(
            ui.take(),
            vec!["show_progress", "hide_progress", "error:E_INVALID_DESTINATION"]
        );
    }

    #[test]
    fn test_close_is_repeatable() {
        let tmp = dataset(&["a.jpg"]);
        let (mut controller, _ui) = controller();
        controller.load_dataset(tmp.path()).unwrap();

        controller.close();
        controller.close();

        assert!(!controller.is_loaded());
        assert!(controller.image_paths().is_empty());
        assert!(controller.get_thumbnail(&tmp.path().join("a.jpg")).is_none());
    }

    #[test]
    fn test_loading_another_dataset_replaces_the_first() {
        let first = dataset(&["a.jpg"]);
        let second = dataset(&["x.jpg", "y.jpg"]);
        let (mut controller, _ui) = controller();

        controller.load_dataset(first.path()).unwrap();
        controller.load_dataset(second.path()).unwrap();

        assert_eq!(controller.dataset_root(), Some(second.path()));
        assert_eq!(controller.get_image_paths(ALL_BINS).len(), 2);
        assert!(controller.get_thumbnail(&first.path().join("a.jpg")).is_none());
    }

    #[test]
    fn test_reload_under_another_spelling_keeps_sort_state() {
        let tmp = dataset(&["a.jpg", "b.jpg"]);
        let (mut controller, _ui) = controller();
        controller.load_dataset(tmp.path()).unwrap();

        let a = tmp.path().join("a.jpg");
        controller.move_images(&[a.clone()], 0, 3).unwrap();

        let report = controller.load_dataset(&tmp.path().join(".")).unwrap();

        assert_eq!(report.rendered, 0);
        assert_eq!(report.cached, 2);
        assert_eq!(controller.dataset_root(), Some(tmp.path()));
        assert_eq!(controller.get_image_paths(ALL_BINS).len(), 2);
        assert_eq!(controller.get_image_paths(0), vec![tmp.path().join("b.jpg")]);
        assert_eq!(controller.bins_for_path(&a).unwrap(), vec![3]);
        assert_eq!(
            controller.bins_for_path(&tmp.path().join(".").join("a.jpg")).unwrap(),
            vec![3]
        );
    }

    #[test]
    fn test_failed_flush_keeps_session_artifacts() {
        let tmp = dataset(&["a.jpg", "b.jpg"]);
        {
            // the membership table is gone, so the batched write cannot start
            let db = Database::open_for_dataset(tmp.path()).unwrap();
            db.connection().unwrap().execute_batch("DROP TABLE bins;").unwrap();
            db.close().unwrap();
        }

        let (mut controller, ui) = controller();
        let report = controller.load_dataset(tmp.path()).unwrap();

        assert_eq!(report.rendered, 2);
        assert_eq!(report.persisted, 0);
        assert!(!ui.take().iter().any(|call| call.starts_with("error:")));
        assert!(controller.get_thumbnail(&tmp.path().join("a.jpg")).is_some());
        assert!(controller.get_preview(&tmp.path().join("b.jpg")).is_some());
        assert_eq!(controller.stats().err().map(|e| e.code()), Some("E_DB_ERROR"));
    }
}
