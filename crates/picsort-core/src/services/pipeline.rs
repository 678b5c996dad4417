//! Parallel build pipeline
//!
//! Decodes and downscales every scanned image exactly once on a fixed
//! worker pool, then persists all new artifacts in one batched flush.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::artifact::Artifact;
use crate::utils::error::{AppError, AppResult};

use super::cache::CacheResolver;
use super::thumbnail::ImageRenderer;

/// Results rendered by the workers, keyed by path
#[derive(Debug, Default)]
pub struct BuildAccumulator {
    items: Mutex<HashMap<PathBuf, Arc<Artifact>>>,
}

impl BuildAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Artifact>>> {
        self.items.lock().unwrap_or_else(|e| {
            tracing::warn!("Build accumulator lock was poisoned, recovering");
            e.into_inner()
        })
    }

    pub fn insert(&self, path: PathBuf, artifact: Arc<Artifact>) {
        self.lock().insert(path, artifact);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> HashMap<PathBuf, Arc<Artifact>> {
        self.items.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

/// Outcome of one build pass
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    /// Paths handed to the pipeline
    pub total: usize,
    /// Paths resolved from cache without decoding
    pub cached: usize,
    /// Paths decoded and resized in this pass
    pub rendered: usize,
    /// Paths that could not be decoded
    pub failed: usize,
    /// Artifacts durably written by the final flush
    pub persisted: usize,
    pub failed_files: Vec<PathBuf>,
}

/// Shared per-pass state borrowed by every worker
struct BuildState<'a, F> {
    total: usize,
    processed: AtomicUsize,
    cached: AtomicUsize,
    accumulator: BuildAccumulator,
    failed_files: Mutex<Vec<PathBuf>>,
    on_progress: &'a F,
}

/// Fixed-size worker pool over a preloaded, closed work queue
pub struct BuildPipeline {
    resolver: CacheResolver,
    renderer: Arc<dyn ImageRenderer>,
    workers: usize,
}

impl BuildPipeline {
    pub fn new(resolver: CacheResolver, renderer: Arc<dyn ImageRenderer>, workers: usize) -> Self {
        Self {
            resolver,
            renderer,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every path, blocking until all workers have drained the queue
    ///
    /// `on_progress` receives `(fraction_done, basename)` after every item,
    /// from whichever worker finished it. A failed flush is logged and does
    /// not fail the build; the in-process cache still holds the results.
    pub fn build<F>(&self, paths: &[PathBuf], on_progress: F) -> AppResult<BuildReport>
    where
        F: Fn(f64, &str) + Send + Sync,
    {
        let total = paths.len();
        if total == 0 {
            tracing::info!("Nothing to build");
            return Ok(BuildReport::default());
        }

        let (tx, rx) = crossbeam_channel::bounded::<&Path>(total);
        for path in paths {
            tx.send(path.as_path())
                .map_err(|e| AppError::General(format!("failed to queue build work: {}", e)))?;
        }
        drop(tx);

        let workers = self.workers.min(total);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("picsort-build-{}", i))
            .build()
            .map_err(|e| AppError::General(format!("failed to start build workers: {}", e)))?;

        tracing::info!("Building {} images on {} workers", total, workers);

        let state = BuildState {
            total,
            processed: AtomicUsize::new(0),
            cached: AtomicUsize::new(0),
            accumulator: BuildAccumulator::new(),
            failed_files: Mutex::new(Vec::new()),
            on_progress: &on_progress,
        };

        pool.scope(|scope| {
            for _ in 0..workers {
                let rx = rx.clone();
                let state = &state;
                scope.spawn(move |_| {
                    for path in rx.iter() {
                        self.process_one(path, state);
                    }
                });
            }
        });

        let cached = state.cached.load(Ordering::SeqCst);
        let failed_files = state
            .failed_files
            .into_inner()
            .unwrap_or_else(|e| e.into_inner());
        let built = state.accumulator.into_inner();

        self.resolver
            .cache()
            .extend(built.iter().map(|(path, artifact)| (path.clone(), artifact.clone())));

        let persisted = if built.is_empty() {
            0
        } else {
            match self.resolver.database().set_images(&built) {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::error!("Failed to persist {} artifacts: {}", built.len(), e);
                    0
                }
            }
        };

        let report = BuildReport {
            total,
            cached,
            rendered: built.len(),
            failed: failed_files.len(),
            persisted,
            failed_files,
        };

        tracing::info!(
            "Build finished: {} cached, {} rendered, {} failed, {} persisted",
            report.cached,
            report.rendered,
            report.failed,
            report.persisted
        );

        Ok(report)
    }

    fn process_one<F>(&self, path: &Path, state: &BuildState<'_, F>)
    where
        F: Fn(f64, &str) + Send + Sync,
    {
        if self.resolver.resolve(path).is_some() {
            state.cached.fetch_add(1, Ordering::SeqCst);
        } else {
            match self.renderer.render(path) {
                Ok(artifact) => state
                    .accumulator
                    .insert(path.to_path_buf(), Arc::new(artifact)),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    state
                        .failed_files
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(path.to_path_buf());
                }
            }
        }

        let done = state.processed.fetch_add(1, Ordering::SeqCst) + 1;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (state.on_progress)(done as f64 / state.total as f64, &name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::services::cache::ArtifactCache;
    use crate::services::thumbnail::ThumbnailService;
    use image::DynamicImage;
    use tempfile::TempDir;

    struct CountingRenderer {
        inner: ThumbnailService,
        calls: AtomicUsize,
    }

    impl ImageRenderer for CountingRenderer {
        fn render(&self, source_path: &Path) -> AppResult<Artifact> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.render(source_path)
        }
    }

    fn counting() -> Arc<CountingRenderer> {
        Arc::new(CountingRenderer {
            inner: ThumbnailService::default(),
            calls: AtomicUsize::new(0),
        })
    }

    fn write_images(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                DynamicImage::new_rgb8(320, 240).save(&path).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_build_renders_and_persists() {
        let tmp = TempDir::new().unwrap();
        let paths = write_images(tmp.path(), &["a.jpg", "b.png", "c.jpg"]);
        let db = Database::open_in_memory().unwrap();
        let cache = Arc::new(ArtifactCache::new());
        let renderer = counting();

        let pipeline = BuildPipeline::new(
            CacheResolver::new(cache.clone(), db.clone()),
            renderer.clone(),
            2,
        );
        let report = pipeline.build(&paths, |_, _| {}).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.rendered, 3);
        assert_eq!(report.persisted, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 3);
        assert_eq!(db.artifact_count().unwrap(), 3);
    }

    #[test]
    fn test_cached_paths_skip_decoding() {
        let tmp = TempDir::new().unwrap();
        let paths = write_images(tmp.path(), &["a.jpg", "b.jpg"]);
        let db = Database::open_in_memory().unwrap();

        let first = BuildPipeline::new(
            CacheResolver::new(Arc::new(ArtifactCache::new()), db.clone()),
            counting(),
            4,
        );
        first.build(&paths, |_, _| {}).unwrap();

        // fresh memory cache, so hits must come from the store
        let renderer = counting();
        let cache = Arc::new(ArtifactCache::new());
        let second = BuildPipeline::new(
            CacheResolver::new(cache.clone(), db.clone()),
            renderer.clone(),
            4,
        );
        let report = second.build(&paths, |_, _| {}).unwrap();

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.cached, 2);
        assert_eq!(report.rendered, 0);
        assert_eq!(report.persisted, 0);
        // store hits are served from the store, not held in memory
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_files_still_count_as_progress() {
        let tmp = TempDir::new().unwrap();
        let mut paths = write_images(tmp.path(), &["a.jpg", "b.jpg"]);
        let corrupt = tmp.path().join("c.jpg");
        std::fs::write(&corrupt, b"\xFF\xD8\xFF\xE0truncated").unwrap();
        paths.push(corrupt.clone());

        let db = Database::open_in_memory().unwrap();
        let pipeline = BuildPipeline::new(
            CacheResolver::new(Arc::new(ArtifactCache::new()), db.clone()),
            Arc::new(ThumbnailService::default()),
            3,
        );

        let fractions = Mutex::new(Vec::new());
        let report = pipeline
            .build(&paths, |fraction, _| fractions.lock().unwrap().push(fraction))
            .unwrap();

        assert_eq!(report.failed_files, vec![corrupt]);
        assert_eq!(db.artifact_count().unwrap(), 2);

        let fractions = fractions.into_inner().unwrap();
        assert_eq!(fractions.len(), 3);
        let max = fractions.iter().cloned().fold(0.0f64, f64::max);
        assert!((max - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_labels_are_basenames() {
        let tmp = TempDir::new().unwrap();
        let paths = write_images(tmp.path(), &["only.jpg"]);
        let pipeline = BuildPipeline::new(
            CacheResolver::new(
                Arc::new(ArtifactCache::new()),
                Database::open_in_memory().unwrap(),
            ),
            Arc::new(ThumbnailService::default()),
            1,
        );

        let labels = Mutex::new(Vec::new());
        pipeline
            .build(&paths, |_, label| labels.lock().unwrap().push(label.to_string()))
            .unwrap();

        assert_eq!(labels.into_inner().unwrap(), vec!["only.jpg".to_string()]);
    }

    #[test]
    fn test_empty_build() {
        let pipeline = BuildPipeline::new(
            CacheResolver::new(
                Arc::new(ArtifactCache::new()),
                Database::open_in_memory().unwrap(),
            ),
            Arc::new(ThumbnailService::default()),
            0,
        );
        assert_eq!(pipeline.workers(), 1);

        let report = pipeline.build(&[], |_, _| {}).unwrap();
        assert_eq!(report.total, 0);
    }

    #[test]
    fn test_failed_flush_keeps_results_in_memory() {
        let tmp = TempDir::new().unwrap();
        let paths = write_images(tmp.path(), &["a.jpg", "b.jpg"]);
        let db = Database::open_in_memory().unwrap();
        db.connection().unwrap().execute_batch("DROP TABLE bins;").unwrap();

        let cache = Arc::new(ArtifactCache::new());
        let pipeline = BuildPipeline::new(
            CacheResolver::new(cache.clone(), db.clone()),
            Arc::new(ThumbnailService::default()),
            2,
        );
        let report = pipeline.build(&paths, |_, _| {}).unwrap();

        assert_eq!(report.rendered, 2);
        assert_eq!(report.persisted, 0);
        assert_eq!(db.artifact_count().unwrap(), 0);
        assert!(cache.get(&paths[0]).is_some());
        assert!(cache.get(&paths[1]).is_some());
    }

    #[test]
    fn test_rejected_rows_are_not_persisted() {
        let tmp = TempDir::new().unwrap();
        let paths = write_images(tmp.path(), &["a.jpg", "b.jpg", "c.jpg"]);
        let db = Database::open_in_memory().unwrap();
        let rejected = paths[1].to_string_lossy().replace('\'', "''");
        db.connection()
            .unwrap()
            .execute_batch(&format!(
                "CREATE TRIGGER reject_b BEFORE INSERT ON artifacts WHEN NEW.path = '{}' \
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                rejected
            ))
            .unwrap();

        let pipeline = BuildPipeline::new(
            CacheResolver::new(Arc::new(ArtifactCache::new()), db.clone()),
            Arc::new(ThumbnailService::default()),
            3,
        );
        let report = pipeline.build(&paths, |_, _| {}).unwrap();

        assert_eq!(report.rendered, 3);
        assert_eq!(report.persisted, 2);
        assert_eq!(db.artifact_count().unwrap(), 2);
        assert!(db.get_thumbnail(&paths[1]).is_none());
    }

    #[test]
    fn test_poisoned_accumulator_keeps_results() {
        let accumulator = Arc::new(BuildAccumulator::new());
        let holder = accumulator.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.items.lock().unwrap();
            panic!("worker died holding the lock");
        })
        .join();

        accumulator.insert(
            PathBuf::from("/d/a.jpg"),
            Arc::new(Artifact::new(
                DynamicImage::new_rgb8(4, 4),
                DynamicImage::new_rgb8(8, 8),
            )),
        );
        assert_eq!(accumulator.len(), 1);

        let accumulator = Arc::try_unwrap(accumulator).unwrap();
        assert_eq!(accumulator.into_inner().len(), 1);
    }
}
