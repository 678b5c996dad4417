//! Artifact cache and resolver
//!
//! The in-process cache lives for one loaded dataset and is cleared
//! explicitly when another dataset loads. It only holds artifacts built in
//! this session; anything already in the store is served from there. The
//! resolver layers the two so repeated loads skip all source decode work.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::db::Database;
use crate::models::artifact::Artifact;

/// In-process artifact map guarded by its own lock
#[derive(Debug, Default)]
pub struct ArtifactCache {
    entries: RwLock<HashMap<PathBuf, Arc<Artifact>>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    // a panicked writer leaves whole entries behind, never torn ones
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, Arc<Artifact>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, Arc<Artifact>>> {
        self.entries.write().unwrap_or_else(|e| {
            tracing::warn!("Artifact cache lock was poisoned, recovering");
            e.into_inner()
        })
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Artifact>> {
        self.read().get(path).cloned()
    }

    pub fn insert(&self, path: PathBuf, artifact: Arc<Artifact>) {
        self.write().insert(path, artifact);
    }

    pub fn extend<I>(&self, items: I)
    where
        I: IntoIterator<Item = (PathBuf, Arc<Artifact>)>,
    {
        self.write().extend(items);
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Looks up an artifact before any decode work is done
///
/// Only a complete pair counts as found: a stored thumbnail without a
/// decodable preview (or the reverse) resolves as a miss so the pair is
/// rebuilt together.
#[derive(Clone)]
pub struct CacheResolver {
    cache: Arc<ArtifactCache>,
    db: Database,
}

impl CacheResolver {
    pub fn new(cache: Arc<ArtifactCache>, db: Database) -> Self {
        Self { cache, db }
    }

    pub fn resolve(&self, path: &Path) -> Option<Arc<Artifact>> {
        if let Some(artifact) = self.cache.get(path) {
            tracing::debug!("Memory cache hit: {}", path.display());
            return Some(artifact);
        }

        let thumbnail = self.db.get_thumbnail(path)?;
        let Some(preview) = self.db.get_preview(path) else {
            tracing::debug!("Incomplete stored artifact, rebuilding: {}", path.display());
            return None;
        };

        tracing::debug!("Store cache hit: {}", path.display());
        Some(Arc::new(Artifact::new(thumbnail, preview)))
    }

    pub fn cache(&self) -> &Arc<ArtifactCache> {
        &self.cache
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
