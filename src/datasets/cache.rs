// Load-once cache for the dataset snapshot

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::loader::{load_datasets, Datasets};
use crate::errors::ServiceError;

/// Holds the current [`Datasets`] snapshot for the lifetime of the process.
///
/// The first [`get`](DatasetCache::get) reads the files; later calls share the
/// same `Arc`. [`reload`](DatasetCache::reload) swaps in a fresh snapshot and
/// [`invalidate`](DatasetCache::invalidate) drops it so the next read reloads.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    data_dir: PathBuf,
    snapshot: Arc<RwLock<Option<Arc<Datasets>>>>,
}

impl DatasetCache {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Cache pre-filled with an already loaded snapshot.
    pub fn with_snapshot(datasets: Datasets) -> Self {
        Self {
            data_dir: datasets.source.clone(),
            snapshot: Arc::new(RwLock::new(Some(Arc::new(datasets)))),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    pub async fn get(&self) -> Result<Arc<Datasets>, ServiceError> {
        if let Some(datasets) = self.snapshot.read().await.as_ref() {
            debug!("dataset cache hit");
            return Ok(Arc::clone(datasets));
        }

        let mut guard = self.snapshot.write().await;
        // Another task may have loaded while we waited for the write lock.
        if let Some(datasets) = guard.as_ref() {
            return Ok(Arc::clone(datasets));
        }

        let datasets = Arc::new(self.load().await?);
        *guard = Some(Arc::clone(&datasets));
        Ok(datasets)
    }

    pub async fn reload(&self) -> Result<Arc<Datasets>, ServiceError> {
        info!(data_dir = %self.data_dir.display(), "reloading dashboard datasets");
        let datasets = Arc::new(self.load().await?);
        *self.snapshot.write().await = Some(Arc::clone(&datasets));
        Ok(datasets)
    }

    pub async fn invalidate(&self) {
        info!("dataset cache invalidated");
        *self.snapshot.write().await = None;
    }

    async fn load(&self) -> Result<Datasets, ServiceError> {
        let dir = self.data_dir.clone();
        tokio::task::spawn_blocking(move || load_datasets(&dir))
            .await
            .map_err(|e| ServiceError::InternalError(format!("dataset load task failed: {}", e)))
    }
}
