use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use crate::observability::metrics::{CACHE_ENTRIES, CACHE_PUBLISHES};
use crate::types::RankedResult;

/// Last published ranking. The initial snapshot has no timestamp.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CacheSnapshot {
    pub result: RankedResult,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.fetched_at.is_none()
    }
}

/// Single-writer, multi-reader cell for the latest ranking.
///
/// Snapshots are immutable once published; `set` swaps the whole `Arc` in one
/// step, so a reader holds either the previous snapshot or the new one.
pub struct SharedRateCache {
    tx: watch::Sender<Arc<CacheSnapshot>>,
}

impl SharedRateCache {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(CacheSnapshot::default()));
        SharedRateCache { tx }
    }

    pub fn get(&self) -> Arc<CacheSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn set(&self, result: RankedResult) -> Arc<CacheSnapshot> {
        let snapshot = Arc::new(CacheSnapshot {
            result,
            fetched_at: Some(Utc::now()),
        });

        CACHE_ENTRIES.set(snapshot.result.len() as i64);
        self.tx.send_replace(Arc::clone(&snapshot));
        CACHE_PUBLISHES.inc();

        tracing::debug!("Cache published: {} entries", snapshot.result.len());
        snapshot
    }

    /// Receiver that wakes on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CacheSnapshot>> {
        self.tx.subscribe()
    }
}

impl Default for SharedRateCache {
    fn default() -> Self {
        Self::new()
    }
}
