//! Per-resolver cache: `id -> (path, space, content_hash)`, invalidated
//! solely by content-hash mismatch (spec §4.B — "no time-based expiry").

use std::collections::HashMap;
use std::path::PathBuf;

use rye_core::Space;
use tokio::sync::RwLock;

use crate::item_type::ItemType;

#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub path: PathBuf,
    pub space: Space,
    pub content_hash: String,
}

type CacheKey = (ItemType, String);

/// Content-hash-invalidated resolution cache.
#[derive(Default)]
pub struct ResolverCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResolverCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn get(&self, item_type: ItemType, id: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .await
            .get(&(item_type, id.to_string()))
            .cloned()
    }

    pub(crate) async fn insert(&self, item_type: ItemType, id: &str, entry: CacheEntry) {
        self.entries
            .write()
            .await
            .insert((item_type, id.to_string()), entry);
    }

    pub(crate) async fn evict(&self, item_type: ItemType, id: &str) {
        self.entries.write().await.remove(&(item_type, id.to_string()));
    }

    /// Number of cached entries — exposed for tests and diagnostics.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
