//! Per-leaf resolved-chain cache with a per-element content-hash
//! fingerprint, invalidated the moment any element's hash changes (spec
//! §4.D). Shape mirrors `rye-resolver`'s content-hash-only cache.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::RwLock;

use crate::chain::ChainElement;

#[derive(Clone)]
pub(crate) struct CachedChain {
    pub elements: Vec<ChainElement>,
    pub fingerprints: Vec<(PathBuf, String)>,
}

/// Caches a leaf id's resolved chain alongside the content hash of every
/// element's file, so a single stale byte anywhere in the chain evicts
/// the whole entry.
#[derive(Default)]
pub struct ChainCache {
    entries: RwLock<HashMap<String, CachedChain>>,
}

impl ChainCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn get(&self, leaf_id: &str) -> Option<CachedChain> {
        self.entries.read().await.get(leaf_id).cloned()
    }

    pub(crate) async fn insert(&self, leaf_id: &str, entry: CachedChain) {
        self.entries.write().await.insert(leaf_id.to_string(), entry);
    }

    pub(crate) async fn evict(&self, leaf_id: &str) {
        self.entries.write().await.remove(leaf_id);
    }

    /// Number of cached chains, for diagnostics/tests.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
