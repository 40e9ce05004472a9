//! Three-tier resolution (spec §4.B): `[project, user, system*]` in
//! precedence order, fixed per-type extension search order, first
//! existing file wins.

use std::path::{Path, PathBuf};

use rye_core::{RuntimeConfig, Space};
use sha2::{Digest, Sha256};

use crate::cache::{CacheEntry, ResolverCache};
use crate::error::ResolverError;
use crate::item_type::ItemType;

/// Resolves item ids to filesystem paths across the three spaces, with a
/// content-hash-invalidated cache layered on top.
pub struct Resolver {
    config: RuntimeConfig,
    cache: ResolverCache,
}

impl Resolver {
    /// Build a resolver over the given runtime configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            cache: ResolverCache::new(),
        }
    }

    /// Resolve `id` of `item_type`, consulting the cache first.
    pub async fn resolve(
        &self,
        item_type: ItemType,
        id: &str,
    ) -> Result<(PathBuf, Space), ResolverError> {
        if let Some(entry) = self.cache.get(item_type, id).await {
            match current_hash(&entry.path).await {
                Some(hash) if hash == entry.content_hash => {
                    tracing::debug!(id, ?item_type, "resolver cache hit");
                    return Ok((entry.path, entry.space));
                }
                _ => {
                    tracing::debug!(id, ?item_type, "resolver cache stale, evicting");
                    self.cache.evict(item_type, id).await;
                }
            }
        }

        let (path, space) = self.resolve_uncached(item_type, id).await?;
        let hash = current_hash(&path)
            .await
            .ok_or_else(|| ResolverError::NotFound(id.to_string()))?;
        self.cache
            .insert(
                item_type,
                id,
                CacheEntry {
                    path: path.clone(),
                    space: space.clone(),
                    content_hash: hash,
                },
            )
            .await;
        Ok((path, space))
    }

    async fn resolve_uncached(
        &self,
        item_type: ItemType,
        id: &str,
    ) -> Result<(PathBuf, Space), ResolverError> {
        if let Some(path) = first_existing(&self.config.project_ai_dir(), item_type, id).await {
            return Ok((path, Space::Project));
        }
        if let Some(path) = first_existing(&self.config.user_ai_dir(), item_type, id).await {
            return Ok((path, Space::User));
        }
        for bundle in &self.config.system_spaces {
            if !bundle.covers(id) {
                continue;
            }
            if let Some(path) = first_existing(&bundle.root.join(".ai"), item_type, id).await {
                return Ok((path, bundle.space()));
            }
        }
        Err(ResolverError::NotFound(id.to_string()))
    }

    /// Expose the cache for diagnostics/tests.
    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }
}

async fn first_existing(ai_dir: &Path, item_type: ItemType, id: &str) -> Option<PathBuf> {
    let base = ai_dir.join(item_type.dir_name());
    for ext in item_type.extensions() {
        let candidate = base.join(format!("{id}.{ext}"));
        if tokio::fs::metadata(&candidate).await.is_ok() {
            return Some(candidate);
        }
    }
    None
}

async fn current_hash(path: &Path) -> Option<String> {
    let bytes = tokio::fs::read(path).await.ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Some(hex::encode(hasher.finalize()))
}
