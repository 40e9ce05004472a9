//! Walks a leaf tool's `executor_id` links to the terminal primitive,
//! resolving (4.B), verifying (4.A), and loading (4.C) each element,
//! enforcing space precedence and schema compatibility along the way
//! (spec §4.D). Conceptually the same "walk a linked chain, validating
//! at each step" shape as the teacher's tool middleware chain
//! (`neuron-tool::middleware::Next`), but linear and front-loaded rather
//! than a short-circuiting `Next`-continuation pipeline — the whole
//! chain must resolve before any element executes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rye_core::Space;
use rye_integrity::TrustStore;
use rye_items::{Tool, ToolType};
use rye_resolver::{ItemType, Resolver};
use sha2::{Digest, Sha256};

use crate::cache::{CachedChain, ChainCache};
use crate::error::ChainError;
use crate::schema::check_compatible;

/// One resolved, verified element of an executor chain.
#[derive(Debug, Clone)]
pub struct ChainElement {
    /// The element's item id.
    pub id: String,
    /// Parsed tool definition.
    pub tool: Tool,
    /// Space the element resolved from.
    pub space: Space,
    /// Filesystem path it was loaded from.
    pub path: PathBuf,
}

/// Resolves and validates executor chains, with a per-leaf cache.
pub struct ChainResolver {
    resolver: Arc<Resolver>,
    trust_store: Arc<TrustStore>,
    cache: ChainCache,
}

impl ChainResolver {
    /// Build a chain resolver over a shared item resolver and trust
    /// store.
    pub fn new(resolver: Arc<Resolver>, trust_store: Arc<TrustStore>) -> Self {
        Self {
            resolver,
            trust_store,
            cache: ChainCache::new(),
        }
    }

    /// Resolve and validate the full executor chain for `leaf_id`,
    /// `[leaf, ..., primitive]`.
    pub async fn resolve_chain(&self, leaf_id: &str) -> Result<Vec<ChainElement>, ChainError> {
        if let Some(cached) = self.cache.get(leaf_id).await {
            let mut all_fresh = true;
            for (path, hash) in &cached.fingerprints {
                match current_hash(path).await {
                    Some(h) if &h == hash => continue,
                    _ => {
                        all_fresh = false;
                        break;
                    }
                }
            }
            if all_fresh {
                tracing::debug!(leaf_id, "chain cache hit");
                return Ok(cached.elements);
            }
            tracing::debug!(leaf_id, "chain cache stale, evicting");
            self.cache.evict(leaf_id).await;
        }

        let elements = self.walk(leaf_id).await?;

        let mut fingerprints = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Some(hash) = current_hash(&element.path).await {
                fingerprints.push((element.path.clone(), hash));
            }
        }
        self.cache
            .insert(
                leaf_id,
                CachedChain {
                    elements: elements.clone(),
                    fingerprints,
                },
            )
            .await;

        Ok(elements)
    }

    async fn walk(&self, leaf_id: &str) -> Result<Vec<ChainElement>, ChainError> {
        let mut visited = std::collections::HashSet::new();
        let mut chain = Vec::new();
        let mut current_id = leaf_id.to_string();

        loop {
            if !visited.insert(current_id.clone()) {
                return Err(ChainError::Cycle(current_id));
            }

            let (path, space) = self
                .resolver
                .resolve(ItemType::Tool, &current_id)
                .await
                .map_err(|e| ChainError::Other(Box::new(e)))?;
            let tool = rye_items::load_tool(&current_id, &self.resolver, &self.trust_store, false).await?;

            chain.push(ChainElement {
                id: current_id.clone(),
                tool: tool.clone(),
                space,
                path,
            });

            match (tool.tool_type, tool.executor_id.clone()) {
                (ToolType::Primitive, None) => break,
                (ToolType::Primitive, Some(_)) => {
                    return Err(ChainError::TerminalNotPrimitive(current_id));
                }
                (_, None) => {
                    return Err(ChainError::TerminalNotPrimitive(current_id));
                }
                (_, Some(next_id)) => {
                    current_id = next_id;
                }
            }
        }

        self.validate_precedence_and_schema(&chain)?;
        Ok(chain)
    }

    fn validate_precedence_and_schema(&self, chain: &[ChainElement]) -> Result<(), ChainError> {
        for pair in chain.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            if parent.space.precedence() < child.space.precedence() {
                return Err(ChainError::PrecedenceViolation {
                    parent: parent.id.clone(),
                    child: child.id.clone(),
                });
            }
            check_compatible(parent.tool.parameters.as_ref(), child.tool.parameters.as_ref()).map_err(
                |reason| ChainError::SchemaIncompatible {
                    parent: parent.id.clone(),
                    child: child.id.clone(),
                    reason,
                },
            )?;
        }
        Ok(())
    }
}

async fn current_hash(path: &Path) -> Option<String> {
    let bytes = tokio::fs::read(path).await.ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Some(hex::encode(hasher.finalize()))
}
