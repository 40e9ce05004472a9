//! Wires components B through J into a running [`Orchestrator`] — the way
//! application code is expected to assemble Rye OS rather than reaching
//! for any one component crate directly.
//!
//! Grounded on `neuron/src/lib.rs`'s umbrella-crate role, generalized from
//! feature-gated re-exports alone to an actual constructor: unlike
//! `neuron`'s pluggable operator/orchestrator choices, Rye OS's components
//! only compose one way.

use std::sync::{Arc, Weak};

use rye_chain::ChainResolver;
use rye_context::SlidingWindow;
use rye_core::RuntimeConfig;
use rye_integrity::{KeyStore, TrustStore};
use rye_orchestrator::{Orchestrator, OrchestratorError, RegistrySpawner, SpawnMode};
use rye_provider::Provider;
use rye_resolver::Resolver;
use rye_runtime::{RuntimeDeps, ThreadResult, ThreadRuntime};
use serde_json::Value;

/// Depth/spawn-count ceilings an [`Orchestrator`] enforces on every spawn
/// (spec §4.I). No universal default exists; pick values appropriate to
/// the deployment.
#[derive(Debug, Clone, Copy)]
pub struct SpawnLimits {
    /// Maximum thread-tree depth.
    pub max_depth: u32,
    /// Maximum children a single thread may spawn.
    pub max_spawns_per_thread: u32,
}

/// Build an [`Orchestrator`] over `provider`, wired to a fresh
/// [`Resolver`]/[`ChainResolver`]-backed [`ThreadRuntime`] whose spawner
/// dispatches child threads back through the same orchestrator.
///
/// Uses [`Arc::new_cyclic`] because the runtime's spawner needs a handle
/// back to the orchestrator that owns the runtime; see
/// [`rye_orchestrator`]'s module docs for why a two-way [`Arc`] would
/// leak the pair forever.
pub fn build<P>(
    provider: P,
    config: RuntimeConfig,
    trust_store: Arc<TrustStore>,
    key_store: Arc<dyn KeyStore>,
    signing_fingerprint: String,
    limits: SpawnLimits,
) -> Arc<Orchestrator<P>>
where
    P: Provider + Send + Sync + 'static,
{
    let resolver = Arc::new(Resolver::new(config.clone()));
    let chain_resolver = Arc::new(ChainResolver::new(resolver.clone(), trust_store.clone()));

    Arc::new_cyclic(|weak: &Weak<Orchestrator<P>>| {
        let spawner = Arc::new(RegistrySpawner::from_weak(weak.clone()));
        let deps = RuntimeDeps {
            runtime_config: config.clone(),
            resolver,
            trust_store,
            chain_resolver: chain_resolver.clone(),
            key_store,
            signing_fingerprint,
            spawner,
            context_strategy: Arc::new(SlidingWindow::new()),
        };
        let runtime = Arc::new(ThreadRuntime::new(provider, deps));
        Orchestrator::new(runtime, config, chain_resolver, limits.max_depth, limits.max_spawns_per_thread)
    })
}

/// Run `directive_id` as a root thread to completion and return its
/// result — the common single-shot entrypoint around `spawn_thread` +
/// `wait_threads` (spec §4.I).
pub async fn invoke_directive<P>(
    orchestrator: &Arc<Orchestrator<P>>,
    directive_id: impl Into<String>,
    inputs: Value,
) -> Result<ThreadResult, OrchestratorError>
where
    P: Provider + Send + Sync + 'static,
{
    let thread_id = orchestrator
        .spawn_thread(directive_id, inputs, None, None, None, SpawnMode::Sync)
        .await?;
    orchestrator
        .wait_threads(std::slice::from_ref(&thread_id))
        .await
        .into_iter()
        .next()
        .expect("wait_threads returns one result per requested id")
}
