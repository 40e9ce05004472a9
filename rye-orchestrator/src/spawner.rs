//! Closes the decoupling seam `rye-runtime::spawner` opens: a
//! [`DirectiveSpawner`] implementation backed by this crate's registry
//! (spec §4.H step 4.c, §4.I).
//!
//! Holds a [`Weak`] reference rather than an [`Arc`] to the
//! [`Orchestrator`] it spawns against. `ThreadRuntime`'s deps hold this
//! spawner, and `Orchestrator::new` takes an `Arc<ThreadRuntime<P>>` —
//! an owning reference in both directions would leak the pair forever.
//! Build both together with `Arc::new_cyclic` (see the module docs on
//! [`Orchestrator`]) so the spawner's weak handle upgrades successfully
//! for as long as the orchestrator itself is alive.

use std::sync::Weak;

use async_trait::async_trait;

use rye_core::RyeError;
use rye_provider::Provider;
use rye_runtime::{DirectiveSpawner, ParentContext, SpawnOutcome, SpawnRequest};

use crate::registry::{Orchestrator, SpawnMode};

/// A [`DirectiveSpawner`] that runs `execute`-on-directive dispatches as
/// child threads through an [`Orchestrator`]'s registry.
pub struct RegistrySpawner<P: Provider> {
    orchestrator: Weak<Orchestrator<P>>,
}

impl<P: Provider> RegistrySpawner<P> {
    /// Build a spawner from a weak handle to the orchestrator it will
    /// dispatch child spawns through.
    pub fn from_weak(orchestrator: Weak<Orchestrator<P>>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> DirectiveSpawner for RegistrySpawner<P> {
    async fn spawn_and_await(&self, request: SpawnRequest) -> Result<SpawnOutcome, RyeError> {
        let orchestrator = self
            .orchestrator
            .upgrade()
            .ok_or_else(|| RyeError::Resolution("orchestrator no longer running, cannot spawn child thread".to_string()))?;

        let parent = ParentContext { thread_id: request.parent_thread_id.clone(), depth: request.depth, capabilities: request.parent_capabilities.clone() };

        let thread_id = orchestrator
            .spawn_thread(request.directive_id.clone(), request.inputs, Some(parent), None, None, SpawnMode::Sync)
            .await
            .map_err(|e| RyeError::Resolution(e.to_string()))?;

        let result = orchestrator
            .wait_threads(std::slice::from_ref(&thread_id))
            .await
            .into_iter()
            .next()
            .expect("wait_threads returns one result per requested id")
            .map_err(|e| RyeError::Resolution(e.to_string()))?;

        Ok(SpawnOutcome {
            thread_id: result.thread_id,
            status: format!("{:?}", result.status).to_lowercase(),
            cost: result.cost_total,
            tokens: result.tokens_total,
            outputs: result.outputs,
        })
    }
}
