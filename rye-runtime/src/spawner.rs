//! The decoupling seam for spawning sub-threads (spec §4.H step 4.c).
//!
//! `rye-orchestrator` owns the thread registry and depth/spawn-count
//! enforcement (spec §4.I); `rye-runtime` only needs to ask "run this
//! directive as my child and give me back the outcome". Modeling that
//! as a trait injected into [`crate::engine::ThreadRuntime`] avoids a
//! circular crate dependency between the two, the same way the
//! teacher's `ReactOperator` takes `Arc<dyn layer0::StateReader>`
//! rather than depending on a concrete storage crate.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use rye_core::{RyeError, ThreadId};
use rye_permissions::CapabilitySet;

/// A request to run a directive as a child of the calling thread.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    /// Directive id to invoke.
    pub directive_id: String,
    /// Inputs to pass to the child directive.
    pub inputs: Value,
    /// Calling thread's id, for parent/child bookkeeping.
    pub parent_thread_id: ThreadId,
    /// Calling thread's effective capabilities, the ceiling the child's
    /// own declared capabilities are attenuated against.
    pub parent_capabilities: CapabilitySet,
    /// Calling thread's depth; the child's depth is this plus one.
    pub depth: u32,
}

/// What a completed (or escalated) child thread reports back.
#[derive(Debug, Clone)]
pub struct SpawnOutcome {
    /// The child thread's id.
    pub thread_id: ThreadId,
    /// Terminal status name (`"completed"`, `"escalated"`, `"failed"`, ...).
    pub status: String,
    /// Total spend the child (and its own descendants) accrued.
    pub cost: Decimal,
    /// Total tokens the child (and its own descendants) accrued.
    pub tokens: u64,
    /// The child's declared outputs, if it completed normally.
    pub outputs: Value,
}

/// Spawns and awaits a child thread for a directive-type `rye_execute`
/// dispatch. `rye-orchestrator` is the sole production implementation;
/// tests and standalone single-thread use wire in [`NoSpawner`].
#[async_trait]
pub trait DirectiveSpawner: Send + Sync {
    /// Run `request.directive_id` as a child thread and block until it
    /// reaches a terminal status (spec §4.H step 4.c: "synchronous by
    /// default").
    async fn spawn_and_await(&self, request: SpawnRequest) -> Result<SpawnOutcome, RyeError>;
}

/// A spawner that refuses every request. Used where directive-type
/// dispatch is out of scope: standalone tool-only threads, and tests
/// that never exercise spawning.
pub struct NoSpawner;

#[async_trait]
impl DirectiveSpawner for NoSpawner {
    async fn spawn_and_await(&self, request: SpawnRequest) -> Result<SpawnOutcome, RyeError> {
        Err(RyeError::Resolution(format!(
            "no spawner configured; cannot run directive `{}` as a child thread",
            request.directive_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_spawner_always_errors() {
        let spawner = NoSpawner;
        let err = spawner
            .spawn_and_await(SpawnRequest {
                directive_id: "demo/child".to_string(),
                inputs: Value::Null,
                parent_thread_id: ThreadId::new("t-1"),
                parent_capabilities: CapabilitySet::empty(),
                depth: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RyeError::Resolution(_)));
    }
}
