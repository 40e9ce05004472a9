//! # rye-orchestrator — component I: Orchestrator
//!
//! Owns thread identity, the parent/child registry, depth and
//! spawn-count enforcement, and the cancellation and handoff/resume
//! lifecycle above `rye-runtime`'s single-thread loop. Also implements
//! `rye-runtime::DirectiveSpawner`, closing the loop so an
//! `execute`-on-directive dispatch inside one thread spawns and awaits
//! a child thread through this same registry.
//!
//! Grounded on the teacher's `neuron-orch-local::LocalOrch`: a
//! `HashMap`-backed registry with `tokio::spawn` for concurrent
//! dispatch, generalized from a flat agent registry to a depth-tracked
//! thread tree with cancellation and suspend/resume.
//!
//! Wiring an [`Orchestrator`] and its [`RegistrySpawner`] together
//! requires [`std::sync::Arc::new_cyclic`], since each needs a handle to
//! the other:
//!
//! ```ignore
//! let orchestrator = Arc::new_cyclic(|weak| {
//!     let spawner = Arc::new(RegistrySpawner::from_weak(weak.clone()));
//!     let deps = RuntimeDeps { spawner, /* ... */ };
//!     let runtime = Arc::new(ThreadRuntime::new(provider, deps));
//!     Orchestrator::new(runtime, config, chain_resolver, max_depth, max_spawns)
//! });
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod registry;
pub mod spawner;

pub use error::OrchestratorError;
pub use registry::{AggregateSummary, Orchestrator, SpawnMode, StatusSnapshot};
pub use spawner::RegistrySpawner;
