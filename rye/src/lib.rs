#![deny(missing_docs)]
//! # rye — umbrella crate
//!
//! Single import surface for Rye OS: an execution substrate that runs
//! LLM-driven directives as managed conversational threads. Re-exports
//! every component crate behind feature flags, plus an [`engine`] module
//! that wires them into a running [`rye_orchestrator::Orchestrator`] and
//! a `prelude` for the happy path.

#[cfg(feature = "core")]
pub mod engine;

#[cfg(feature = "core")]
pub use rye_budget;
#[cfg(feature = "bundler")]
pub use rye_bundler;
#[cfg(feature = "core")]
pub use rye_chain;
#[cfg(feature = "core")]
pub use rye_context;
#[cfg(feature = "core")]
pub use rye_core;
#[cfg(feature = "core")]
pub use rye_exec;
#[cfg(feature = "core")]
pub use rye_integrity;
#[cfg(feature = "core")]
pub use rye_items;
#[cfg(feature = "core")]
pub use rye_orchestrator;
#[cfg(feature = "core")]
pub use rye_permissions;
#[cfg(feature = "core")]
pub use rye_provider;
#[cfg(feature = "core")]
pub use rye_resolver;
#[cfg(feature = "core")]
pub use rye_runtime;

/// Happy-path imports for composing and running Rye OS directives.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use rye_core::{RuntimeConfig, RyeError, SystemSpace, ThreadId};

    #[cfg(feature = "core")]
    pub use rye_integrity::{KeyStore, LocalKeyStore, TrustStore, TrustedIdentity};

    #[cfg(feature = "core")]
    pub use rye_items::Directive;

    #[cfg(feature = "core")]
    pub use rye_orchestrator::{Orchestrator, OrchestratorError, StatusSnapshot};

    #[cfg(feature = "core")]
    pub use rye_provider::{MockProvider, Provider, ProviderError};

    #[cfg(feature = "core")]
    pub use rye_runtime::{Thread, ThreadResult, ThreadStatus};

    #[cfg(feature = "core")]
    pub use crate::engine::{build, invoke_directive, SpawnLimits};

    #[cfg(feature = "bundler")]
    pub use rye_bundler::{Manifest, VerifyReport};
}
