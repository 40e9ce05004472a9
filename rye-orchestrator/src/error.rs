//! Errors an orchestrator operation can return.
//!
//! Distinct from [`rye_core::RyeError`]: that taxonomy governs what
//! happens *inside* a thread's loop (spec §7); this one governs
//! operations performed *on* the registry from outside it.

use rye_core::ThreadId;
use thiserror::Error;

/// Failure from an [`crate::Orchestrator`] operation.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No thread is registered under this id.
    #[error("no thread registered with id `{0}`")]
    ThreadNotFound(ThreadId),

    /// A spawn would exceed the configured max depth (spec §4.I).
    #[error("spawn would exceed max depth {max}")]
    DepthExceeded {
        /// The configured ceiling.
        max: u32,
    },

    /// A spawn would exceed the parent thread's configured max spawn
    /// count (spec §4.I).
    #[error("spawn would exceed parent's max spawn count {max}")]
    SpawnCountExceeded {
        /// The configured ceiling.
        max: u32,
    },

    /// The requested operation doesn't apply to the thread's current
    /// status, e.g. resuming a thread that is still running.
    #[error("{0}")]
    InvalidTransition(String),

    /// The underlying chain resolver failed servicing `get_chain`.
    #[error(transparent)]
    Chain(#[from] rye_chain::ChainError),

    /// Filesystem I/O failed reading a persisted transcript.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The thread runtime returned an error before the loop could even
    /// start (directive load, permission parsing).
    #[error(transparent)]
    Runtime(#[from] rye_core::RyeError),
}
