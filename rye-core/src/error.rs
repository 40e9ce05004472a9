//! Cross-cutting error kinds (spec §7). Component crates define their own
//! local `thiserror` enums for internal detail and convert into one of
//! these at the boundary `rye-runtime` and `rye-orchestrator` operate at —
//! the same funnel shape `layer0::OrchError::OperatorError(#[from] ...)`
//! uses to absorb a lower-layer error into a higher one.

use serde_json::json;
use thiserror::Error;

/// The error taxonomy named in spec §7, by kind rather than by internal
/// type name.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RyeError {
    /// Signature missing, hash mismatch, or untrusted fingerprint. Always
    /// fatal for the operation; never retried.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Cycle, non-primitive terminal, space-precedence violation, or
    /// schema incompatibility in an executor chain.
    #[error("chain error: {0}")]
    Chain(String),

    /// A capability check failed. Recovered into a structured tool result
    /// the model observes, never raised to the caller.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A budget ledger check fired. Not fatal: the thread transitions to
    /// `escalated` and the caller observes it via the thread result.
    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    /// A subprocess primitive exited non-zero, timed out, or produced
    /// unparseable stdout.
    #[error("subprocess error: {0}")]
    Subprocess(String),

    /// The LLM provider failed after exhausting its retry budget.
    #[error("provider error: {0}")]
    Provider(String),

    /// An item id could not be found in any space.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// Malformed metadata or a schema violation at item load time.
    #[error("validation error: {0}")]
    Validation(String),

    /// Catch-all for errors that don't fit the taxonomy above.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl RyeError {
    /// Whether this error kind is meant to be delivered to the model as a
    /// tool result (spec §7's propagation rule) rather than unwinding the
    /// thread loop.
    pub fn is_model_visible(&self) -> bool {
        matches!(
            self,
            RyeError::PermissionDenied(_)
                | RyeError::Chain(_)
                | RyeError::Subprocess(_)
                | RyeError::Resolution(_)
        )
    }

    /// Render as the JSON envelope the thread runtime appends as a tool
    /// result when `is_model_visible()` is true.
    pub fn to_tool_envelope(&self) -> serde_json::Value {
        json!({
            "status": "error",
            "type": "tool",
            "data": { "error": self.to_string() },
        })
    }
}
