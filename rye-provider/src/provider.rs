//! The `Provider` trait boundary (spec §4.H step 4.a, §7 `ProviderError`).
//!
//! Uses RPITIT and is intentionally NOT object-safe, mirroring
//! `neuron_turn::provider::Provider` — `rye-runtime`'s thread loop is
//! generic over `P: Provider`; its own object-safe boundary (the
//! orchestrator's `ThreadHandle`) is a separate concern one layer up.
//! No concrete HTTP provider ships here; wiring a real provider is left
//! to the embedding application.

use std::future::Future;

use thiserror::Error;

use crate::types::{ProviderRequest, ProviderResponse};

/// Errors from an LLM provider call (spec §7 `ProviderError`).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP/transport request itself failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication or authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// The provider's response could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Catch-all for errors that don't fit the taxonomy above.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether a retry with backoff (spec §5) might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::RequestFailed(_))
    }
}

/// An LLM backend. Each concrete provider (Anthropic, OpenAI, a local
/// model server) implements this trait once; `rye-runtime`'s thread
/// loop is generic over it.
pub trait Provider: Send + Sync {
    /// Run one completion turn.
    fn complete(&self, request: ProviderRequest) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::RequestFailed("timeout".into()).is_retryable());
        assert!(!ProviderError::AuthFailed("bad key".into()).is_retryable());
        assert!(!ProviderError::InvalidResponse("bad json".into()).is_retryable());
    }
}
