//! # rye-provider — the LLM backend boundary
//!
//! Defines the `Provider` trait `rye-runtime`'s thread loop is generic
//! over, the request/response wire types that cross it, and a
//! deterministic mock for testing. No concrete HTTP provider ships
//! here — wiring one up is the embedding application's job, same as
//! `neuron-turn::provider` leaves Anthropic/OpenAI/Ollama to sibling
//! crates this workspace doesn't need.

#![deny(missing_docs)]

pub mod mock;
pub mod provider;
pub mod types;

pub use mock::MockProvider;
pub use provider::{Provider, ProviderError};
pub use types::{ProviderRequest, ProviderResponse, StopReason, TokenUsage, ToolSchema};
