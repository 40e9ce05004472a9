//! Wire types exchanged with an LLM provider during a thread's turn
//! loop (spec §4.H step 4.a-b). Mirrors `neuron_turn::types`' provider
//! surface, built on `rye_core::Message` instead of redefining its own
//! conversation vocabulary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rye_core::Message;

/// JSON Schema description of a tool offered to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Dispatch name, e.g. `rye_execute`.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema for the tool's input.
    pub input_schema: serde_json::Value,
}

/// A request for one LLM turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Model identifier or tier (provider-specific resolution).
    pub model: Option<String>,
    /// Full conversation so far.
    pub messages: Vec<Message>,
    /// Tool schemas the model may call this turn.
    pub tools: Vec<ToolSchema>,
    /// Maximum output tokens.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// System prompt (spec §4.H step 2).
    pub system: Option<String>,
    /// Provider-specific passthrough config.
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Model produced a final response.
    EndTurn,
    /// Model wants to use one or more tools.
    ToolUse,
    /// Hit the max_tokens limit.
    MaxTokens,
    /// Content was filtered by provider-side safety.
    ContentFilter,
}

/// Token usage from a single provider call, consumed by the budget
/// ledger (spec §4.G).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input (prompt) tokens consumed.
    pub input_tokens: u64,
    /// Output (completion) tokens generated.
    pub output_tokens: u64,
}

/// A provider's response for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Response content parts (text and/or tool calls).
    pub content: Vec<rye_core::ContentPart>,
    /// Why the provider stopped.
    pub stop_reason: StopReason,
    /// Token usage for this turn.
    pub usage: TokenUsage,
    /// Model actually used (may differ from the request on fallback).
    pub model: String,
    /// Provider-computed cost, if the provider reports it; otherwise
    /// the budget ledger computes it from the static rate table.
    pub cost: Option<Decimal>,
}
