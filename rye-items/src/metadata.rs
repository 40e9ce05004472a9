//! Shared metadata shapes for directives (spec §3). Field-name
//! normalization (`turns|max_turns`, etc.) is expressed with serde
//! aliases rather than a hand-rolled remapping pass.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `model` descriptor: a free-form tier plus optional overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Free-form tier string (e.g. `"fast"`, `"reasoning"`).
    pub tier: String,
    /// Specific model id override, if any.
    #[serde(default)]
    pub id: Option<String>,
    /// Provider override, if any.
    #[serde(default)]
    pub provider: Option<String>,
    /// Alternative tier/id to fall back to on provider failure.
    #[serde(default)]
    pub fallback: Option<String>,
}

/// Per-thread limits, accepting either short or `max_`-prefixed keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum LLM turns.
    #[serde(default, alias = "max_turns")]
    pub turns: Option<u32>,
    /// Maximum total tokens (prompt + completion, summed across turns).
    #[serde(default, alias = "max_tokens")]
    pub tokens: Option<u64>,
    /// Maximum total spend in USD.
    #[serde(default, alias = "max_spend")]
    pub spend: Option<Decimal>,
    /// Maximum wall-clock duration.
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    /// Maximum spawn depth for descendant threads.
    #[serde(default)]
    pub max_depth: Option<u32>,
    /// Maximum number of direct child spawns.
    #[serde(default)]
    pub max_spawns: Option<u32>,
}

/// Where a context knowledge item is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextPosition {
    /// Injected into the system prompt.
    System,
    /// Prepended to the first user message.
    Before,
    /// Appended to the first user message.
    After,
}

/// One `<context position="...">knowledge-id</context>` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    /// Knowledge item id to inject.
    pub id: String,
    /// Injection position.
    pub position: ContextPosition,
}

/// One `<hooks>` entry: a `when` expression and queued action name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDecl {
    /// Expression evaluated against `{cost.current, cost.limit,
    /// loop_count, error.type, thread.event}`.
    pub when: String,
    /// The `<execute>` action to queue when `when` matches.
    pub execute: String,
}

/// One declared directive input or output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoSpec {
    /// Parameter name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// For outputs: enforced before a thread transitions to `Completed`
    /// — a thread missing one is re-prompted to supply it instead.
    #[serde(default)]
    pub required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_accept_either_key_form() {
        let short: Limits = serde_yaml::from_str("turns: 5\ntokens: 1000\nspend: \"1.50\"").unwrap();
        let long: Limits =
            serde_yaml::from_str("max_turns: 5\nmax_tokens: 1000\nmax_spend: \"1.50\"").unwrap();
        assert_eq!(short, long);
        assert_eq!(short.turns, Some(5));
        assert_eq!(short.spend, Some(Decimal::new(150, 2)));
    }
}
