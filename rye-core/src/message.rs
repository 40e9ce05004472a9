//! Conversation message types threads accumulate into `turn_history`
//! (spec §3) and the [`ContextStrategy`] seam `rye-context` implements
//! against. Mirrors `neuron_turn::types`/`neuron_turn::context`, lifted
//! here so both `rye-context` and `rye-runtime` can depend on the same
//! vocabulary without a cycle between them.

use serde::{Deserialize, Serialize};

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions).
    System,
    /// User message.
    User,
    /// Assistant (model) message.
    Assistant,
}

/// Source for image content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Base64-encoded image data.
    Base64 {
        /// The base64-encoded data.
        data: String,
    },
    /// URL pointing to an image.
    Url {
        /// The image URL.
        url: String,
    },
}

/// A single content part within a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// A tool call the model emitted.
    ToolUse {
        /// Unique identifier for this tool use, echoed by the matching
        /// `ToolResult`.
        id: String,
        /// Dispatch name, e.g. `rye_execute`.
        name: String,
        /// Tool input parameters.
        input: serde_json::Value,
    },
    /// Result of dispatching a `ToolUse`.
    ToolResult {
        /// The `ToolUse::id` this result corresponds to.
        tool_use_id: String,
        /// The rendered result content.
        content: String,
        /// Whether the tool execution produced a `status: "error"` envelope.
        is_error: bool,
    },
    /// Image content.
    Image {
        /// The image source.
        source: ImageSource,
        /// MIME type of the image.
        media_type: String,
    },
}

/// One entry in a thread's `turn_history` (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The message author's role.
    pub role: Role,
    /// Content parts of the message.
    pub content: Vec<ContentPart>,
}

impl Message {
    /// Build a single-part text message.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }
}

/// Strategy for keeping a thread's message list within a token budget.
///
/// Implementations: a passthrough no-op, and `rye-context`'s sliding
/// window (drop oldest, keep the first message and recent tail).
pub trait ContextStrategy: Send + Sync {
    /// Estimate token count for a message list.
    fn token_estimate(&self, messages: &[Message]) -> usize;

    /// Whether compaction should run given the current messages and limit.
    fn should_compact(&self, messages: &[Message], limit: usize) -> bool;

    /// Compact the message list. Returns a shorter (or unchanged) list.
    fn compact(&self, messages: Vec<Message>) -> Vec<Message>;
}

/// A no-op context strategy that never compacts; relies on the provider
/// or on the directive's token limit never being reached.
pub struct NoCompaction;

impl ContextStrategy for NoCompaction {
    fn token_estimate(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .flat_map(|m| &m.content)
            .map(|part| match part {
                ContentPart::Text { text } => text.len() / 4,
                ContentPart::ToolUse { input, .. } => input.to_string().len() / 4,
                ContentPart::ToolResult { content, .. } => content.len() / 4,
                ContentPart::Image { .. } => 1000,
            })
            .sum()
    }

    fn should_compact(&self, _messages: &[Message], _limit: usize) -> bool {
        false
    }

    fn compact(&self, messages: Vec<Message>) -> Vec<Message> {
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_compaction_never_compacts() {
        let strategy = NoCompaction;
        let messages = vec![Message::text(Role::User, "hello")];
        assert!(!strategy.should_compact(&messages, 100));
        assert_eq!(strategy.compact(messages.clone()).len(), messages.len());
    }

    #[test]
    fn no_compaction_estimates_tokens() {
        let strategy = NoCompaction;
        let messages = vec![Message::text(Role::User, "a".repeat(400))];
        assert_eq!(strategy.token_estimate(&messages), 100);
    }
}
