//! A sliding-window compaction strategy: when a thread's message list
//! exceeds its token budget, drop the oldest messages, keeping the first
//! (the initial user message, usually load-bearing context) and the
//! most recent tail.

use rye_core::{ContentPart, ContextStrategy, Message};

/// Sliding window context strategy.
pub struct SlidingWindow {
    chars_per_token: usize,
}

impl SlidingWindow {
    /// Create a sliding window using the default 4-chars-per-token
    /// estimation ratio.
    pub fn new() -> Self {
        Self { chars_per_token: 4 }
    }

    /// Create with a custom chars-per-token ratio.
    pub fn with_ratio(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    fn estimate_message_tokens(&self, msg: &Message) -> usize {
        msg.content
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => text.len() / self.chars_per_token,
                ContentPart::ToolUse { input, .. } => input.to_string().len() / self.chars_per_token,
                ContentPart::ToolResult { content, .. } => content.len() / self.chars_per_token,
                ContentPart::Image { .. } => 1000,
            })
            .sum::<usize>()
            + 4
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStrategy for SlidingWindow {
    fn token_estimate(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.estimate_message_tokens(m)).sum()
    }

    fn should_compact(&self, messages: &[Message], limit: usize) -> bool {
        self.token_estimate(messages) > limit
    }

    fn compact(&self, messages: Vec<Message>) -> Vec<Message> {
        if messages.len() <= 2 {
            return messages;
        }

        let first = messages[0].clone();
        let rest = &messages[1..];

        let total_tokens: usize = messages.iter().map(|m| self.estimate_message_tokens(m)).sum();
        let target = total_tokens / 2;

        let mut kept = Vec::new();
        let mut current_tokens = self.estimate_message_tokens(&first);

        for msg in rest.iter().rev() {
            let msg_tokens = self.estimate_message_tokens(msg);
            if current_tokens + msg_tokens > target && !kept.is_empty() {
                break;
            }
            kept.push(msg.clone());
            current_tokens += msg_tokens;
        }

        kept.reverse();
        let mut result = vec![first];
        result.extend(kept);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rye_core::Role;

    #[test]
    fn estimates_tokens() {
        let sw = SlidingWindow::new();
        let messages = vec![Message::text(Role::User, "a".repeat(400))];
        assert_eq!(sw.token_estimate(&messages), 104);
    }

    #[test]
    fn should_compact_above_limit_only() {
        let sw = SlidingWindow::new();
        let messages = vec![Message::text(Role::User, "a".repeat(400))];
        assert!(sw.should_compact(&messages, 50));
        assert!(!sw.should_compact(&messages, 200));
    }

    #[test]
    fn compact_preserves_first_and_recent() {
        let sw = SlidingWindow::new();
        let messages = vec![
            Message::text(Role::User, "first ".repeat(100)),
            Message::text(Role::Assistant, "old ".repeat(100)),
            Message::text(Role::User, "middle ".repeat(100)),
            Message::text(Role::Assistant, "recent ".repeat(100)),
            Message::text(Role::User, "latest ".repeat(100)),
        ];

        let compacted = sw.compact(messages.clone());

        assert_eq!(compacted[0].role, Role::User);
        assert_eq!(compacted[0].content, messages[0].content);
        assert!(compacted.len() < messages.len());
        assert!(compacted.len() >= 2);
        assert_eq!(compacted.last().unwrap().content, messages.last().unwrap().content);
    }

    #[test]
    fn short_message_lists_are_unchanged() {
        let sw = SlidingWindow::new();
        let messages = vec![Message::text(Role::User, "hi"), Message::text(Role::Assistant, "hello")];
        assert_eq!(sw.compact(messages.clone()).len(), messages.len());
    }

    #[test]
    fn single_message_is_unchanged() {
        let sw = SlidingWindow::new();
        let messages = vec![Message::text(Role::User, "hi")];
        assert_eq!(sw.compact(messages.clone()).len(), 1);
    }
}
