//! The `Thread` runtime entity (spec §3).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rye_core::{ContentPart, DurationMs, Message, Role, ThreadId};
use rye_permissions::CapabilitySet;

/// A thread's terminal or in-flight status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    /// The loop is still running.
    Running,
    /// Ended normally: `directive_return` or text-only with required
    /// outputs present.
    Completed,
    /// An unrecoverable error ended the loop.
    Failed,
    /// A budget limit was reached (spec §4.G).
    Escalated,
    /// Cancelled by the orchestrator.
    Cancelled,
    /// Killed by the orchestrator (forceful, no transcript finalization
    /// guarantee beyond what was already persisted).
    Killed,
    /// Suspended via `handoff_thread`, awaiting `resume_thread`.
    AwaitingHandoff,
}

impl ThreadStatus {
    /// Whether this status is terminal (the loop will not continue
    /// without an explicit `resume_thread`).
    pub fn is_terminal(self) -> bool {
        !matches!(self, ThreadStatus::Running)
    }
}

/// One entry in a thread's turn history: a message plus its
/// accounting, recorded in emission order (spec §3 `turn_history`).
#[derive(Debug, Clone)]
pub struct TurnRecord {
    /// The message itself.
    pub message: Message,
    /// Prompt + completion tokens attributed to this turn, 0 for
    /// tool-result turns.
    pub token_count: u64,
    /// Spend attributed to this turn.
    pub cost: Decimal,
}

/// A running or completed thread (spec §3).
#[derive(Debug, Clone)]
pub struct Thread {
    /// Unique id, derived from directive id + a monotonic counter.
    pub thread_id: ThreadId,
    /// Parent thread id, `None` for a root thread.
    pub parent_thread_id: Option<ThreadId>,
    /// Spawn depth; 0 for root.
    pub depth: u32,
    /// The directive this thread is executing.
    pub directive_id: String,
    /// Caller-supplied inputs.
    pub inputs: Value,
    /// The model tier/id actually resolved for this thread.
    pub resolved_model: String,
    /// Effective (already attenuated) capability set.
    pub capabilities: CapabilitySet,
    /// Current status.
    pub status: ThreadStatus,
    /// Conversation turns so far, in emission order.
    pub turn_history: Vec<TurnRecord>,
    /// Total spend, own plus cascaded children.
    pub cost_total: Decimal,
    /// Wall-clock elapsed since thread start.
    pub elapsed: DurationMs,
    /// LLM turns completed.
    pub turn_count: u32,
    /// Direct child threads spawned so far.
    pub spawn_count: u32,
    /// Where the signed transcript knowledge entry will be written.
    pub transcript_path: String,
    /// The message a `handoff_thread` call injected, pending the next
    /// `resume_thread` (spec §4.I).
    pub pending_handoff_message: Option<String>,
}

impl Thread {
    /// Start a new thread in `Running` status with empty history.
    pub fn new(
        thread_id: ThreadId,
        parent_thread_id: Option<ThreadId>,
        depth: u32,
        directive_id: impl Into<String>,
        inputs: Value,
        resolved_model: impl Into<String>,
        capabilities: CapabilitySet,
        transcript_path: impl Into<String>,
    ) -> Self {
        Self {
            thread_id,
            parent_thread_id,
            depth,
            directive_id: directive_id.into(),
            inputs,
            resolved_model: resolved_model.into(),
            capabilities,
            status: ThreadStatus::Running,
            turn_history: Vec::new(),
            cost_total: Decimal::ZERO,
            elapsed: DurationMs::ZERO,
            turn_count: 0,
            spawn_count: 0,
            transcript_path: transcript_path.into(),
            pending_handoff_message: None,
        }
    }

    /// Append one message to the turn history.
    pub fn record_turn(&mut self, message: Message, token_count: u64, cost: Decimal) {
        self.turn_history.push(TurnRecord { message, token_count, cost });
    }

    /// The message list as sent to and received from the provider, in
    /// order, with no accounting metadata.
    pub fn messages(&self) -> Vec<Message> {
        self.turn_history.iter().map(|t| t.message.clone()).collect()
    }

    /// Replace the turn history with a compacted message list (spec
    /// §4.H: context management between turns). Already-debited budget
    /// accounting lives in the ledger, not here, so the replaced
    /// records carry zeroed token/cost figures.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.turn_history = messages
            .into_iter()
            .map(|message| TurnRecord { message, token_count: 0, cost: Decimal::ZERO })
            .collect();
    }

    /// Concatenated text of every text part across the whole history,
    /// last message last. Used as a thread's final `result_text`.
    pub fn last_assistant_text(&self) -> String {
        for turn in self.turn_history.iter().rev() {
            if turn.message.role == Role::Assistant {
                let text: String = turn
                    .message
                    .content
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                if !text.is_empty() {
                    return text;
                }
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_exclude_only_running() {
        assert!(!ThreadStatus::Running.is_terminal());
        assert!(ThreadStatus::Completed.is_terminal());
        assert!(ThreadStatus::Escalated.is_terminal());
        assert!(ThreadStatus::AwaitingHandoff.is_terminal());
    }

    #[test]
    fn last_assistant_text_skips_tool_result_turns() {
        let mut thread = Thread::new(
            ThreadId::new("t-1"),
            None,
            0,
            "demo/directive",
            Value::Null,
            "fast",
            CapabilitySet::empty(),
            ".ai/knowledge/agent/threads/demo/t-1.md",
        );
        thread.record_turn(Message::text(Role::User, "hello"), 0, Decimal::ZERO);
        thread.record_turn(Message::text(Role::Assistant, "working on it"), 10, Decimal::ZERO);
        thread.record_turn(
            Message {
                role: Role::User,
                content: vec![ContentPart::ToolResult {
                    tool_use_id: "tu-1".to_string(),
                    content: "{}".to_string(),
                    is_error: false,
                }],
            },
            0,
            Decimal::ZERO,
        );
        assert_eq!(thread.last_assistant_text(), "working on it");
    }
}
