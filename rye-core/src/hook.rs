//! Cross-cutting observation/intervention interface, mirroring
//! `layer0::hook`. Not a spec component in its own right — it's the
//! ambient extension point `rye-runtime` calls at each point in the loop
//! so embedding applications can observe or short-circuit without
//! forking the runtime. The directive-authored `<hook when="...">`
//! pairs from spec §4.H are a distinct, higher-level concept built on
//! top of this and live in `rye-items`/`rye-runtime`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::duration::DurationMs;

/// Where in the thread loop a hook fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// Before the LLM is called.
    PreInference,
    /// After the LLM responds.
    PostInference,
    /// Before a tool call is dispatched.
    PreToolUse,
    /// After a tool call returns.
    PostToolUse,
    /// Before the loop decides whether to continue.
    ExitCheck,
}

/// Snapshot of thread state passed to a hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookContext {
    /// Which point fired.
    pub point: HookPoint,
    /// Tool name, if this is a tool-related point.
    pub tool_name: Option<String>,
    /// Tool input, if this is a tool-related point.
    pub tool_input: Option<serde_json::Value>,
    /// Tool result, for `PostToolUse`.
    pub tool_result: Option<serde_json::Value>,
    /// Running spend for the thread.
    pub cost: Decimal,
    /// Turns completed so far.
    pub turns_completed: u32,
    /// Wall-clock elapsed since thread start.
    pub elapsed: DurationMs,
}

/// What a hook asks the runtime to do next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HookAction {
    /// Proceed normally.
    Continue,
    /// Abort the thread loop with a reason.
    Halt {
        /// Human-readable reason.
        reason: String,
    },
    /// Skip the pending tool call.
    SkipTool {
        /// Human-readable reason.
        reason: String,
    },
    /// Replace the tool call's input before dispatch.
    ModifyToolInput {
        /// Replacement input.
        new_input: serde_json::Value,
    },
    /// Replace the tool call's result after dispatch.
    ModifyToolOutput {
        /// Replacement output.
        new_output: serde_json::Value,
    },
}

/// An observer/interceptor registered against one or more [`HookPoint`]s.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Which points this hook wants to observe.
    fn points(&self) -> &[HookPoint];

    /// React to an event at one of `points()`.
    async fn on_event(&self, ctx: &HookContext) -> HookAction;
}
