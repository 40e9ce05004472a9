//! The thread loop (spec §4.H, "the hardest part"). Grounded directly
//! on the teacher's `neuron-op-react::ReactOperator::execute`: a
//! send-receive-dispatch loop with hook points, limit checks after
//! every turn, and context compaction before repeating — generalized
//! from a single operator's tool registry to Rye's capability-checked,
//! chain-resolved dispatch surface.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use rye_chain::ChainResolver;
use rye_core::{ContentPart, ContextStrategy, Message, Role, RuntimeConfig, RyeError, ThreadId};
use rye_exec::{ExecutionRequest, PrimitiveExecutor};
use rye_integrity::{KeyStore, TrustStore};
use rye_items::Limits;
use rye_permissions::{attenuate, parse_permissions, CapabilitySet, PermissionChecker};
use rye_provider::{Provider, ProviderRequest};
use rye_resolver::Resolver;

use crate::cancel::{CancelToken, HandoffToken};
use crate::dispatch::{self, ParsedCall};
use crate::first_message;
use crate::hooks::{self, HookEnv};
use crate::spawner::{DirectiveSpawner, SpawnRequest};
use crate::system_prompt::{self, SystemPromptVars};
use crate::thread::{Thread, ThreadStatus};
use crate::transcript;
use rye_items::Directive;

/// Static collaborators a [`ThreadRuntime`] needs beyond the provider
/// itself, grouped so constructing one doesn't require a ten-argument
/// function.
pub struct RuntimeDeps {
    /// Space/resolution configuration.
    pub runtime_config: RuntimeConfig,
    /// Shared item resolver (component B).
    pub resolver: Arc<Resolver>,
    /// Shared trust store (component A).
    pub trust_store: Arc<TrustStore>,
    /// Shared chain resolver (component D).
    pub chain_resolver: Arc<ChainResolver>,
    /// Key store used to sign transcripts and `rye_sign` dispatches.
    pub key_store: Arc<dyn KeyStore>,
    /// Fingerprint of the key this runtime signs with.
    pub signing_fingerprint: String,
    /// Sub-thread spawner (component I, behind the decoupling seam).
    pub spawner: Arc<dyn DirectiveSpawner>,
    /// Conversation compaction strategy.
    pub context_strategy: Arc<dyn ContextStrategy>,
}

/// A thread's declared parent, for attenuation and cost cascade.
#[derive(Debug, Clone)]
pub struct ParentContext {
    /// Parent thread id.
    pub thread_id: ThreadId,
    /// Parent's spawn depth.
    pub depth: u32,
    /// Parent's effective capabilities (the attenuation ceiling).
    pub capabilities: CapabilitySet,
}

/// Invoker-supplied overrides to a directive's declared limits.
#[derive(Debug, Clone, Default)]
pub struct LimitOverrides {
    /// Override for `limits.turns`.
    pub turns: Option<u32>,
    /// Override for `limits.tokens`.
    pub tokens: Option<u64>,
    /// Override for `limits.spend`.
    pub spend: Option<Decimal>,
    /// Override for `limits.duration_seconds`.
    pub duration_seconds: Option<u64>,
}

/// A request to open and run a thread to a terminal status.
pub struct ThreadRequest {
    /// The pre-allocated thread id (component I's job to allocate).
    pub thread_id: ThreadId,
    /// Directive to execute.
    pub directive_id: String,
    /// Caller-supplied inputs.
    pub inputs: Value,
    /// Parent thread context, `None` for a root thread.
    pub parent: Option<ParentContext>,
    /// Invoker overrides to the directive's declared limits.
    pub limit_overrides: Option<LimitOverrides>,
    /// Override for the directive's declared model tier.
    pub model_override: Option<String>,
}

/// What a terminal thread reports back to its caller.
#[derive(Debug, Clone)]
pub struct ThreadResult {
    /// This thread's id.
    pub thread_id: ThreadId,
    /// Terminal status.
    pub status: ThreadStatus,
    /// Total spend, own plus cascaded children.
    pub cost_total: Decimal,
    /// Total tokens, own plus cascaded children.
    pub tokens_total: u64,
    /// LLM turns completed.
    pub turn_count: u32,
    /// The last assistant text, if any.
    pub result_text: String,
    /// Declared outputs, from `directive_return` if the model called
    /// it, otherwise empty.
    pub outputs: Value,
    /// Where the signed transcript was written.
    pub transcript_path: PathBuf,
    /// What to cascade to the parent's ledger once this thread is
    /// terminal.
    pub cost_delta: rye_budget::CostDelta,
    /// The thread's final in-memory state, for an orchestrator to cache
    /// and later hand back to [`ThreadRuntime::resume_thread`] without
    /// re-parsing the persisted transcript.
    pub thread: Thread,
}

fn resolve_limits(declared: &Limits, overrides: Option<&LimitOverrides>) -> rye_budget::ResolvedLimits {
    let overrides = overrides.cloned().unwrap_or_default();
    rye_budget::ResolvedLimits {
        turns: overrides.turns.or(declared.turns),
        tokens: overrides.tokens.or(declared.tokens),
        spend: overrides.spend.or(declared.spend),
        duration: overrides
            .duration_seconds
            .or(declared.duration_seconds)
            .map(std::time::Duration::from_secs),
    }
}

fn capabilities_summary(caps: &CapabilitySet) -> String {
    match caps {
        CapabilitySet::All => "ALL".to_string(),
        CapabilitySet::Some(set) if set.is_empty() => "(none)".to_string(),
        CapabilitySet::Some(set) => {
            let mut list: Vec<&str> = set.iter().map(String::as_str).collect();
            list.sort_unstable();
            list.join(", ")
        }
    }
}

/// Runs directives as managed threads (spec §4.H).
pub struct ThreadRuntime<P: Provider> {
    provider: P,
    deps: RuntimeDeps,
}

impl<P: Provider> ThreadRuntime<P> {
    /// Build a runtime over a provider and its collaborators.
    pub fn new(provider: P, deps: RuntimeDeps) -> Self {
        Self { provider, deps }
    }

    /// Run `request` to a terminal status.
    pub async fn run_thread(&self, request: ThreadRequest, cancel: CancelToken, handoff: HandoffToken) -> Result<ThreadResult, RyeError> {
        let start = Instant::now();

        let directive = rye_items::load_directive(&request.directive_id, &self.deps.resolver, &self.deps.trust_store, false)
            .await
            .map_err(|e| RyeError::Resolution(e.to_string()))?;

        let own_caps = parse_permissions(directive.permissions_xml.as_deref());
        let (capabilities, depth, parent_thread_id) = match &request.parent {
            Some(parent) => (attenuate(Some(&own_caps), &parent.capabilities), parent.depth + 1, Some(parent.thread_id.clone())),
            None => (own_caps, 0, None),
        };
        let checker = PermissionChecker::new(capabilities.clone());

        let resolved_limits = resolve_limits(&directive.metadata.limits, request.limit_overrides.as_ref());
        let ledger = tokio::sync::Mutex::new(rye_budget::BudgetLedger::new(resolved_limits.clone()));

        let model = request.model_override.clone().unwrap_or_else(|| directive.metadata.model.tier.clone());
        let transcript_rel = format!("knowledge/agent/threads/{}/{}.md", directive.metadata.category, request.thread_id);

        let mut thread = Thread::new(
            request.thread_id.clone(),
            parent_thread_id.clone(),
            depth,
            request.directive_id.clone(),
            request.inputs.clone(),
            model.clone(),
            capabilities.clone(),
            transcript_rel,
        );

        let vars = SystemPromptVars {
            project_path: self.deps.runtime_config.project_root.display().to_string(),
            model: model.clone(),
            depth,
            parent_thread_id: parent_thread_id.as_ref().map(|id| id.to_string()),
            spend_limit: resolved_limits.spend.map(|s| s.to_string()),
            max_turns: resolved_limits.turns,
            capabilities_summary: capabilities_summary(&capabilities),
        };
        let system_prompt = system_prompt::build(&directive, &self.deps.resolver, &self.deps.trust_store, &vars).await?;
        let opening = first_message::build(&directive, &request.inputs, &self.deps.resolver, &self.deps.trust_store).await?;
        thread.record_turn(opening, 0, Decimal::ZERO);

        let outputs = self
            .run_loop(&directive, &checker, &capabilities, depth, &model, &resolved_limits, &system_prompt, &ledger, &mut thread, start, &cancel, &handoff)
            .await;

        thread.elapsed = start.elapsed().into();
        let transcript_path = transcript::persist(&thread, &self.deps.runtime_config, &self.deps.key_store, &self.deps.signing_fingerprint).await?;
        let ledger = ledger.into_inner();

        Ok(ThreadResult {
            thread_id: thread.thread_id.clone(),
            status: thread.status,
            cost_total: ledger.total_spend(),
            tokens_total: ledger.total_tokens(),
            turn_count: thread.turn_count,
            result_text: thread.last_assistant_text(),
            outputs,
            transcript_path,
            cost_delta: ledger.as_cost_delta(),
            thread: thread.clone(),
        })
    }

    /// Re-enter the loop for a thread an orchestrator rehydrated from a
    /// terminal or awaiting-handoff state (spec §4.I `resume_thread`).
    /// The ledger restarts fresh for the continuation: only the
    /// transcript, not per-turn budget accounting, survives a
    /// suspension.
    pub async fn resume_thread(
        &self,
        directive_id: &str,
        mut thread: Thread,
        injected_message: Message,
        limit_overrides: Option<LimitOverrides>,
        cancel: CancelToken,
        handoff: HandoffToken,
    ) -> Result<ThreadResult, RyeError> {
        let start = Instant::now();

        let directive = rye_items::load_directive(directive_id, &self.deps.resolver, &self.deps.trust_store, false)
            .await
            .map_err(|e| RyeError::Resolution(e.to_string()))?;
        let checker = PermissionChecker::new(thread.capabilities.clone());
        let resolved_limits = resolve_limits(&directive.metadata.limits, limit_overrides.as_ref());
        let ledger = tokio::sync::Mutex::new(rye_budget::BudgetLedger::new(resolved_limits.clone()));

        let vars = SystemPromptVars {
            project_path: self.deps.runtime_config.project_root.display().to_string(),
            model: thread.resolved_model.clone(),
            depth: thread.depth,
            parent_thread_id: thread.parent_thread_id.as_ref().map(|id| id.to_string()),
            spend_limit: resolved_limits.spend.map(|s| s.to_string()),
            max_turns: resolved_limits.turns,
            capabilities_summary: capabilities_summary(&thread.capabilities),
        };
        let system_prompt = system_prompt::build(&directive, &self.deps.resolver, &self.deps.trust_store, &vars).await?;

        thread.status = ThreadStatus::Running;
        thread.pending_handoff_message = None;
        thread.record_turn(injected_message, 0, Decimal::ZERO);

        let model = thread.resolved_model.clone();
        let capabilities = thread.capabilities.clone();
        let depth = thread.depth;
        let outputs = self
            .run_loop(&directive, &checker, &capabilities, depth, &model, &resolved_limits, &system_prompt, &ledger, &mut thread, start, &cancel, &handoff)
            .await;

        thread.elapsed = start.elapsed().into();
        let transcript_path = transcript::persist(&thread, &self.deps.runtime_config, &self.deps.key_store, &self.deps.signing_fingerprint).await?;
        let ledger = ledger.into_inner();

        Ok(ThreadResult {
            thread_id: thread.thread_id.clone(),
            status: thread.status,
            cost_total: ledger.total_spend(),
            tokens_total: ledger.total_tokens(),
            turn_count: thread.turn_count,
            result_text: thread.last_assistant_text(),
            outputs,
            transcript_path,
            cost_delta: ledger.as_cost_delta(),
            thread: thread.clone(),
        })
    }

    fn missing_required_outputs(directive: &Directive, outputs: &Value) -> Vec<String> {
        directive
            .metadata
            .outputs
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| outputs.get(&spec.name).map(Value::is_null).unwrap_or(true))
            .map(|spec| spec.name.clone())
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_loop(
        &self,
        directive: &Directive,
        checker: &PermissionChecker,
        capabilities: &CapabilitySet,
        depth: u32,
        model: &str,
        resolved_limits: &rye_budget::ResolvedLimits,
        system_prompt: &str,
        ledger: &tokio::sync::Mutex<rye_budget::BudgetLedger>,
        thread: &mut Thread,
        start: Instant,
        cancel: &CancelToken,
        handoff: &HandoffToken,
    ) -> Value {
        let tools = dispatch::builtin_tool_schemas();
        let mut pending_hook_actions: Vec<String> = Vec::new();
        let mut outputs = Value::Null;

        loop {
            if let Some(message) = handoff.requested() {
                thread.status = ThreadStatus::AwaitingHandoff;
                thread.pending_handoff_message = Some(message);
                break;
            }
            if cancel.is_cancelled() {
                thread.status = ThreadStatus::Cancelled;
                break;
            }

            for (i, action) in std::mem::take(&mut pending_hook_actions).into_iter().enumerate() {
                let (_, content, is_error) = self
                    .dispatch_one(checker, "rye_execute", &format!("hook:{i}"), &json!({"item_type": "tool", "item_id": action}), &thread.thread_id, capabilities, depth, ledger)
                    .await;
                thread.record_turn(
                    Message { role: Role::User, content: vec![ContentPart::ToolResult { tool_use_id: format!("hook:{i}"), content: content.to_string(), is_error }] },
                    0,
                    Decimal::ZERO,
                );
            }

            let provider_request = ProviderRequest {
                model: Some(model.to_string()),
                messages: thread.messages(),
                tools: tools.clone(),
                max_tokens: None,
                temperature: None,
                system: Some(system_prompt.to_string()),
                extra: Value::Null,
            };

            let response = match self.call_with_retry(&provider_request).await {
                Ok(response) => response,
                Err(e) => {
                    thread.status = ThreadStatus::Failed;
                    tracing::error!(thread_id = %thread.thread_id, error = %e, "provider call failed, ending thread");
                    break;
                }
            };

            let (turns_used, total_spend, own_spend, escalation) = {
                let mut g = ledger.lock().await;
                g.debit_turn(model, response.usage.input_tokens, response.usage.output_tokens);
                (g.turns_used(), g.total_spend(), g.own_spend(), g.check_escalation())
            };
            thread.turn_count = turns_used;
            thread.cost_total = total_spend;
            thread.elapsed = start.elapsed().into();
            thread.record_turn(
                Message { role: Role::Assistant, content: response.content.clone() },
                response.usage.input_tokens + response.usage.output_tokens,
                own_spend,
            );

            if let Some(reason) = escalation {
                thread.status = ThreadStatus::Escalated;
                let g = ledger.lock().await;
                self.queue_matching_hooks(&directive.metadata.hooks, &g, resolved_limits.spend, thread.turn_count, Some(reason.to_string()), "escalation", &mut pending_hook_actions);
                break;
            }

            let tool_uses: Vec<(String, String, Value)> = response
                .content
                .iter()
                .filter_map(|part| match part {
                    ContentPart::ToolUse { id, name, input } => Some((id.clone(), name.clone(), input.clone())),
                    _ => None,
                })
                .collect();

            if tool_uses.is_empty() {
                let missing = Self::missing_required_outputs(directive, &outputs);
                if missing.is_empty() {
                    thread.status = ThreadStatus::Completed;
                    break;
                }
                thread.record_turn(
                    Message {
                        role: Role::User,
                        content: vec![ContentPart::Text {
                            text: format!(
                                "Required output(s) not yet provided: {}. Call `directive_return` with all required outputs before finishing.",
                                missing.join(", ")
                            ),
                        }],
                    },
                    0,
                    Decimal::ZERO,
                );
                continue;
            }

            if let Some((_, _, input)) = tool_uses.iter().find(|(_, name, _)| name == "directive_return") {
                outputs = input.get("outputs").cloned().unwrap_or(Value::Null);
            }

            let thread_id = thread.thread_id.clone();
            let dispatches = tool_uses.iter().map(|(id, name, input)| {
                let thread_id = &thread_id;
                async move {
                    if name == "directive_return" {
                        (id.clone(), json!({"status": "acknowledged"}), false)
                    } else {
                        self.dispatch_one(checker, name, id, input, thread_id, capabilities, depth, ledger).await
                    }
                }
            });
            let results = join_all(dispatches).await;

            let result_parts = results
                .into_iter()
                .map(|(tool_use_id, content, is_error)| ContentPart::ToolResult { tool_use_id, content: content.to_string(), is_error })
                .collect();
            thread.record_turn(Message { role: Role::User, content: result_parts }, 0, Decimal::ZERO);

            let g = ledger.lock().await;
            self.queue_matching_hooks(&directive.metadata.hooks, &g, resolved_limits.spend, thread.turn_count, None, "tool_dispatch", &mut pending_hook_actions);
            drop(g);

            if outputs != Value::Null {
                let missing = Self::missing_required_outputs(directive, &outputs);
                if missing.is_empty() {
                    thread.status = ThreadStatus::Completed;
                    break;
                }
                outputs = Value::Null;
                thread.record_turn(
                    Message {
                        role: Role::User,
                        content: vec![ContentPart::Text {
                            text: format!(
                                "`directive_return` is missing required output(s): {}. Call it again with all required outputs.",
                                missing.join(", ")
                            ),
                        }],
                    },
                    0,
                    Decimal::ZERO,
                );
            }

            let messages = thread.messages();
            let token_limit = resolved_limits.tokens.unwrap_or(u64::MAX) as usize;
            if self.deps.context_strategy.should_compact(&messages, token_limit) {
                let before = messages.len();
                let compacted = self.deps.context_strategy.compact(messages);
                tracing::debug!(thread_id = %thread.thread_id, before, after = compacted.len(), "compacted context");
                thread.set_messages(compacted);
            }
        }

        outputs
    }

    async fn call_with_retry(&self, request: &ProviderRequest) -> Result<rye_provider::ProviderResponse, RyeError> {
        const MAX_ATTEMPTS: u32 = 3;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.provider.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    let backoff = std::time::Duration::from_millis(200 * 2u64.pow(attempt - 1));
                    tracing::warn!(attempt, error = %e, "retryable provider error, backing off");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(RyeError::Provider(e.to_string())),
            }
        }
    }

    fn queue_matching_hooks(
        &self,
        hooks: &[rye_items::HookDecl],
        ledger: &rye_budget::BudgetLedger,
        spend_limit: Option<Decimal>,
        loop_count: u32,
        error_type: Option<String>,
        event: &str,
        out: &mut Vec<String>,
    ) {
        let env = HookEnv {
            cost_current: ledger.total_spend().to_string().parse().unwrap_or(0.0),
            cost_limit: spend_limit.map(|s| s.to_string().parse().unwrap_or(0.0)),
            loop_count,
            error_type,
            thread_event: event.to_string(),
        };
        for hook in hooks {
            if hooks::evaluate(&hook.when, &env) {
                out.push(hook.execute.clone());
            }
        }
    }

    /// Translate and dispatch one tool call, returning `(tool_use_id,
    /// result_content, is_error)`.
    #[allow(clippy::too_many_arguments)]
    async fn dispatch_one(
        &self,
        checker: &PermissionChecker,
        name: &str,
        tool_use_id: &str,
        input: &Value,
        thread_id: &ThreadId,
        capabilities: &CapabilitySet,
        depth: u32,
        ledger: &tokio::sync::Mutex<rye_budget::BudgetLedger>,
    ) -> (String, Value, bool) {
        let Some(call) = dispatch::parse_tool_call(name, input) else {
            return (tool_use_id.to_string(), json!({"error": format!("unknown tool `{name}`")}), true);
        };

        if let Err(e) = checker.check(call.primary, &call.item_type, &call.item_id) {
            let err = RyeError::PermissionDenied(e.to_string());
            return (tool_use_id.to_string(), err.to_tool_envelope(), true);
        }

        match self.execute_call(&call, thread_id, capabilities, depth, ledger).await {
            Ok(value) => (tool_use_id.to_string(), value, false),
            Err(e) => (tool_use_id.to_string(), e.to_tool_envelope(), true),
        }
    }

    async fn execute_call(
        &self,
        call: &ParsedCall,
        thread_id: &ThreadId,
        capabilities: &CapabilitySet,
        depth: u32,
        ledger: &tokio::sync::Mutex<rye_budget::BudgetLedger>,
    ) -> Result<Value, RyeError> {
        match (call.primary, call.item_type.as_str()) {
            ("execute", "tool") => {
                let chain = self
                    .deps
                    .chain_resolver
                    .resolve_chain(&call.item_id)
                    .await
                    .map_err(|e| RyeError::Chain(e.to_string()))?;
                let request = ExecutionRequest {
                    params: call.params.clone(),
                    project_path: self.deps.runtime_config.project_root.clone(),
                    base_env: std::env::vars().collect(),
                    user_space: self.deps.runtime_config.user_space.display().to_string(),
                    system_space: self
                        .deps
                        .runtime_config
                        .system_spaces
                        .first()
                        .map(|s| s.root.display().to_string())
                        .unwrap_or_default(),
                };
                let envelope = PrimitiveExecutor::new(&self.deps.trust_store)
                    .execute(&chain, request)
                    .await
                    .map_err(|e| RyeError::Subprocess(e.to_string()))?;
                serde_json::to_value(&envelope).map_err(|e| RyeError::Other(Box::new(e)))
            }
            ("execute", "directive") => {
                let outcome = self
                    .deps
                    .spawner
                    .spawn_and_await(SpawnRequest {
                        directive_id: call.item_id.clone(),
                        inputs: call.params.clone(),
                        parent_thread_id: thread_id.clone(),
                        parent_capabilities: capabilities.clone(),
                        depth,
                    })
                    .await?;
                ledger.lock().await.apply_child_delta(rye_budget::CostDelta {
                    spend_delta: outcome.cost,
                    tokens_delta: outcome.tokens,
                });
                Ok(json!({
                    "thread_id": outcome.thread_id.to_string(),
                    "status": outcome.status,
                    "cost": outcome.cost.to_string(),
                    "tokens": outcome.tokens,
                    "outputs": outcome.outputs,
                }))
            }
            ("execute", "knowledge") | ("load", "knowledge") => {
                let knowledge = rye_items::load_knowledge(&call.item_id, &self.deps.resolver, &self.deps.trust_store, false)
                    .await
                    .map_err(|e| RyeError::Resolution(e.to_string()))?;
                Ok(json!({"id": knowledge.frontmatter.id, "title": knowledge.frontmatter.title, "body": knowledge.body}))
            }
            ("load", "tool") => {
                let tool = rye_items::load_tool(&call.item_id, &self.deps.resolver, &self.deps.trust_store, false)
                    .await
                    .map_err(|e| RyeError::Resolution(e.to_string()))?;
                serde_json::to_value(&tool).map_err(|e| RyeError::Other(Box::new(e)))
            }
            ("load", "directive") => {
                let directive = rye_items::load_directive(&call.item_id, &self.deps.resolver, &self.deps.trust_store, false)
                    .await
                    .map_err(|e| RyeError::Resolution(e.to_string()))?;
                serde_json::to_value(&directive.metadata).map_err(|e| RyeError::Other(Box::new(e)))
            }
            ("search", _) => {
                let ids = dispatch::search_items(&self.deps.runtime_config, &call.item_type, &call.item_id).await;
                Ok(json!({"matches": ids}))
            }
            ("sign", _) => {
                let content = call
                    .params
                    .get("content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RyeError::Validation("rye_sign requires `params.content`".to_string()))?;
                let marker = call.params.get("comment_marker").and_then(Value::as_str).unwrap_or("#");
                let sig_line = rye_integrity::sign(content, marker, &self.deps.signing_fingerprint, &self.deps.key_store, chrono::Utc::now())
                    .await
                    .map_err(|e| RyeError::Integrity(e.to_string()))?;
                Ok(json!({"signed": format!("{content}{sig_line}\n")}))
            }
            (primary, item_type) => Err(RyeError::Validation(format!("unsupported dispatch: {primary} on {item_type}"))),
        }
    }
}
