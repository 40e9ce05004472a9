//! System prompt assembly (spec §4.H step 2): a fixed bundle of context
//! knowledge items plus whatever the directive declares at
//! `position="system"`, followed by an injected variable block.

use rye_integrity::TrustStore;
use rye_items::{ContextPosition, Directive};
use rye_resolver::Resolver;

use rye_core::RyeError;

/// The fixed knowledge ids every thread's system prompt opens with,
/// in order, regardless of what the directive declares.
pub const FIXED_CONTEXT_IDS: &[&str] = &[
    "rye/identity",
    "rye/behavior",
    "rye/tool-protocol",
    "rye/environment",
    "rye/completion",
];

/// Variables injected at the end of the system prompt (spec §4.H step
/// 2).
pub struct SystemPromptVars {
    /// Absolute project root path.
    pub project_path: String,
    /// Resolved model tier/id.
    pub model: String,
    /// Spawn depth.
    pub depth: u32,
    /// Parent thread id, if any.
    pub parent_thread_id: Option<String>,
    /// Spend limit, rendered if present.
    pub spend_limit: Option<String>,
    /// Max turns, rendered if present.
    pub max_turns: Option<u32>,
    /// Human-readable summary of the effective capability set.
    pub capabilities_summary: String,
}

async fn load_knowledge_body(id: &str, resolver: &Resolver, trust_store: &TrustStore) -> Result<String, RyeError> {
    match rye_items::load_knowledge(id, resolver, trust_store, false).await {
        Ok(knowledge) => Ok(knowledge.body),
        Err(e) => {
            tracing::warn!(id, error = %e, "system prompt context item failed to load, skipping");
            Ok(String::new())
        }
    }
}

/// Build the full system prompt for a thread.
pub async fn build(
    directive: &Directive,
    resolver: &Resolver,
    trust_store: &TrustStore,
    vars: &SystemPromptVars,
) -> Result<String, RyeError> {
    let mut sections = Vec::new();

    for id in FIXED_CONTEXT_IDS {
        let body = load_knowledge_body(id, resolver, trust_store).await?;
        if !body.is_empty() {
            sections.push(body);
        }
    }

    for item in &directive.metadata.context {
        if item.position != ContextPosition::System {
            continue;
        }
        let body = load_knowledge_body(&item.id, resolver, trust_store).await?;
        if !body.is_empty() {
            sections.push(body);
        }
    }

    let mut variable_block = String::new();
    variable_block.push_str("## Runtime context\n\n");
    variable_block.push_str(&format!("- project_path: {}\n", vars.project_path));
    variable_block.push_str(&format!("- model: {}\n", vars.model));
    variable_block.push_str(&format!("- depth: {}\n", vars.depth));
    if let Some(parent) = &vars.parent_thread_id {
        variable_block.push_str(&format!("- parent_thread_id: {parent}\n"));
    }
    if let Some(spend_limit) = &vars.spend_limit {
        variable_block.push_str(&format!("- spend_limit: {spend_limit}\n"));
    }
    if let Some(max_turns) = vars.max_turns {
        variable_block.push_str(&format!("- max_turns: {max_turns}\n"));
    }
    variable_block.push_str(&format!("- capabilities: {}\n", vars.capabilities_summary));
    sections.push(variable_block);

    Ok(sections.join("\n\n"))
}
