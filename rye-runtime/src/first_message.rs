//! First user message assembly (spec §4.H step 3): render the
//! directive's process body into instructions, attach
//! `position="before"`/`"after"` context items, and append inputs.

use rye_integrity::TrustStore;
use rye_items::{ContextPosition, Directive, StepAction};
use rye_resolver::Resolver;
use serde_json::Value;

use rye_core::{ContentPart, Message, Role, RyeError};

/// Render one process step into the prose instruction the model sees.
/// `<execute>`/`<search>`/`<load>` steps become explicit directions to
/// call the matching dispatch tool; `<render>`/`<instruction>` steps
/// pass their body through unchanged.
fn render_step(action: &StepAction) -> String {
    match action {
        StepAction::Instruction { body } => body.clone(),
        StepAction::Render { body } => body.clone(),
        StepAction::Execute { tool, attrs } => {
            format!("Call rye_execute on tool `{tool}` with {}.", render_attrs(attrs))
        }
        StepAction::Search { attrs } => {
            format!("Call rye_search with {}.", render_attrs(attrs))
        }
        StepAction::Load { item, attrs } => {
            format!("Call rye_load on item `{item}` with {}.", render_attrs(attrs))
        }
    }
}

fn render_attrs(attrs: &[(String, String)]) -> String {
    if attrs.is_empty() {
        return "no additional parameters".to_string();
    }
    attrs.iter().map(|(k, v)| format!("{k}=\"{v}\"")).collect::<Vec<_>>().join(", ")
}

async fn load_knowledge_body(id: &str, resolver: &Resolver, trust_store: &TrustStore) -> String {
    match rye_items::load_knowledge(id, resolver, trust_store, false).await {
        Ok(knowledge) => knowledge.body,
        Err(e) => {
            tracing::warn!(id, error = %e, "first-message context item failed to load, skipping");
            String::new()
        }
    }
}

/// Build the first user message for a thread.
pub async fn build(
    directive: &Directive,
    inputs: &Value,
    resolver: &Resolver,
    trust_store: &TrustStore,
) -> Result<Message, RyeError> {
    let mut parts = Vec::new();

    for item in &directive.metadata.context {
        if item.position != ContextPosition::Before {
            continue;
        }
        let body = load_knowledge_body(&item.id, resolver, trust_store).await;
        if !body.is_empty() {
            parts.push(body);
        }
    }

    let body: Vec<String> = directive.process.steps.iter().map(|step| render_step(&step.action)).collect();
    if !body.is_empty() {
        parts.push(body.join("\n\n"));
    }

    if !inputs.is_null() {
        parts.push(format!("Inputs:\n```json\n{}\n```", serde_json::to_string_pretty(inputs).unwrap_or_default()));
    }

    for item in &directive.metadata.context {
        if item.position != ContextPosition::After {
            continue;
        }
        let body = load_knowledge_body(&item.id, resolver, trust_store).await;
        if !body.is_empty() {
            parts.push(body);
        }
    }

    Ok(Message {
        role: Role::User,
        content: vec![ContentPart::Text { text: parts.join("\n\n") }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rye_items::process::ProcessStep;

    #[test]
    fn execute_step_renders_as_tool_instruction() {
        let action = StepAction::Execute {
            tool: "rye/file-system/write".to_string(),
            attrs: vec![("path".to_string(), "out/a.txt".to_string())],
        };
        let rendered = render_step(&action);
        assert!(rendered.contains("rye/file-system/write"));
        assert!(rendered.contains("path=\"out/a.txt\""));
    }

    #[test]
    fn instruction_step_passes_through_unchanged() {
        let action = StepAction::Instruction { body: "write the file".to_string() };
        assert_eq!(render_step(&action), "write the file");
        let _ = ProcessStep { action };
    }
}
