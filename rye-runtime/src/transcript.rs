//! Transcript rendering and signed persistence (spec §4.H step 5, §3
//! `transcript_path`).

use std::path::PathBuf;
use std::sync::Arc;

use rye_core::{ContentPart, RuntimeConfig, RyeError};
use rye_integrity::KeyStore;

use crate::thread::Thread;

/// Render a thread's turn history as a markdown transcript.
pub fn render(thread: &Thread) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Thread {}\n\n", thread.thread_id));
    out.push_str(&format!("- directive: {}\n", thread.directive_id));
    out.push_str(&format!("- status: {:?}\n", thread.status));
    out.push_str(&format!("- turns: {}\n", thread.turn_count));
    out.push_str(&format!("- cost_total: {}\n\n", thread.cost_total));

    for turn in &thread.turn_history {
        out.push_str(&format!("## {:?}\n\n", turn.message.role));
        for part in &turn.message.content {
            match part {
                ContentPart::Text { text } => out.push_str(&format!("{text}\n\n")),
                ContentPart::ToolUse { name, input, .. } => {
                    out.push_str(&format!("tool_use: `{name}` {input}\n\n"));
                }
                ContentPart::ToolResult { content, is_error, .. } => {
                    out.push_str(&format!("tool_result (error={is_error}): {content}\n\n"));
                }
                ContentPart::Image { .. } => out.push_str("[image omitted]\n\n"),
            }
        }
    }
    out
}

/// Render, sign, and write a thread's transcript to its
/// `transcript_path` as a knowledge item. The category directory is
/// created if absent.
pub async fn persist(
    thread: &Thread,
    config: &RuntimeConfig,
    key_store: &Arc<dyn KeyStore>,
    signing_fingerprint: &str,
) -> Result<PathBuf, RyeError> {
    let body = render(thread);
    let frontmatter = format!(
        "---\nid: {}\ntitle: \"Transcript for {}\"\ncategory: rye/agent/threads\nversion: 1.0.0\nauthor: {}\ncreated_at: \"{}\"\n---\n\n",
        thread.transcript_path,
        thread.directive_id,
        signing_fingerprint,
        chrono::Utc::now().to_rfc3339(),
    );
    let content = format!("{frontmatter}{body}");

    let sig_line = rye_integrity::sign(&content, "<!--", signing_fingerprint, key_store, chrono::Utc::now())
        .await
        .map_err(|e| RyeError::Integrity(e.to_string()))?;
    let signed = format!("{content}{sig_line}\n");

    let path = config.project_ai_dir().join(&thread.transcript_path);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RyeError::Other(Box::new(e)))?;
    }
    tokio::fs::write(&path, signed).await.map_err(|e| RyeError::Other(Box::new(e)))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rye_core::{Message, Role, ThreadId};
    use rye_permissions::CapabilitySet;

    #[test]
    fn render_includes_header_fields_and_messages() {
        let mut thread = Thread::new(
            ThreadId::new("t-1"),
            None,
            0,
            "demo/directive",
            serde_json::Value::Null,
            "fast",
            CapabilitySet::empty(),
            "demo/t-1.md",
        );
        thread.record_turn(Message::text(Role::User, "hello"), 0, Decimal::ZERO);
        let rendered = render(&thread);
        assert!(rendered.contains("demo/directive"));
        assert!(rendered.contains("hello"));
    }
}
