//! Tool schemas offered to the provider, and translation of an emitted
//! tool call into `(primary, item_type, item_id, params)` (spec §4.H
//! step 4.a-c). Only the dispatch names the loop's algorithm names
//! explicitly are implemented; directive process authors describe
//! `thread_directive`/`orchestrator`-style actions in prose instead
//! (see [`crate::system_prompt`]).

use rye_core::RuntimeConfig;
use rye_provider::ToolSchema;
use serde_json::{json, Value};

/// A tool call translated into Rye's dispatch vocabulary.
#[derive(Debug, Clone)]
pub struct ParsedCall {
    /// One of `execute`, `search`, `load`, `sign`.
    pub primary: &'static str,
    /// One of `tool`, `directive`, `knowledge`.
    pub item_type: String,
    /// The target item id.
    pub item_id: String,
    /// Caller-supplied parameters, passed through to the primitive or
    /// spawn request.
    pub params: Value,
}

/// The builtin tool schemas offered every turn (spec §4.H step 4.a).
pub fn builtin_tool_schemas() -> Vec<ToolSchema> {
    let dispatch_schema = json!({
        "type": "object",
        "properties": {
            "item_type": {"type": "string", "enum": ["tool", "directive", "knowledge"]},
            "item_id": {"type": "string"},
            "params": {"type": "object"},
        },
        "required": ["item_type", "item_id"],
    });
    vec![
        ToolSchema {
            name: "rye_execute".to_string(),
            description: "Run a tool, or spawn a sub-thread for a directive.".to_string(),
            input_schema: dispatch_schema.clone(),
        },
        ToolSchema {
            name: "rye_search".to_string(),
            description: "Search for items by id substring within an item type.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "item_type": {"type": "string", "enum": ["tool", "directive", "knowledge"]},
                    "query": {"type": "string"},
                },
                "required": ["item_type", "query"],
            }),
        },
        ToolSchema {
            name: "rye_load".to_string(),
            description: "Load a specific item's content by id.".to_string(),
            input_schema: dispatch_schema.clone(),
        },
        ToolSchema {
            name: "rye_sign".to_string(),
            description: "Sign authored content with this thread's key.".to_string(),
            input_schema: dispatch_schema,
        },
        ToolSchema {
            name: "directive_return".to_string(),
            description: "End the thread and return the given outputs.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"outputs": {"type": "object"}},
            }),
        },
    ]
}

/// Translate a tool call name and input into Rye's `(primary,
/// item_type, item_id, params)` vocabulary. Returns `None` for
/// `directive_return` and any name this runtime doesn't dispatch.
pub fn parse_tool_call(name: &str, input: &Value) -> Option<ParsedCall> {
    let primary = match name {
        "rye_execute" => "execute",
        "rye_search" => "search",
        "rye_load" => "load",
        "rye_sign" => "sign",
        _ => return None,
    };
    let item_type = input.get("item_type").and_then(Value::as_str)?.to_string();
    let item_id = input
        .get("item_id")
        .or_else(|| input.get("query"))
        .and_then(Value::as_str)?
        .to_string();
    let params = input.get("params").cloned().unwrap_or(Value::Null);
    Some(ParsedCall { primary, item_type, item_id, params })
}

fn type_dir(item_type: &str) -> Option<&'static str> {
    match item_type {
        "directive" => Some("directives"),
        "tool" => Some("tools"),
        "knowledge" => Some("knowledge"),
        _ => None,
    }
}

/// A minimal filename-substring search across every configured space's
/// `.ai/<type-dir>` tree, id-sorted. The resolver (4.B) is id-exact; no
/// full-text index exists, so `rye_search` walks the filesystem.
pub async fn search_items(config: &RuntimeConfig, item_type: &str, query: &str) -> Vec<String> {
    let Some(dir_name) = type_dir(item_type) else {
        return Vec::new();
    };
    let mut roots = vec![config.project_ai_dir().join(dir_name), config.user_ai_dir().join(dir_name)];
    for space in &config.system_spaces {
        roots.push(space.root.join(dir_name));
    }

    let mut ids = Vec::new();
    for root in roots {
        walk(&root, &root, &mut ids).await;
    }
    ids.retain(|id: &String| id.contains(query));
    ids.sort();
    ids.dedup();
    ids
}

fn walk<'a>(
    root: &'a std::path::Path,
    dir: &'a std::path::Path,
    out: &'a mut Vec<String>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out).await;
            } else if let Ok(rel) = path.strip_prefix(root) {
                let id = rel.with_extension("").to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
                out.push(id);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_execute_call() {
        let call = parse_tool_call(
            "rye_execute",
            &json!({"item_type": "tool", "item_id": "rye/file-system/write", "params": {"path": "a.txt"}}),
        )
        .unwrap();
        assert_eq!(call.primary, "execute");
        assert_eq!(call.item_type, "tool");
        assert_eq!(call.item_id, "rye/file-system/write");
        assert_eq!(call.params["path"], "a.txt");
    }

    #[test]
    fn unknown_name_returns_none() {
        assert!(parse_tool_call("directive_return", &json!({"outputs": {}})).is_none());
        assert!(parse_tool_call("thread_directive", &json!({})).is_none());
    }

    #[tokio::test]
    async fn search_finds_matching_ids_under_project_space() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join(".ai/tools/rye/file-system");
        tokio::fs::create_dir_all(&tools).await.unwrap();
        tokio::fs::write(tools.join("write.py"), "# tool").await.unwrap();
        tokio::fs::write(tools.join("read.py"), "# tool").await.unwrap();

        let config = RuntimeConfig {
            project_root: dir.path().to_path_buf(),
            user_space: dir.path().join("nonexistent-user"),
            system_spaces: vec![],
            debug: false,
        };
        let results = search_items(&config, "tool", "write").await;
        assert_eq!(results, vec!["rye/file-system/write".to_string()]);
    }
}
