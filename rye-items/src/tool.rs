//! Tool item parsing. Tools are distributed as scripts (`.py`, `.sh`,
//! `.js`, `.ts`, `.rb`), plain data (`.yaml`/`.yml`), Primitives, or
//! Runtimes — the metadata convention differs by file type (spec §3,
//! §4.C): YAML files carry metadata as top-level keys; script files
//! carry it as a leading block of `# key: value` / `// key: value`
//! comment lines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ItemsError;

/// What kind of tool this is, determining how `executor_id` (if any) is
/// interpreted by the chain resolver (component D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    /// Terminal executor: runs a subprocess or HTTP call directly.
    Primitive,
    /// Points at another tool via `executor_id`; adds behavior around it.
    Runtime,
    /// A plain script file with no further indirection.
    Script,
    /// A reusable library consumed by other tools, never executed
    /// directly.
    Library,
}

/// Environment composition for subprocess execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Literal environment variables, possibly containing `{var}` /
    /// `${VAR:-default}` templates resolved at execution time.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    /// Extra directories to prepend to `PATH`.
    #[serde(default)]
    pub env_paths: Vec<String>,
}

/// A runtime's anchor search configuration (spec §4.E step 2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorSpec {
    /// Marker filenames; any one present in a directory satisfies the
    /// search.
    #[serde(default)]
    pub markers_any: Vec<String>,
    /// `"always"` fails execution when no marker is found; `"auto"`
    /// proceeds without an anchor.
    #[serde(default = "default_anchor_mode")]
    pub mode: String,
}

fn default_anchor_mode() -> String {
    "auto".to_string()
}

/// Execution tuning for subprocess/HTTP invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Argument templates, each substituted independently and passed to
    /// the subprocess as one argument apiece — never re-split, so a
    /// substituted value containing whitespace stays one argument.
    #[serde(default)]
    pub args: Vec<String>,
    /// Hard timeout for the invocation.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Working directory, relative to the tool's own directory unless
    /// absolute.
    #[serde(default)]
    pub working_dir: Option<String>,
}

/// A parsed tool item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Slash-separated item id.
    pub id: String,
    /// Tool kind.
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    /// For Runtime tools, the tool/primitive this one delegates to.
    #[serde(default)]
    pub executor_id: Option<String>,
    /// For Primitive tools invoking a subprocess: the program template
    /// (one token — arguments live in `exec.args`).
    #[serde(default)]
    pub command: Option<String>,
    /// For Primitive tools invoking HTTP: the target URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Environment composition.
    #[serde(default)]
    pub env: EnvConfig,
    /// Execution tuning.
    #[serde(default)]
    pub exec: ExecConfig,
    /// Anchor search configuration, if this tool's runtime uses one.
    #[serde(default)]
    pub anchor: Option<AnchorSpec>,
    /// JSON Schema for accepted parameters, if declared.
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
    /// Dependency re-verification config, if this runtime enables it.
    #[serde(default)]
    pub verify_deps: Option<VerifyDepsSpec>,
}

/// Which files `verify_deps` covers and how (spec §4.E step 4).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyDepsSpec {
    /// Whether re-verification runs before execution.
    #[serde(default)]
    pub enabled: bool,
    /// `"anchor_subtree"`, `"tool_dir"`, `"tool_siblings"`, or
    /// `"tool_file"`.
    #[serde(default = "default_verify_scope")]
    pub scope: String,
    /// File extensions to check; empty means all.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Directory names to skip entirely.
    #[serde(default)]
    pub excluded_dirs: Vec<String>,
}

fn default_verify_scope() -> String {
    "tool_dir".to_string()
}

fn comment_prefix_for(extension: &str) -> Option<&'static str> {
    match extension {
        "py" | "sh" | "rb" => Some("#"),
        "js" | "ts" => Some("//"),
        _ => None,
    }
}

/// Pull the leading run of `key: value` comment lines into a YAML
/// document, skipping an optional shebang line first.
fn extract_header_metadata(content: &str, prefix: &str) -> String {
    let mut out = String::new();
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#!") {
            continue;
        }
        let Some(rest) = trimmed.strip_prefix(prefix) else {
            break;
        };
        out.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        out.push('\n');
    }
    out
}

/// Parse a tool item given its file content and extension.
pub fn parse_tool(content: &str, extension: &str) -> Result<Tool, ItemsError> {
    if extension == "yaml" || extension == "yml" {
        return serde_yaml::from_str(content).map_err(|e| ItemsError::MalformedMetadata(e.to_string()));
    }
    let prefix = comment_prefix_for(extension)
        .ok_or_else(|| ItemsError::MalformedMetadata(format!("unsupported tool extension `{extension}`")))?;
    let header = extract_header_metadata(content, prefix);
    if header.trim().is_empty() {
        return Err(ItemsError::MissingMetadata(format!(
            "no leading `{prefix} key: value` header found"
        )));
    }
    serde_yaml::from_str(&header).map_err(|e| ItemsError::MalformedMetadata(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_tool() {
        let src = r#"
id: core/tools/http/fetch
type: primitive
url: "https://example.invalid/{path}"
exec:
  timeout_seconds: 30
"#;
        let tool = parse_tool(src, "yaml").unwrap();
        assert_eq!(tool.tool_type, ToolType::Primitive);
        assert_eq!(tool.exec.timeout_seconds, Some(30));
    }

    #[test]
    fn parses_python_script_header() {
        let src = "#!/usr/bin/env python3\n# id: core/tools/file-system/read\n# type: primitive\n# command: \"python3\"\n# exec:\n#   args:\n#     - \"read.py\"\n#     - \"{path}\"\n\nimport sys\nprint('hi')\n";
        let tool = parse_tool(src, "py").unwrap();
        assert_eq!(tool.id, "core/tools/file-system/read");
        assert_eq!(tool.command.as_deref(), Some("python3"));
        assert_eq!(tool.exec.args, vec!["read.py".to_string(), "{path}".to_string()]);
    }

    #[test]
    fn missing_header_on_script_is_an_error() {
        let src = "print('no metadata here')\n";
        let err = parse_tool(src, "py").unwrap_err();
        assert!(matches!(err, ItemsError::MissingMetadata(_)));
    }
}
