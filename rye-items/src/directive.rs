//! Directive parsing: fenced YAML metadata block, `<permissions>` and
//! `<process>` XML blocks, and `extends`-chain shallow-override
//! inheritance (spec §4.C).

use serde::{Deserialize, Serialize};

use crate::error::ItemsError;
use crate::metadata::{ContextItem, HookDecl, IoSpec, Limits, ModelDescriptor};
use crate::process::{parse_process, Process};
use crate::xmlish::find_element;

/// The fenced metadata block's shape, deserialized directly (field-name
/// normalization is handled by serde aliases on [`Limits`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveMetadata {
    /// Slash-separated item id.
    pub id: String,
    /// Category (must match the resolved directory).
    pub category: String,
    /// Semantic version.
    pub version: String,
    /// Model descriptor.
    pub model: ModelDescriptor,
    /// Per-thread limits.
    #[serde(default)]
    pub limits: Limits,
    /// Parent directive id for metadata inheritance.
    #[serde(default)]
    pub extends: Option<String>,
    /// Declared inputs.
    #[serde(default)]
    pub inputs: Vec<IoSpec>,
    /// Declared outputs.
    #[serde(default)]
    pub outputs: Vec<IoSpec>,
    /// Context knowledge items to inject.
    #[serde(default)]
    pub context: Vec<ContextItem>,
    /// Hook declarations.
    #[serde(default)]
    pub hooks: Vec<HookDecl>,
}

/// A fully parsed directive: metadata, raw permissions block (owned by
/// `rye-permissions` to compile into capability strings), and process
/// body.
#[derive(Debug, Clone)]
pub struct Directive {
    /// Normalized metadata (post-inheritance if `extends` was set).
    pub metadata: DirectiveMetadata,
    /// Raw inner text of the `<permissions>` block, if present. `None`
    /// and empty both mean "no permissions" (fail-closed, spec §4.F).
    pub permissions_xml: Option<String>,
    /// Parsed process body.
    pub process: Process,
}

/// Extract the first fenced code block (` ```yaml ` or plain ` ``` `)
/// from markdown source.
fn extract_fenced_block(source: &str) -> Option<&str> {
    let start_marker_yaml = "```yaml";
    let start_marker_plain = "```";
    let (body_start, fence_len) = if let Some(idx) = source.find(start_marker_yaml) {
        (idx + start_marker_yaml.len(), start_marker_yaml.len())
    } else {
        let idx = source.find(start_marker_plain)?;
        (idx + start_marker_plain.len(), start_marker_plain.len())
    };
    let _ = fence_len;
    let rest = &source[body_start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim_start_matches('\n'))
}

/// Parse one directive file's content (signature line already verified
/// and stripped by the caller via `rye-integrity`).
pub fn parse_directive(content: &str) -> Result<Directive, ItemsError> {
    let block = extract_fenced_block(content)
        .ok_or_else(|| ItemsError::MissingMetadata("no fenced metadata block".to_string()))?;
    let metadata: DirectiveMetadata = serde_yaml::from_str(block)
        .map_err(|e| ItemsError::MalformedMetadata(e.to_string()))?;

    let permissions_xml = find_element(content, "permissions").map(|el| el.inner);
    let process = find_element(content, "process")
        .map(|el| parse_process(&el.inner))
        .unwrap_or_default();

    Ok(Directive {
        metadata,
        permissions_xml,
        process,
    })
}

/// Shallow-override-merge a child directive's metadata on top of its
/// resolved ancestor metadata. `context` is the one field that appends
/// rather than overrides (spec §4.C).
pub fn merge_override(base: &DirectiveMetadata, child: &DirectiveMetadata) -> DirectiveMetadata {
    let mut merged = child.clone();
    if merged.model.tier.is_empty() {
        merged.model = base.model.clone();
    }
    merged.limits = Limits {
        turns: child.limits.turns.or(base.limits.turns),
        tokens: child.limits.tokens.or(base.limits.tokens),
        spend: child.limits.spend.or(base.limits.spend),
        duration_seconds: child.limits.duration_seconds.or(base.limits.duration_seconds),
        max_depth: child.limits.max_depth.or(base.limits.max_depth),
        max_spawns: child.limits.max_spawns.or(base.limits.max_spawns),
    };
    if merged.inputs.is_empty() {
        merged.inputs = base.inputs.clone();
    }
    if merged.outputs.is_empty() {
        merged.outputs = base.outputs.clone();
    }
    if merged.hooks.is_empty() {
        merged.hooks = base.hooks.clone();
    }
    let mut context = base.context.clone();
    context.extend(child.context.clone());
    merged.context = context;
    merged
}

/// Apply a root-first chain of ancestor metadata (oldest ancestor first,
/// leaf last) via repeated [`merge_override`].
pub fn apply_extends_chain(chain_root_first: &[DirectiveMetadata]) -> Option<DirectiveMetadata> {
    let mut iter = chain_root_first.iter();
    let mut acc = iter.next()?.clone();
    for next in iter {
        acc = merge_override(&acc, next);
    }
    Some(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# Write a file

```yaml
id: test/tools/file_system/write_file
category: test/tools/file_system
version: 1.0.0
model:
  tier: fast
limits:
  turns: 3
  tokens: 2000
context:
  - id: rye/identity
    position: system
```

<permissions>
  <execute>
    <tool>rye.file-system.*</tool>
  </execute>
</permissions>

<process>
  <step><instruction>write the file</instruction></step>
  <step><execute tool="rye/file-system/write" path="{output_path}" /></step>
</process>
"#;

    #[test]
    fn parses_metadata_permissions_and_process() {
        let d = parse_directive(SAMPLE).unwrap();
        assert_eq!(d.metadata.id, "test/tools/file_system/write_file");
        assert_eq!(d.metadata.limits.turns, Some(3));
        assert_eq!(d.metadata.context.len(), 1);
        assert!(d.permissions_xml.as_ref().unwrap().contains("rye.file-system.*"));
        assert_eq!(d.process.steps.len(), 2);
    }

    #[test]
    fn merge_override_fills_gaps_and_appends_context() {
        let base = DirectiveMetadata {
            id: "base".into(),
            category: "base".into(),
            version: "1.0.0".into(),
            model: ModelDescriptor {
                tier: "fast".into(),
                id: None,
                provider: None,
                fallback: None,
            },
            limits: Limits {
                turns: Some(10),
                ..Default::default()
            },
            extends: None,
            inputs: vec![],
            outputs: vec![],
            context: vec![ContextItem {
                id: "rye/identity".into(),
                position: crate::metadata::ContextPosition::System,
            }],
            hooks: vec![],
        };
        let child = DirectiveMetadata {
            id: "child".into(),
            category: "child".into(),
            version: "1.0.0".into(),
            model: ModelDescriptor {
                tier: String::new(),
                id: None,
                provider: None,
                fallback: None,
            },
            limits: Limits {
                tokens: Some(500),
                ..Default::default()
            },
            extends: Some("base".into()),
            inputs: vec![],
            outputs: vec![],
            context: vec![ContextItem {
                id: "rye/behavior".into(),
                position: crate::metadata::ContextPosition::System,
            }],
            hooks: vec![],
        };

        let merged = merge_override(&base, &child);
        assert_eq!(merged.model.tier, "fast");
        assert_eq!(merged.limits.turns, Some(10));
        assert_eq!(merged.limits.tokens, Some(500));
        assert_eq!(merged.context.len(), 2);
        assert_eq!(merged.context[0].id, "rye/identity");
        assert_eq!(merged.context[1].id, "rye/behavior");
    }
}
