//! Knowledge item parsing: YAML frontmatter plus a markdown body,
//! injected into thread context per a directive's `<context>` entries.

use serde::{Deserialize, Serialize};

use crate::error::ItemsError;

/// Required frontmatter fields (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeFrontmatter {
    /// Slash-separated item id.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Category (must match the resolved directory).
    pub category: String,
    /// Semantic version.
    pub version: String,
    /// Author identity or fingerprint.
    pub author: String,
    /// Creation timestamp, RFC3339.
    pub created_at: String,
}

/// A parsed knowledge item.
#[derive(Debug, Clone, PartialEq)]
pub struct Knowledge {
    /// Frontmatter fields.
    pub frontmatter: KnowledgeFrontmatter,
    /// Markdown body, frontmatter removed.
    pub body: String,
}

/// Parse a knowledge item's `---`-delimited YAML frontmatter and body.
pub fn parse_knowledge(content: &str) -> Result<Knowledge, ItemsError> {
    let rest = content
        .strip_prefix("---\n")
        .ok_or_else(|| ItemsError::MissingMetadata("no YAML frontmatter fence".to_string()))?;
    let end = rest
        .find("\n---")
        .ok_or_else(|| ItemsError::MalformedMetadata("unterminated frontmatter fence".to_string()))?;
    let frontmatter_src = &rest[..end];
    let body_start = rest[end..]
        .find('\n')
        .map(|i| end + i + 1)
        .unwrap_or(rest.len());
    let body = rest[body_start..].trim_start_matches('\n').to_string();

    let frontmatter: KnowledgeFrontmatter = serde_yaml::from_str(frontmatter_src)
        .map_err(|e| ItemsError::MalformedMetadata(e.to_string()))?;

    Ok(Knowledge { frontmatter, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\nid: rye/identity\ntitle: Who you are\ncategory: rye\nversion: 1.0.0\nauthor: rye-core-team\ncreated_at: \"2026-01-01T00:00:00Z\"\n---\nYou are Rye, an execution substrate.\n";

    #[test]
    fn parses_frontmatter_and_body() {
        let k = parse_knowledge(SAMPLE).unwrap();
        assert_eq!(k.frontmatter.id, "rye/identity");
        assert_eq!(k.body.trim(), "You are Rye, an execution substrate.");
    }

    #[test]
    fn missing_fence_is_an_error() {
        let err = parse_knowledge("no frontmatter here").unwrap_err();
        assert!(matches!(err, ItemsError::MissingMetadata(_)));
    }

    #[test]
    fn missing_required_field_fails_to_parse() {
        let src = "---\nid: x\ntitle: y\n---\nbody\n";
        let err = parse_knowledge(src).unwrap_err();
        assert!(matches!(err, ItemsError::MalformedMetadata(_)));
    }
}
