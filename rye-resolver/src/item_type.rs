//! Item type → directory/extension mapping (spec §4.B, §6 filesystem layout).

use serde::{Deserialize, Serialize};

/// The three item kinds Rye OS resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Markdown + pseudo-XML process template.
    Directive,
    /// Executable unit: script, runtime, or primitive.
    Tool,
    /// Markdown with YAML frontmatter.
    Knowledge,
}

impl ItemType {
    /// Directory name under `.ai/` for this item type.
    pub fn dir_name(self) -> &'static str {
        match self {
            ItemType::Directive => "directives",
            ItemType::Tool => "tools",
            ItemType::Knowledge => "knowledge",
        }
    }

    /// Valid extensions for this item type, in the fixed try-order spec §4.B
    /// defines.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ItemType::Directive => &["md"],
            ItemType::Tool => &["py", "yaml", "yml", "sh", "js", "ts", "rb"],
            ItemType::Knowledge => &["md", "yaml", "yml"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_only_accepts_markdown() {
        assert_eq!(ItemType::Directive.extensions(), &["md"]);
    }

    #[test]
    fn tool_extension_order_is_fixed() {
        assert_eq!(
            ItemType::Tool.extensions(),
            &["py", "yaml", "yml", "sh", "js", "ts", "rb"]
        );
    }
}
