//! Capability strings (`rye.<primary>.<item_type>.<dotted-id>`) and the
//! `<permissions>` XML they're compiled from (spec §4.F).

use std::collections::HashSet;

use rye_items::xmlish::find_elements;

use crate::fnmatch::fnmatch;

const PRIMARIES: &[&str] = &["execute", "search", "load", "sign"];
const ITEM_TYPES: &[&str] = &["tool", "directive", "knowledge"];

/// An effective capability set: either the distinguished `ALL`, or an
/// explicit (possibly empty) set of capability strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilitySet {
    /// Grants every capability.
    All,
    /// Grants exactly the listed (possibly wildcarded) capabilities.
    Some(HashSet<String>),
}

impl CapabilitySet {
    /// The fail-closed empty set.
    pub fn empty() -> Self {
        CapabilitySet::Some(HashSet::new())
    }

    /// `true` if some capability in this set fnmatches `required`.
    pub fn permits(&self, required: &str) -> bool {
        match self {
            CapabilitySet::All => true,
            CapabilitySet::Some(caps) => caps.iter().any(|cap| fnmatch(required, cap)),
        }
    }

    /// `true` if this set is empty (no `ALL`, no entries).
    pub fn is_empty(&self) -> bool {
        matches!(self, CapabilitySet::Some(caps) if caps.is_empty())
    }
}

/// Build the canonical capability string for a dispatch.
pub fn capability_string(primary: &str, item_type: &str, item_id: &str) -> String {
    format!("rye.{primary}.{item_type}.{}", item_id.replace('/', "."))
}

/// Parse a directive's raw `<permissions>` inner text into a capability
/// set. `None` or blank input yields the fail-closed empty set; a bare
/// `*` yields [`CapabilitySet::All`].
pub fn parse_permissions(raw: Option<&str>) -> CapabilitySet {
    let Some(raw) = raw else {
        return CapabilitySet::empty();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CapabilitySet::empty();
    }
    if trimmed == "*" {
        return CapabilitySet::All;
    }

    let mut caps = HashSet::new();
    for primary in PRIMARIES {
        for primary_el in find_elements(raw, primary) {
            for item_type in ITEM_TYPES {
                for item_el in find_elements(&primary_el.inner, item_type) {
                    let pattern = item_el.inner.trim();
                    if pattern.is_empty() {
                        continue;
                    }
                    caps.insert(capability_string(primary, item_type, pattern));
                }
            }
        }
    }
    CapabilitySet::Some(caps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_permissions_block_is_fail_closed() {
        assert_eq!(parse_permissions(None), CapabilitySet::empty());
    }

    #[test]
    fn star_sentinel_grants_all() {
        assert_eq!(parse_permissions(Some("*")), CapabilitySet::All);
    }

    #[test]
    fn parses_execute_tool_capability() {
        let xml = r#"
            <execute>
                <tool>rye/file-system/*</tool>
            </execute>
        "#;
        let caps = parse_permissions(Some(xml));
        assert!(caps.permits("rye.execute.tool.rye.file-system.write"));
        assert!(!caps.permits("rye.execute.tool.rye.net.fetch"));
    }

    #[test]
    fn parses_multiple_primaries_and_item_types() {
        let xml = r#"
            <execute><tool>rye/core/*</tool></execute>
            <search><knowledge>*</knowledge></search>
        "#;
        let caps = parse_permissions(Some(xml));
        assert!(caps.permits("rye.execute.tool.rye.core.write"));
        assert!(caps.permits("rye.search.knowledge.anything"));
        assert!(!caps.permits("rye.load.directive.anything"));
    }
}
