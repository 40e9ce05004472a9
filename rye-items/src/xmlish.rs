//! A minimal, explicit scanner for the handful of pseudo-XML shapes
//! directives use (`<process>`, `<step>`, `<context>`, `<hooks>`). Not a
//! general XML parser — deliberately narrow, per spec §9's redesign flag
//! to replace decorator/metaprogramming-style metadata with explicit,
//! non-executing parsers.

/// One parsed element: its tag name, attributes, and raw inner text
/// (which may itself contain nested elements the caller re-scans).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name.
    pub tag: String,
    /// Attribute key/value pairs, in source order.
    pub attrs: Vec<(String, String)>,
    /// Raw text between the opening and closing tags.
    pub inner: String,
}

impl Element {
    /// Look up an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Find every top-level `<tag ...>...</tag>` element matching `tag` in
/// `source`. Does not descend into nested elements of the same name —
/// callers re-scan `inner` for children.
pub fn find_elements(source: &str, tag: &str) -> Vec<Element> {
    let open_prefix = format!("<{tag}");
    let close_tag = format!("</{tag}>");
    let mut out = Vec::new();
    let mut cursor = 0usize;

    while let Some(rel_start) = source[cursor..].find(&open_prefix) {
        let start = cursor + rel_start;
        // Reject matches where the tag name is actually longer (e.g. "step" matching "steps").
        let after_name = start + open_prefix.len();
        let next_char = source[after_name..].chars().next();
        if matches!(next_char, Some(c) if c.is_alphanumeric() || c == '-' || c == '_') {
            cursor = after_name;
            continue;
        }
        let Some(tag_end_rel) = source[start..].find('>') else {
            break;
        };
        let tag_end = start + tag_end_rel;
        let open_tag_text = &source[start..tag_end];
        let self_closing = open_tag_text.trim_end().ends_with('/');
        let attrs = parse_attrs(open_tag_text);

        if self_closing {
            out.push(Element {
                tag: tag.to_string(),
                attrs,
                inner: String::new(),
            });
            cursor = tag_end + 1;
            continue;
        }

        let body_start = tag_end + 1;
        let Some(close_rel) = source[body_start..].find(&close_tag) else {
            break;
        };
        let body_end = body_start + close_rel;
        out.push(Element {
            tag: tag.to_string(),
            attrs,
            inner: source[body_start..body_end].to_string(),
        });
        cursor = body_end + close_tag.len();
    }

    out
}

/// Find the single element of `tag`, if present (convenience for
/// required-cardinality-one elements like `<process>`).
pub fn find_element(source: &str, tag: &str) -> Option<Element> {
    find_elements(source, tag).into_iter().next()
}

fn parse_attrs(open_tag_text: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = open_tag_text;
    // Skip the tag name itself.
    if let Some(space_idx) = rest.find(char::is_whitespace) {
        rest = &rest[space_idx..];
    } else {
        return attrs;
    }

    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i] as char).is_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !(bytes[i] as char).is_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            break;
        }
        let name = rest[name_start..i].to_string();
        i += 1; // skip '='
        if i >= bytes.len() || (bytes[i] != b'"' && bytes[i] != b'\'') {
            break;
        }
        let quote = bytes[i];
        i += 1;
        let val_start = i;
        while i < bytes.len() && bytes[i] != quote {
            i += 1;
        }
        let value = rest[val_start..i].to_string();
        i += 1; // skip closing quote
        if !name.is_empty() {
            attrs.push((name, value));
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_element_with_attrs_and_body() {
        let src = r#"<context position="system">rye/identity</context>"#;
        let el = find_element(src, "context").unwrap();
        assert_eq!(el.attr("position"), Some("system"));
        assert_eq!(el.inner, "rye/identity");
    }

    #[test]
    fn finds_multiple_siblings() {
        let src = r#"<step>a</step><step>b</step>"#;
        let els = find_elements(src, "step");
        assert_eq!(els.len(), 2);
        assert_eq!(els[0].inner, "a");
        assert_eq!(els[1].inner, "b");
    }

    #[test]
    fn does_not_confuse_prefix_tag_names() {
        let src = r#"<steps><step>inner</step></steps>"#;
        let els = find_elements(src, "step");
        assert_eq!(els.len(), 1);
        assert_eq!(els[0].inner, "inner");
    }

    #[test]
    fn self_closing_element_has_empty_inner() {
        let src = r#"<execute tool="rye/x" />"#;
        let el = find_element(src, "execute").unwrap();
        assert_eq!(el.attr("tool"), Some("rye/x"));
        assert_eq!(el.inner, "");
    }
}
