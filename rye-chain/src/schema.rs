//! Minimal JSON-Schema compatibility check for adjacent chain elements
//! (spec §4.D): the child's declared parameters must be a compatible
//! superset of the parent's — same property names present, with matching
//! `type` where both sides declare one.

use serde_json::Value;

/// Returns `Ok(())` if `child_schema` is a compatible superset of
/// `parent_schema`, or `Err(reason)` naming the first incompatibility
/// found. `None` on either side is treated as "no constraint" and always
/// compatible.
pub fn check_compatible(parent_schema: Option<&Value>, child_schema: Option<&Value>) -> Result<(), String> {
    let Some(parent) = parent_schema else {
        return Ok(());
    };
    let Some(parent_props) = parent.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    let child_props = child_schema
        .and_then(|s| s.get("properties"))
        .and_then(Value::as_object);

    for (name, parent_prop) in parent_props {
        let Some(child_props) = child_props else {
            return Err(format!("child declares no parameters but parent requires `{name}`"));
        };
        let Some(child_prop) = child_props.get(name) else {
            return Err(format!("child is missing parameter `{name}`"));
        };
        let parent_type = parent_prop.get("type").and_then(Value::as_str);
        let child_type = child_prop.get("type").and_then(Value::as_str);
        if let (Some(p), Some(c)) = (parent_type, child_type) {
            if p != c {
                return Err(format!("parameter `{name}` type mismatch: parent wants `{p}`, child has `{c}`"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_schemas_are_compatible() {
        let schema = json!({"properties": {"path": {"type": "string"}}});
        assert!(check_compatible(Some(&schema), Some(&schema)).is_ok());
    }

    #[test]
    fn child_missing_required_parameter_is_incompatible() {
        let parent = json!({"properties": {"path": {"type": "string"}}});
        let child = json!({"properties": {}});
        assert!(check_compatible(Some(&parent), Some(&child)).is_err());
    }

    #[test]
    fn mismatched_types_are_incompatible() {
        let parent = json!({"properties": {"count": {"type": "integer"}}});
        let child = json!({"properties": {"count": {"type": "string"}}});
        assert!(check_compatible(Some(&parent), Some(&child)).is_err());
    }

    #[test]
    fn no_parent_schema_is_always_compatible() {
        assert!(check_compatible(None, None).is_ok());
    }
}
