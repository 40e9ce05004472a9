//! Minimal JSON-Schema parameter validation (spec §4.E step 1): types,
//! required, min/max, enum. Pattern constraints are intentionally not
//! enforced — the workspace carries no regex dependency and none of the
//! example tool schemas in scope use `pattern`.

use serde_json::Value;

use crate::error::ExecError;

/// Validate `params` against a JSON Schema object (`{type: "object",
/// properties: {...}, required: [...]}`).
pub fn validate(schema: Option<&Value>, params: &Value) -> Result<(), ExecError> {
    let Some(schema) = schema else {
        return Ok(());
    };
    let properties = schema.get("properties").and_then(Value::as_object);
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let obj = params
        .as_object()
        .ok_or_else(|| ExecError::ParamValidation("params must be a JSON object".to_string()))?;

    for name in &required {
        if !obj.contains_key(*name) {
            return Err(ExecError::ParamValidation(format!("missing required parameter `{name}`")));
        }
    }

    let Some(properties) = properties else {
        return Ok(());
    };
    for (name, value) in obj {
        let Some(prop_schema) = properties.get(name) else {
            continue;
        };
        check_type(name, value, prop_schema)?;
        check_bounds(name, value, prop_schema)?;
        check_enum(name, value, prop_schema)?;
    }
    Ok(())
}

fn check_type(name: &str, value: &Value, prop_schema: &Value) -> Result<(), ExecError> {
    let Some(expected) = prop_schema.get("type").and_then(Value::as_str) else {
        return Ok(());
    };
    let matches = match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    };
    if matches {
        Ok(())
    } else {
        Err(ExecError::ParamValidation(format!(
            "parameter `{name}` expected type `{expected}`"
        )))
    }
}

fn check_bounds(name: &str, value: &Value, prop_schema: &Value) -> Result<(), ExecError> {
    let Some(n) = value.as_f64() else {
        return Ok(());
    };
    if let Some(min) = prop_schema.get("minimum").and_then(Value::as_f64) {
        if n < min {
            return Err(ExecError::ParamValidation(format!("parameter `{name}` below minimum {min}")));
        }
    }
    if let Some(max) = prop_schema.get("maximum").and_then(Value::as_f64) {
        if n > max {
            return Err(ExecError::ParamValidation(format!("parameter `{name}` above maximum {max}")));
        }
    }
    Ok(())
}

fn check_enum(name: &str, value: &Value, prop_schema: &Value) -> Result<(), ExecError> {
    let Some(allowed) = prop_schema.get("enum").and_then(Value::as_array) else {
        return Ok(());
    };
    if allowed.contains(value) {
        Ok(())
    } else {
        Err(ExecError::ParamValidation(format!("parameter `{name}` not one of the allowed values")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_schema_always_passes() {
        assert!(validate(None, &json!({"anything": 1})).is_ok());
    }

    #[test]
    fn missing_required_parameter_fails() {
        let schema = json!({"type": "object", "required": ["path"], "properties": {"path": {"type": "string"}}});
        assert!(validate(Some(&schema), &json!({})).is_err());
    }

    #[test]
    fn type_mismatch_fails() {
        let schema = json!({"properties": {"count": {"type": "integer"}}});
        assert!(validate(Some(&schema), &json!({"count": "not a number"})).is_err());
    }

    #[test]
    fn out_of_range_fails() {
        let schema = json!({"properties": {"n": {"type": "integer", "minimum": 1, "maximum": 10}}});
        assert!(validate(Some(&schema), &json!({"n": 20})).is_err());
        assert!(validate(Some(&schema), &json!({"n": 5})).is_ok());
    }

    #[test]
    fn enum_violation_fails() {
        let schema = json!({"properties": {"mode": {"enum": ["a", "b"]}}});
        assert!(validate(Some(&schema), &json!({"mode": "c"})).is_err());
    }
}
