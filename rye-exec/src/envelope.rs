//! The normalized result envelope every primitive invocation produces
//! (spec §4.E step 7, §6).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a primitive invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The invocation succeeded.
    Success,
    /// The invocation failed; `data.error` carries the reason.
    Error,
}

/// The normalized `{status, type, item_id, data}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Outcome.
    pub status: Status,
    /// Always `"tool"` for primitive executor results.
    #[serde(rename = "type")]
    pub result_type: String,
    /// The leaf tool id that was invoked.
    pub item_id: String,
    /// Tool-defined payload, or `{"error": "..."}` on failure.
    pub data: Value,
}

impl ResultEnvelope {
    /// Build a success envelope.
    pub fn success(item_id: impl Into<String>, data: Value) -> Self {
        Self {
            status: Status::Success,
            result_type: "tool".to_string(),
            item_id: item_id.into(),
            data,
        }
    }

    /// Build an error envelope from a human-readable message.
    pub fn error(item_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            result_type: "tool".to_string(),
            item_id: item_id.into(),
            data: serde_json::json!({ "error": message.into() }),
        }
    }
}

/// Graph-tool runtimes unwrap their inner `data` into the top-level
/// result so edges can reference `${result.stdout}` directly; on inner
/// failure, inject `status: "error"` into the unwrapped result so
/// `on_error` edges fire (spec §4.E, graph-tool special rule).
pub fn unwrap_graph_result(envelope: &ResultEnvelope) -> Value {
    let mut unwrapped = envelope.data.clone();
    if envelope.status == Status::Error {
        if let Value::Object(ref mut map) = unwrapped {
            map.insert("status".to_string(), Value::String("error".to_string()));
        } else {
            unwrapped = serde_json::json!({ "status": "error", "value": unwrapped });
        }
    }
    unwrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn graph_unwrap_passes_through_on_success() {
        let envelope = ResultEnvelope::success("demo/tool", json!({"stdout": "ok"}));
        assert_eq!(unwrap_graph_result(&envelope), json!({"stdout": "ok"}));
    }

    #[test]
    fn graph_unwrap_injects_error_status_on_failure() {
        let envelope = ResultEnvelope {
            status: Status::Error,
            result_type: "tool".to_string(),
            item_id: "demo/tool".to_string(),
            data: json!({"stdout": "partial"}),
        };
        let unwrapped = unwrap_graph_result(&envelope);
        assert_eq!(unwrapped["status"], json!("error"));
        assert_eq!(unwrapped["stdout"], json!("partial"));
    }
}
