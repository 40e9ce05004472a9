//! Directive-authored `<hook when="...">` expressions (spec §4.H step
//! 4.f). Unlike [`rye_core::Hook`] (a programmatic embedder extension
//! point, grounded on `layer0::hook`), these expressions are small
//! strings a directive's YAML carries and have no teacher precedent —
//! the grammar here is deliberately minimal: dotted-field comparisons
//! joined by `&&`.

/// The fields a hook's `when` expression can reference (spec §4.H).
#[derive(Debug, Clone)]
pub struct HookEnv {
    /// `cost.current`: the thread's total spend so far.
    pub cost_current: f64,
    /// `cost.limit`: the thread's spend limit, if any.
    pub cost_limit: Option<f64>,
    /// `loop_count`: LLM turns completed so far.
    pub loop_count: u32,
    /// `error.type`: the most recent error kind name, if any.
    pub error_type: Option<String>,
    /// `thread.event`: a free-form event tag for the current evaluation
    /// point (e.g. `"tool_dispatch"`, `"escalation"`).
    pub thread_event: String,
}

fn field_value(env: &HookEnv, field: &str) -> Option<FieldValue> {
    match field {
        "cost.current" => Some(FieldValue::Number(env.cost_current)),
        "cost.limit" => env.cost_limit.map(FieldValue::Number),
        "loop_count" => Some(FieldValue::Number(env.loop_count as f64)),
        "error.type" => env.error_type.clone().map(FieldValue::Text),
        "thread.event" => Some(FieldValue::Text(env.thread_event.clone())),
        _ => None,
    }
}

enum FieldValue {
    Number(f64),
    Text(String),
}

const OPS: &[&str] = &[">=", "<=", "==", "!=", ">", "<"];

fn eval_comparison(expr: &str, env: &HookEnv) -> bool {
    let expr = expr.trim();
    for op in OPS {
        if let Some(idx) = expr.find(op) {
            let field = expr[..idx].trim();
            let literal = expr[idx + op.len()..].trim().trim_matches('"').trim_matches('\'');
            let Some(value) = field_value(env, field) else {
                return false;
            };
            return match value {
                FieldValue::Number(actual) => {
                    let Ok(target) = literal.parse::<f64>() else { return false };
                    match *op {
                        ">=" => actual >= target,
                        "<=" => actual <= target,
                        "==" => (actual - target).abs() < f64::EPSILON,
                        "!=" => (actual - target).abs() >= f64::EPSILON,
                        ">" => actual > target,
                        "<" => actual < target,
                        _ => false,
                    }
                }
                FieldValue::Text(actual) => match *op {
                    "==" => actual == literal,
                    "!=" => actual != literal,
                    _ => false,
                },
            };
        }
    }
    false
}

/// Evaluate a `when` expression (one or more comparisons joined by
/// `&&`) against `env`. An unparseable or unknown-field expression is
/// treated as non-matching rather than erroring, so a malformed hook
/// never aborts the thread loop.
pub fn evaluate(expr: &str, env: &HookEnv) -> bool {
    expr.split("&&").all(|clause| eval_comparison(clause, env))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> HookEnv {
        HookEnv {
            cost_current: 0.75,
            cost_limit: Some(1.0),
            loop_count: 3,
            error_type: None,
            thread_event: "tool_dispatch".to_string(),
        }
    }

    #[test]
    fn numeric_comparison_matches() {
        assert!(evaluate("cost.current > 0.5", &env()));
        assert!(!evaluate("cost.current > 5", &env()));
    }

    #[test]
    fn field_against_another_fields_limit_is_unsupported_and_non_matching() {
        assert!(!evaluate("cost.current > cost.limit", &env()));
    }

    #[test]
    fn conjunction_requires_every_clause() {
        assert!(evaluate("cost.current > 0.5 && loop_count >= 3", &env()));
        assert!(!evaluate("cost.current > 0.5 && loop_count >= 10", &env()));
    }

    #[test]
    fn string_field_equality() {
        assert!(evaluate("thread.event == \"tool_dispatch\"", &env()));
        assert!(!evaluate("thread.event == \"escalation\"", &env()));
    }

    #[test]
    fn unknown_field_does_not_match() {
        assert!(!evaluate("nonsense.field > 1", &env()));
    }
}
