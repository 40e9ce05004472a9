//! The `<process>` body: an ordered list of `<step>`s, each containing
//! one `<execute>`/`<search>`/`<load>`/`<render>`/`<instruction>` block.

use crate::xmlish::find_elements;

/// Which kind of action one process step performs.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Run a tool: `<execute tool="..." .../>`.
    Execute {
        /// Tool item id to execute.
        tool: String,
        /// Raw attribute list, for parameter passthrough.
        attrs: Vec<(String, String)>,
    },
    /// Look up items: `<search .../>`.
    Search {
        /// Raw attribute list (query, item_type, etc.).
        attrs: Vec<(String, String)>,
    },
    /// Load a specific item: `<load item="..." .../>`.
    Load {
        /// Item id to load.
        item: String,
        /// Raw attribute list.
        attrs: Vec<(String, String)>,
    },
    /// Render templated text into the conversation: `<render>...</render>`.
    Render {
        /// Template body.
        body: String,
    },
    /// A plain instruction to the model: `<instruction>...</instruction>`.
    Instruction {
        /// Instruction text.
        body: String,
    },
}

/// One `<step>` in the process body.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessStep {
    /// The step's single action.
    pub action: StepAction,
}

/// The full parsed process body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Process {
    /// Steps, in document order.
    pub steps: Vec<ProcessStep>,
}

/// Parse a `<process>...</process>` body's inner text into an ordered
/// step list.
pub fn parse_process(inner: &str) -> Process {
    let mut steps = Vec::new();
    for step_el in find_elements(inner, "step") {
        if let Some(action) = parse_step_action(&step_el.inner) {
            steps.push(ProcessStep { action });
        }
    }
    Process { steps }
}

fn parse_step_action(step_body: &str) -> Option<StepAction> {
    if let Some(el) = find_elements(step_body, "execute").into_iter().next() {
        let tool = el.attr("tool").unwrap_or_default().to_string();
        return Some(StepAction::Execute {
            tool,
            attrs: el.attrs,
        });
    }
    if let Some(el) = find_elements(step_body, "search").into_iter().next() {
        return Some(StepAction::Search { attrs: el.attrs });
    }
    if let Some(el) = find_elements(step_body, "load").into_iter().next() {
        let item = el.attr("item").unwrap_or_default().to_string();
        return Some(StepAction::Load {
            item,
            attrs: el.attrs,
        });
    }
    if let Some(el) = find_elements(step_body, "render").into_iter().next() {
        return Some(StepAction::Render { body: el.inner });
    }
    if let Some(el) = find_elements(step_body, "instruction").into_iter().next() {
        return Some(StepAction::Instruction { body: el.inner });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_in_document_order() {
        let body = r#"
            <step><instruction>say hi</instruction></step>
            <step><execute tool="rye/file-system/write" path="out/a.txt" /></step>
        "#;
        let process = parse_process(body);
        assert_eq!(process.steps.len(), 2);
        assert!(matches!(process.steps[0].action, StepAction::Instruction { .. }));
        match &process.steps[1].action {
            StepAction::Execute { tool, attrs } => {
                assert_eq!(tool, "rye/file-system/write");
                assert!(attrs.iter().any(|(k, v)| k == "path" && v == "out/a.txt"));
            }
            other => panic!("expected Execute, got {other:?}"),
        }
    }

    #[test]
    fn empty_step_yields_no_action() {
        let body = "<step></step>";
        let process = parse_process(body);
        assert!(process.steps.is_empty());
    }
}
