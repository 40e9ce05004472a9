//! The primitive executor (spec §4.E): validates parameters, composes
//! context variables and environment, optionally re-verifies
//! dependencies, invokes the terminal primitive, and normalizes the
//! result envelope.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use rye_chain::ChainElement;
use rye_integrity::TrustStore;
use rye_items::AnchorSpec;
use serde_json::Value;

use crate::anchor::{resolve_anchor, AnchorConfig, AnchorMode};
use crate::env::compose_env;
use crate::envelope::ResultEnvelope;
use crate::error::ExecError;
use crate::schema_validate::validate;
use crate::template::substitute;
use crate::verify_deps::{verify_deps, VerifyScope};

/// Everything the executor needs beyond the resolved chain.
pub struct ExecutionRequest {
    /// Caller-supplied tool parameters.
    pub params: Value,
    /// Absolute project root, for the `{project_path}` variable and the
    /// `--project-path` CLI flag.
    pub project_path: PathBuf,
    /// The base OS environment snapshot to compose on top of.
    pub base_env: HashMap<String, String>,
    /// Rendered `{user_space}` variable value.
    pub user_space: String,
    /// Rendered `{system_space}` variable value.
    pub system_space: String,
}

/// Runs the terminal primitive of a resolved, validated chain.
pub struct PrimitiveExecutor<'a> {
    trust_store: &'a TrustStore,
}

impl<'a> PrimitiveExecutor<'a> {
    /// Build an executor backed by `trust_store` (used for `verify_deps`).
    pub fn new(trust_store: &'a TrustStore) -> Self {
        Self { trust_store }
    }

    /// Run `chain`'s terminal primitive with `request`, returning the
    /// normalized result envelope. Tool-level failures (nonzero exit,
    /// `data.success == false`) come back as `Ok(ResultEnvelope::error)`,
    /// not `Err` — only executor-internal failures (bad schema, missing
    /// command, spawn failure) are `Err`.
    pub async fn execute(&self, chain: &[ChainElement], request: ExecutionRequest) -> Result<ResultEnvelope, ExecError> {
        let leaf = chain.first().ok_or_else(|| ExecError::Subprocess("empty chain".to_string()))?;
        validate(leaf.tool.parameters.as_ref(), &request.params)?;

        let primitive = chain.last().ok_or_else(|| ExecError::Subprocess("empty chain".to_string()))?;

        let tool_dir = primitive.path.parent().unwrap_or_else(|| Path::new("."));
        let tool_parent = tool_dir.parent().unwrap_or_else(|| Path::new("."));

        let anchor_path = match &primitive.tool.anchor {
            Some(spec) => resolve_anchor(tool_dir, &to_anchor_config(spec)).await?,
            None => None,
        };

        let runtime_lib = if chain.len() >= 2 {
            Some(chain[chain.len() - 2].path.display().to_string())
        } else {
            None
        };

        let mut vars = HashMap::new();
        vars.insert("tool_path".to_string(), primitive.path.display().to_string());
        vars.insert("tool_dir".to_string(), tool_dir.display().to_string());
        vars.insert("tool_parent".to_string(), tool_parent.display().to_string());
        vars.insert("project_path".to_string(), request.project_path.display().to_string());
        vars.insert("params_json".to_string(), request.params.to_string());
        vars.insert("user_space".to_string(), request.user_space.clone());
        vars.insert("system_space".to_string(), request.system_space.clone());
        if let Some(anchor) = &anchor_path {
            vars.insert("anchor_path".to_string(), anchor.display().to_string());
        }
        if let Some(lib) = &runtime_lib {
            vars.insert("runtime_lib".to_string(), lib.clone());
        }

        if let Some(verify_cfg) = &primitive.tool.verify_deps {
            if verify_cfg.enabled {
                let scope = match verify_cfg.scope.as_str() {
                    "anchor_subtree" => VerifyScope::AnchorSubtree(anchor_path.clone().unwrap_or_else(|| tool_dir.to_path_buf())),
                    "tool_siblings" => VerifyScope::ToolSiblings(primitive.path.clone()),
                    "tool_file" => VerifyScope::ToolFile(primitive.path.clone()),
                    _ => VerifyScope::ToolDir(tool_dir.to_path_buf()),
                };
                verify_deps(scope, &verify_cfg.extensions, &verify_cfg.excluded_dirs, self.trust_store).await?;
            }
        }

        let env = compose_env(
            &request.base_env,
            &primitive.tool.env,
            &vars,
            anchor_path.as_ref().and_then(|p| p.to_str()),
        );

        let command_template = primitive
            .tool
            .command
            .clone()
            .ok_or_else(|| ExecError::Subprocess(format!("primitive `{}` declares no command", primitive.id)))?;
        let program = substitute(&command_template, &vars);
        if program.is_empty() {
            return Err(ExecError::Subprocess("empty command template".to_string()));
        }
        let rendered_args: Vec<String> = primitive.tool.exec.args.iter().map(|arg| substitute(arg, &vars)).collect();

        let working_dir = primitive
            .tool
            .exec
            .working_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| tool_dir.to_path_buf());

        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(&rendered_args)
            .arg("--params")
            .arg(request.params.to_string())
            .arg("--project-path")
            .arg(request.project_path.display().to_string())
            .current_dir(working_dir)
            .env_clear()
            .envs(&env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let timeout = Duration::from_secs(primitive.tool.exec.timeout_seconds.unwrap_or(30));
        let child = cmd.spawn().map_err(|e| ExecError::Subprocess(e.to_string()))?;
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ExecError::Subprocess(e.to_string())),
            Err(_) => {
                return Ok(ResultEnvelope::error(leaf.id.clone(), "tool invocation timed out".to_string()));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Ok(ResultEnvelope::error(
                leaf.id.clone(),
                format!("exited with {}: {stderr}", output.status),
            ));
        }

        let parsed: Value = serde_json::from_str(stdout.trim())
            .map_err(|e| ExecError::OutputParse(format!("{e}: {stdout}")))?;

        let succeeded = parsed.get("success").and_then(Value::as_bool).unwrap_or(true);
        if succeeded {
            Ok(ResultEnvelope::success(leaf.id.clone(), parsed))
        } else {
            let message = parsed
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("tool reported failure")
                .to_string();
            Ok(ResultEnvelope::error(leaf.id.clone(), message))
        }
    }
}

fn to_anchor_config(spec: &AnchorSpec) -> AnchorConfig {
    AnchorConfig {
        markers_any: spec.markers_any.clone(),
        mode: if spec.mode == "always" { AnchorMode::Always } else { AnchorMode::Auto },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rye_core::Space;
    use rye_items::{EnvConfig, ExecConfig, Tool, ToolType};

    fn primitive_element(id: &str, path: PathBuf, command: &str) -> ChainElement {
        ChainElement {
            id: id.to_string(),
            tool: Tool {
                id: id.to_string(),
                tool_type: ToolType::Primitive,
                executor_id: None,
                command: Some(command.to_string()),
                url: None,
                env: EnvConfig::default(),
                exec: ExecConfig {
                    args: Vec::new(),
                    timeout_seconds: Some(5),
                    working_dir: None,
                },
                anchor: None,
                parameters: None,
                verify_deps: None,
            },
            space: Space::Project,
            path,
        }
    }

    #[tokio::test]
    async fn nonexistent_command_surfaces_as_subprocess_error() {
        let trust = TrustStore::new();
        let executor = PrimitiveExecutor::new(&trust);
        let chain = vec![primitive_element(
            "demo/tool",
            PathBuf::from("/tmp/demo_tool.py"),
            "definitely-not-a-real-binary-xyz",
        )];
        let request = ExecutionRequest {
            params: serde_json::json!({}),
            project_path: PathBuf::from("/tmp"),
            base_env: HashMap::new(),
            user_space: "/home/user/.ai".to_string(),
            system_space: "".to_string(),
        };
        let err = executor.execute(&chain, request).await.unwrap_err();
        assert!(matches!(err, ExecError::Subprocess(_)));
    }

    #[tokio::test]
    async fn arg_template_with_embedded_whitespace_stays_one_argument() {
        let trust = TrustStore::new();
        let executor = PrimitiveExecutor::new(&trust);
        let mut element = primitive_element("demo/tool", PathBuf::from("/tmp/demo_tool.py"), "/bin/sh");
        let script = r#"printf '{"arg1":"%s"}' "$1""#;
        element.tool.exec.args = vec!["-c".to_string(), script.to_string(), "sh".to_string(), "{project_path}".to_string()];
        let request = ExecutionRequest {
            params: serde_json::json!({}),
            project_path: PathBuf::from("/tmp/has space"),
            base_env: HashMap::new(),
            user_space: String::new(),
            system_space: String::new(),
        };
        let envelope = executor.execute(&[element], request).await.unwrap();
        assert_eq!(envelope.status, crate::envelope::Status::Success);
        assert_eq!(envelope.data.get("arg1").and_then(Value::as_str), Some("/tmp/has space"));
    }

    #[tokio::test]
    async fn missing_command_is_an_error() {
        let trust = TrustStore::new();
        let executor = PrimitiveExecutor::new(&trust);
        let mut element = primitive_element("demo/tool", PathBuf::from("/tmp/demo_tool.py"), "");
        element.tool.command = None;
        let request = ExecutionRequest {
            params: serde_json::json!({}),
            project_path: PathBuf::from("/tmp"),
            base_env: HashMap::new(),
            user_space: String::new(),
            system_space: String::new(),
        };
        let err = executor.execute(&[element], request).await.unwrap_err();
        assert!(matches!(err, ExecError::Subprocess(_)));
    }
}
