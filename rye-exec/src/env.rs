//! Environment composition: base OS env → runtime static env (templated)
//! → `env_paths` PATH-prepending (spec §4.E step 3).

use std::collections::HashMap;

use rye_items::EnvConfig;

use crate::template::substitute;

/// Compose a subprocess environment.
pub fn compose_env(
    base: &HashMap<String, String>,
    env_config: &EnvConfig,
    context_vars: &HashMap<String, String>,
    anchor: Option<&str>,
) -> HashMap<String, String> {
    let mut composed = base.clone();

    for (key, raw_value) in &env_config.vars {
        let mut lookup = composed.clone();
        lookup.extend(context_vars.clone());
        composed.insert(key.clone(), substitute(raw_value, &lookup));
    }

    if let Some(anchor) = anchor {
        for path_var in &env_config.env_paths {
            let new_value = match composed.get(path_var) {
                Some(existing) if !existing.is_empty() => format!("{anchor}:{existing}"),
                _ => anchor.to_string(),
            };
            composed.insert(path_var.clone(), new_value);
        }
    }

    composed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_vars_are_templated_against_context() {
        let base = HashMap::new();
        let mut env_config = EnvConfig::default();
        env_config.vars.insert("RYE_PROJECT".to_string(), "{project_path}".to_string());
        let mut ctx = HashMap::new();
        ctx.insert("project_path".to_string(), "/proj".to_string());

        let composed = compose_env(&base, &env_config, &ctx, None);
        assert_eq!(composed.get("RYE_PROJECT"), Some(&"/proj".to_string()));
    }

    #[test]
    fn env_paths_prepend_anchor_to_existing_path() {
        let mut base = HashMap::new();
        base.insert("PATH".to_string(), "/usr/bin".to_string());
        let mut env_config = EnvConfig::default();
        env_config.env_paths.push("PATH".to_string());

        let composed = compose_env(&base, &env_config, &HashMap::new(), Some("/proj/.ai/tools/fs"));
        assert_eq!(composed.get("PATH"), Some(&"/proj/.ai/tools/fs:/usr/bin".to_string()));
    }

    #[test]
    fn env_paths_sets_bare_anchor_when_var_absent() {
        let base = HashMap::new();
        let mut env_config = EnvConfig::default();
        env_config.env_paths.push("PYTHONPATH".to_string());

        let composed = compose_env(&base, &env_config, &HashMap::new(), Some("/anchor"));
        assert_eq!(composed.get("PYTHONPATH"), Some(&"/anchor".to_string()));
    }
}
