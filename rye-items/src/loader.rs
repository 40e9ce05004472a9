//! Orchestrates resolution (`rye-resolver`) and signature verification
//! (`rye-integrity`) into the loader spec §4.C describes: resolve, read,
//! verify, parse, and — for directives — walk the `extends` chain
//! root-first with cycle detection before merging metadata.

use std::collections::HashSet;

use rye_integrity::TrustStore;
use rye_resolver::{ItemType, Resolver};

use crate::directive::{apply_extends_chain, merge_override, parse_directive, Directive};
use crate::error::ItemsError;
use crate::knowledge::{parse_knowledge, Knowledge};
use crate::tool::{parse_tool, Tool};

async fn read_verified(
    item_type: ItemType,
    id: &str,
    resolver: &Resolver,
    trust_store: &TrustStore,
    authoring_mode: bool,
) -> Result<String, ItemsError> {
    let (path, _space) = resolver
        .resolve(item_type, id)
        .await
        .map_err(|e| ItemsError::Other(Box::new(e)))?;
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ItemsError::Other(Box::new(e)))?;
    if !authoring_mode {
        rye_integrity::verify(&content, trust_store)?;
    }
    Ok(content)
}

/// Load a directive by id, resolving and verifying the full `extends`
/// chain and merging ancestor metadata root-first into the leaf.
///
/// `authoring_mode` skips signature verification; it exists only for the
/// creation/signing path (an unsigned draft has no signature to check
/// yet) and must never be set when loading directives to execute.
pub async fn load_directive(
    id: &str,
    resolver: &Resolver,
    trust_store: &TrustStore,
    authoring_mode: bool,
) -> Result<Directive, ItemsError> {
    let leaf_content = read_verified(ItemType::Directive, id, resolver, trust_store, authoring_mode).await?;
    let mut leaf = parse_directive(&leaf_content)?;

    let mut visited = HashSet::new();
    visited.insert(id.to_string());
    let mut ancestors = Vec::new();
    let mut next = leaf.metadata.extends.clone();
    while let Some(parent_id) = next {
        if !visited.insert(parent_id.clone()) {
            return Err(ItemsError::CyclicExtends(parent_id));
        }
        let content =
            read_verified(ItemType::Directive, &parent_id, resolver, trust_store, authoring_mode).await?;
        let parent = parse_directive(&content)?;
        next = parent.metadata.extends.clone();
        ancestors.push(parent.metadata);
    }
    ancestors.reverse();

    if let Some(root_merged) = apply_extends_chain(&ancestors) {
        leaf.metadata = merge_override(&root_merged, &leaf.metadata);
    }
    Ok(leaf)
}

/// Load and verify a tool item by id. Tools do not participate in the
/// `extends` chain.
pub async fn load_tool(
    id: &str,
    resolver: &Resolver,
    trust_store: &TrustStore,
    authoring_mode: bool,
) -> Result<Tool, ItemsError> {
    let (path, _space) = resolver
        .resolve(ItemType::Tool, id)
        .await
        .map_err(|e| ItemsError::Other(Box::new(e)))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string();
    let content = read_verified(ItemType::Tool, id, resolver, trust_store, authoring_mode).await?;
    parse_tool(&content, &extension)
}

/// Load and verify a knowledge item by id.
pub async fn load_knowledge(
    id: &str,
    resolver: &Resolver,
    trust_store: &TrustStore,
    authoring_mode: bool,
) -> Result<Knowledge, ItemsError> {
    let content = read_verified(ItemType::Knowledge, id, resolver, trust_store, authoring_mode).await?;
    parse_knowledge(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rye_core::RuntimeConfig;
    use rye_integrity::{sign, LocalKeyStore, TrustedIdentity};
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn write_signed_directive(
        dir: &std::path::Path,
        rel: &str,
        body: &str,
        key_store: &Arc<LocalKeyStore>,
        fp: &str,
    ) {
        let path = dir.join(".ai/directives").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let dyn_store: Arc<dyn rye_integrity::KeyStore> = key_store.clone();
        let sig_line = sign(body, "<!--", fp, &dyn_store, chrono::Utc::now())
            .await
            .unwrap();
        fs::write(&path, format!("{body}{sig_line}\n")).unwrap();
    }

    fn config_for(project: &std::path::Path) -> RuntimeConfig {
        RuntimeConfig {
            project_root: project.to_path_buf(),
            user_space: project.join("nonexistent-user"),
            system_spaces: vec![],
            debug: false,
        }
    }

    #[tokio::test]
    async fn loads_directive_and_merges_extends_chain() {
        let dir = tempdir().unwrap();
        let key_store = Arc::new(LocalKeyStore::new());
        let fp = key_store.generate();

        let trust = TrustStore::new();
        let pk = rye_integrity::KeyStore::public_key_bytes(key_store.as_ref(), &fp)
            .await
            .unwrap();
        trust.register_key(&fp, pk);
        trust.register(
            TrustedIdentity {
                fingerprint: fp.clone(),
                origin: "author".into(),
                registered_at: chrono::Utc::now().to_rfc3339(),
                label: None,
                public_key_b64: None,
            },
            rye_core::Space::Project,
        );

        let base = "# Base\n\n```yaml\nid: demo/base\ncategory: demo\nversion: 1.0.0\nmodel:\n  tier: fast\nlimits:\n  turns: 10\ncontext:\n  - id: rye/identity\n    position: system\n```\n\n<process>\n<step><instruction>base step</instruction></step>\n</process>\n";
        write_signed_directive(dir.path(), "demo/base.md", base, &key_store, &fp).await;

        let child = "# Child\n\n```yaml\nid: demo/child\ncategory: demo\nversion: 1.0.0\nmodel:\n  tier: \"\"\nextends: demo/base\nlimits:\n  tokens: 500\ncontext:\n  - id: rye/behavior\n    position: system\n```\n\n<process>\n<step><instruction>child step</instruction></step>\n</process>\n";
        write_signed_directive(dir.path(), "demo/child.md", child, &key_store, &fp).await;

        let resolver = Resolver::new(config_for(dir.path()));
        let directive = load_directive("demo/child", &resolver, &trust, false).await.unwrap();

        assert_eq!(directive.metadata.model.tier, "fast");
        assert_eq!(directive.metadata.limits.turns, Some(10));
        assert_eq!(directive.metadata.limits.tokens, Some(500));
        assert_eq!(directive.metadata.context.len(), 2);
        assert_eq!(directive.process.steps.len(), 1);
    }

    #[tokio::test]
    async fn cyclic_extends_is_rejected() {
        let dir = tempdir().unwrap();
        let key_store = Arc::new(LocalKeyStore::new());
        let fp = key_store.generate();
        let trust = TrustStore::new();
        let pk = rye_integrity::KeyStore::public_key_bytes(key_store.as_ref(), &fp)
            .await
            .unwrap();
        trust.register_key(&fp, pk);
        trust.register(
            TrustedIdentity {
                fingerprint: fp.clone(),
                origin: "author".into(),
                registered_at: chrono::Utc::now().to_rfc3339(),
                label: None,
                public_key_b64: None,
            },
            rye_core::Space::Project,
        );

        let a = "# A\n\n```yaml\nid: demo/a\ncategory: demo\nversion: 1.0.0\nmodel:\n  tier: fast\nextends: demo/b\n```\n\n<process></process>\n";
        write_signed_directive(dir.path(), "demo/a.md", a, &key_store, &fp).await;
        let b = "# B\n\n```yaml\nid: demo/b\ncategory: demo\nversion: 1.0.0\nmodel:\n  tier: fast\nextends: demo/a\n```\n\n<process></process>\n";
        write_signed_directive(dir.path(), "demo/b.md", b, &key_store, &fp).await;

        let resolver = Resolver::new(config_for(dir.path()));
        let err = load_directive("demo/a", &resolver, &trust, false).await.unwrap_err();
        assert!(matches!(err, ItemsError::CyclicExtends(_)));
    }
}
