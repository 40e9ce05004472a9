//! End-to-end smoke test: a signed directive loaded from disk, run
//! through a real [`Orchestrator`] against a [`MockProvider`], completes
//! with no tool dispatch needed.
//!
//! Grounded on `neuron/tests/composition.rs`'s mock-provider pattern and
//! `rye-items/src/loader.rs`'s signed-fixture test helper.

use std::path::Path;
use std::sync::Arc;

use rye::engine::{build, invoke_directive, SpawnLimits};
use rye::prelude::*;
use rye_core::{ContentPart, RuntimeConfig, Space};
use rye_provider::{ProviderResponse, StopReason, TokenUsage};

async fn write_signed_directive(
    project_root: &Path,
    rel: &str,
    body: &str,
    fingerprint: &str,
    key_store: &Arc<dyn KeyStore>,
) {
    let path = project_root.join(".ai/directives").join(rel);
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    let sig_line = rye_integrity::sign(body, "<!--", fingerprint, key_store, chrono::Utc::now())
        .await
        .unwrap();
    tokio::fs::write(&path, format!("{body}{sig_line}\n")).await.unwrap();
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::Text { text: text.to_string() }],
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage { input_tokens: 10, output_tokens: 5 },
        model: "mock-1".to_string(),
        cost: None,
    }
}

fn directive_return_response(outputs: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::ToolUse {
            id: "call-1".to_string(),
            name: "directive_return".to_string(),
            input: serde_json::json!({ "outputs": outputs }),
        }],
        stop_reason: StopReason::ToolUse,
        usage: TokenUsage { input_tokens: 10, output_tokens: 5 },
        model: "mock-1".to_string(),
        cost: None,
    }
}

#[tokio::test]
async fn runs_a_signed_directive_to_completion() {
    let dir = tempfile::tempdir().unwrap();

    let local = Arc::new(LocalKeyStore::new());
    let fingerprint = local.generate();
    let key_store: Arc<dyn KeyStore> = local;
    let trust_store = Arc::new(TrustStore::new());
    let public_key = key_store.public_key_bytes(&fingerprint).await.unwrap();
    trust_store.register_key(&fingerprint, public_key);
    trust_store.register(
        TrustedIdentity {
            fingerprint: fingerprint.clone(),
            origin: "author".to_string(),
            registered_at: chrono::Utc::now().to_rfc3339(),
            label: None,
            public_key_b64: None,
        },
        Space::Project,
    );

    let body = "# Ping\n\n```yaml\nid: demo/ping\ncategory: demo\nversion: 1.0.0\nmodel:\n  tier: fast\n```\n\n<process>\n<step><instruction>Say hi.</instruction></step>\n</process>\n";
    write_signed_directive(dir.path(), "demo/ping.md", body, &fingerprint, &key_store).await;

    let config = RuntimeConfig {
        project_root: dir.path().to_path_buf(),
        user_space: dir.path().join("no-such-user-space"),
        system_spaces: vec![],
        debug: false,
    };

    let provider = MockProvider::new(vec![text_response("hi there")]);
    let limits = SpawnLimits { max_depth: 8, max_spawns_per_thread: 16 };
    let orchestrator = build(provider, config, trust_store, key_store, fingerprint, limits);

    let result = invoke_directive(&orchestrator, "demo/ping", serde_json::json!({}))
        .await
        .expect("directive runs to completion");

    assert_eq!(result.status, ThreadStatus::Completed);
    assert_eq!(result.result_text, "hi there");
    assert_eq!(result.turn_count, 1);
}

#[tokio::test]
async fn text_only_reply_missing_a_required_output_is_reprompted() {
    let dir = tempfile::tempdir().unwrap();

    let local = Arc::new(LocalKeyStore::new());
    let fingerprint = local.generate();
    let key_store: Arc<dyn KeyStore> = local;
    let trust_store = Arc::new(TrustStore::new());
    let public_key = key_store.public_key_bytes(&fingerprint).await.unwrap();
    trust_store.register_key(&fingerprint, public_key);
    trust_store.register(
        TrustedIdentity {
            fingerprint: fingerprint.clone(),
            origin: "author".to_string(),
            registered_at: chrono::Utc::now().to_rfc3339(),
            label: None,
            public_key_b64: None,
        },
        Space::Project,
    );

    let body = "# Summarize\n\n```yaml\nid: demo/summarize\ncategory: demo\nversion: 1.0.0\nmodel:\n  tier: fast\noutputs:\n  - name: summary\n    required: true\n```\n\n<process>\n<step><instruction>Summarize the input.</instruction></step>\n</process>\n";
    write_signed_directive(dir.path(), "demo/summarize.md", body, &fingerprint, &key_store).await;

    let config = RuntimeConfig {
        project_root: dir.path().to_path_buf(),
        user_space: dir.path().join("no-such-user-space"),
        system_spaces: vec![],
        debug: false,
    };

    let provider = MockProvider::new(vec![
        text_response("still thinking"),
        directive_return_response(serde_json::json!({ "summary": "done" })),
    ]);
    let limits = SpawnLimits { max_depth: 8, max_spawns_per_thread: 16 };
    let orchestrator = build(provider, config, trust_store, key_store, fingerprint, limits);

    let result = invoke_directive(&orchestrator, "demo/summarize", serde_json::json!({}))
        .await
        .expect("directive eventually completes once the required output is supplied");

    assert_eq!(result.status, ThreadStatus::Completed);
    assert_eq!(result.outputs, serde_json::json!({ "summary": "done" }));
    assert_eq!(result.turn_count, 2);
}
