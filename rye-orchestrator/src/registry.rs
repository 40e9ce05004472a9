//! Component I: the thread registry and its operations (spec §4.I).
//!
//! Grounded on the teacher's `neuron-orch-local::LocalOrch`: a
//! `HashMap`-backed registry dispatching to registered units of work,
//! with `tokio::spawn` for concurrent detached execution. Generalized
//! from a flat agent registry to a parent/child thread tree with
//! depth/spawn-count enforcement, cancellation, and the
//! suspend-and-resume pair `handoff_thread`/`resume_thread` that
//! `LocalOrch`'s no-op `signal`/`query` have no equivalent for.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use rye_chain::ChainResolver;
use rye_core::{Message, Role, RuntimeConfig, ThreadId};
use rye_provider::Provider;
use rye_runtime::{self, CancelSource, HandoffSource, LimitOverrides, ParentContext, ThreadRequest, ThreadResult, ThreadRuntime, ThreadStatus};

use crate::error::OrchestratorError;

/// Whether a spawn runs inline and blocks the caller, or runs on a
/// detached task that reports back through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnMode {
    /// Run the thread to completion before returning its id.
    Sync,
    /// Return the allocated id immediately; poll `get_status` or call
    /// `wait_threads` to observe completion.
    Detached,
}

/// A point-in-time view of one thread's registry state.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// The thread's id.
    pub thread_id: ThreadId,
    /// The directive it's running.
    pub directive_id: String,
    /// Parent thread id, `None` for a root thread.
    pub parent_thread_id: Option<ThreadId>,
    /// Spawn depth.
    pub depth: u32,
    /// Current status.
    pub status: ThreadStatus,
    /// Total spend once terminal; zero for a still-running thread (spec
    /// §5: a running child's spend is visible only to itself until it
    /// completes).
    pub cost_total: Decimal,
    /// Total tokens once terminal; zero otherwise.
    pub tokens_total: u64,
    /// LLM turns completed once terminal; zero otherwise.
    pub turn_count: u32,
}

/// Sum of cost and tokens across a set of threads, with a count of how
/// many haven't reached a terminal status yet.
#[derive(Debug, Clone, Default)]
pub struct AggregateSummary {
    /// Summed spend across every terminal thread in the set.
    pub cost_total: Decimal,
    /// Summed tokens across every terminal thread in the set.
    pub tokens_total: u64,
    /// How many requested ids had a terminal result.
    pub completed: usize,
    /// How many requested ids are still running or weren't found.
    pub pending: usize,
}

struct ThreadEntry {
    directive_id: String,
    parent_thread_id: Option<ThreadId>,
    depth: u32,
    spawn_count: AtomicU32,
    status_tx: watch::Sender<ThreadStatus>,
    cancel: CancelSource,
    handoff: HandoffSource,
    result: Mutex<Option<ThreadResult>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadEntry {
    fn snapshot(&self, thread_id: &ThreadId, result: Option<&ThreadResult>) -> StatusSnapshot {
        StatusSnapshot {
            thread_id: thread_id.clone(),
            directive_id: self.directive_id.clone(),
            parent_thread_id: self.parent_thread_id.clone(),
            depth: self.depth,
            status: *self.status_tx.borrow(),
            cost_total: result.map(|r| r.cost_total).unwrap_or(Decimal::ZERO),
            tokens_total: result.map(|r| r.tokens_total).unwrap_or(0),
            turn_count: result.map(|r| r.turn_count).unwrap_or(0),
        }
    }
}

/// Process-wide registry of threads spawned against one [`ThreadRuntime`]
/// (spec §4.I). Registry writes are serialized per-parent through the
/// per-entry `spawn_count` atomic; reads (`get_status`, `list_active`)
/// take the registry's read lock, which tokio grants to any number of
/// concurrent readers.
pub struct Orchestrator<P: Provider> {
    runtime: Arc<ThreadRuntime<P>>,
    entries: RwLock<HashMap<ThreadId, Arc<ThreadEntry>>>,
    next_id: AtomicU64,
    config: RuntimeConfig,
    chain_resolver: Arc<ChainResolver>,
    max_depth: u32,
    max_spawns_per_thread: u32,
}

impl<P: Provider + Send + Sync + 'static> Orchestrator<P> {
    /// Build an orchestrator over a runtime and the depth/spawn-count
    /// ceilings it enforces on every spawn (spec §4.I).
    pub fn new(runtime: Arc<ThreadRuntime<P>>, config: RuntimeConfig, chain_resolver: Arc<ChainResolver>, max_depth: u32, max_spawns_per_thread: u32) -> Self {
        Self {
            runtime,
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            config,
            chain_resolver,
            max_depth,
            max_spawns_per_thread,
        }
    }

    fn allocate_id(&self, directive_id: &str) -> ThreadId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        ThreadId::new(format!("{}-{n:x}", directive_id.replace('/', "-")))
    }

    async fn entry(&self, id: &ThreadId) -> Result<Arc<ThreadEntry>, OrchestratorError> {
        self.entries.read().await.get(id).cloned().ok_or_else(|| OrchestratorError::ThreadNotFound(id.clone()))
    }

    /// Enforce max depth and the parent's max spawn count by walking
    /// one step up the parent chain (spec §4.I: "enforced here by
    /// walking the parent chain on every spawn").
    async fn check_limits(&self, parent: Option<&ParentContext>) -> Result<(), OrchestratorError> {
        let Some(parent) = parent else { return Ok(()) };
        if parent.depth + 1 > self.max_depth {
            return Err(OrchestratorError::DepthExceeded { max: self.max_depth });
        }
        let Some(parent_entry) = self.entries.read().await.get(&parent.thread_id).cloned() else {
            return Ok(());
        };
        let prior = parent_entry.spawn_count.fetch_add(1, Ordering::SeqCst);
        if prior + 1 > self.max_spawns_per_thread {
            parent_entry.spawn_count.fetch_sub(1, Ordering::SeqCst);
            return Err(OrchestratorError::SpawnCountExceeded { max: self.max_spawns_per_thread });
        }
        Ok(())
    }

    async fn drive(&self, thread_id: ThreadId, entry: Arc<ThreadEntry>, mode: SpawnMode, task: impl std::future::Future<Output = Result<ThreadResult, rye_core::RyeError>> + Send + 'static) {
        let entry_for_task = entry.clone();
        let run = async move {
            match task.await {
                Ok(result) => {
                    let status = result.status;
                    *entry_for_task.result.lock().await = Some(result);
                    let _ = entry_for_task.status_tx.send(status);
                }
                Err(e) => {
                    tracing::error!(thread_id = %thread_id, error = %e, "thread ended before reaching a loop-governed terminal status");
                    let _ = entry_for_task.status_tx.send(ThreadStatus::Failed);
                }
            }
        };

        match mode {
            SpawnMode::Sync => run.await,
            SpawnMode::Detached => {
                let handle = tokio::spawn(run);
                *entry.join.lock().await = Some(handle);
            }
        }
    }

    /// Allocate an id, record the parent/child edge, and run
    /// `directive_id` either inline (`SpawnMode::Sync`) or on a detached
    /// task returning immediately (spec §4.I).
    pub async fn spawn_thread(
        &self,
        directive_id: impl Into<String>,
        inputs: Value,
        parent: Option<ParentContext>,
        limit_overrides: Option<LimitOverrides>,
        model_override: Option<String>,
        mode: SpawnMode,
    ) -> Result<ThreadId, OrchestratorError> {
        self.check_limits(parent.as_ref()).await?;

        let directive_id = directive_id.into();
        let thread_id = self.allocate_id(&directive_id);

        let (cancel_source, cancel_token) = rye_runtime::channel();
        let (handoff_source, handoff_token) = rye_runtime::handoff_channel();
        let (status_tx, _) = watch::channel(ThreadStatus::Running);

        let entry = Arc::new(ThreadEntry {
            directive_id: directive_id.clone(),
            parent_thread_id: parent.as_ref().map(|p| p.thread_id.clone()),
            depth: parent.as_ref().map(|p| p.depth + 1).unwrap_or(0),
            spawn_count: AtomicU32::new(0),
            status_tx,
            cancel: cancel_source,
            handoff: handoff_source,
            result: Mutex::new(None),
            join: Mutex::new(None),
        });
        self.entries.write().await.insert(thread_id.clone(), entry.clone());

        let request = ThreadRequest { thread_id: thread_id.clone(), directive_id, inputs, parent, limit_overrides, model_override };
        let runtime = self.runtime.clone();
        let task = async move { runtime.run_thread(request, cancel_token, handoff_token).await };

        self.drive(thread_id.clone(), entry, mode, task).await;
        Ok(thread_id)
    }

    /// Re-open a completed/escalated/awaiting-handoff thread: inject
    /// `message` as a new user turn and restart the loop from its
    /// cached final state (spec §4.I `resume_thread`).
    pub async fn resume_thread(&self, id: &ThreadId, message: impl Into<String>, limit_overrides: Option<LimitOverrides>, mode: SpawnMode) -> Result<(), OrchestratorError> {
        let old_entry = self.entry(id).await?;
        let previous = old_entry
            .result
            .lock()
            .await
            .clone()
            .ok_or_else(|| OrchestratorError::InvalidTransition(format!("thread `{id}` has no terminal state to resume from")))?;

        let (cancel_source, cancel_token) = rye_runtime::channel();
        let (handoff_source, handoff_token) = rye_runtime::handoff_channel();
        let (status_tx, _) = watch::channel(ThreadStatus::Running);
        let new_entry = Arc::new(ThreadEntry {
            directive_id: old_entry.directive_id.clone(),
            parent_thread_id: old_entry.parent_thread_id.clone(),
            depth: old_entry.depth,
            spawn_count: AtomicU32::new(old_entry.spawn_count.load(Ordering::SeqCst)),
            status_tx,
            cancel: cancel_source,
            handoff: handoff_source,
            result: Mutex::new(None),
            join: Mutex::new(None),
        });
        self.entries.write().await.insert(id.clone(), new_entry.clone());

        let directive_id = old_entry.directive_id.clone();
        let injected = Message::text(Role::User, message.into());
        let thread = previous.thread;
        let runtime = self.runtime.clone();
        let task = async move { runtime.resume_thread(&directive_id, thread, injected, limit_overrides, cancel_token, handoff_token).await };

        self.drive(id.clone(), new_entry, mode, task).await;
        Ok(())
    }

    /// Suspend a running thread at its next suspension point, carrying
    /// `message` for the next `resume_thread` to inject (spec §4.I
    /// `handoff_thread`).
    pub async fn handoff_thread(&self, id: &ThreadId, message: impl Into<String>) -> Result<(), OrchestratorError> {
        self.entry(id).await?.handoff.request(message);
        Ok(())
    }

    /// Request cancellation; the loop aborts at its next suspension
    /// point and the transcript is still finalized (spec §4.H
    /// "Cancellation").
    pub async fn cancel_thread(&self, id: &ThreadId) -> Result<(), OrchestratorError> {
        self.entry(id).await?.cancel.cancel();
        Ok(())
    }

    /// Forcefully abort a detached thread's task. No transcript
    /// finalization guarantee beyond what was already persisted (spec
    /// §3 `ThreadStatus::Killed`).
    pub async fn kill_thread(&self, id: &ThreadId) -> Result<(), OrchestratorError> {
        let entry = self.entry(id).await?;
        entry.cancel.cancel();
        if let Some(handle) = entry.join.lock().await.take() {
            handle.abort();
        }
        let _ = entry.status_tx.send(ThreadStatus::Killed);
        Ok(())
    }

    /// Current registry view of one thread.
    pub async fn get_status(&self, id: &ThreadId) -> Result<StatusSnapshot, OrchestratorError> {
        let entry = self.entry(id).await?;
        let result = entry.result.lock().await.clone();
        Ok(entry.snapshot(id, result.as_ref()))
    }

    /// Every thread not yet in a terminal status.
    pub async fn list_active(&self) -> Vec<StatusSnapshot> {
        let entries = self.entries.read().await;
        let mut out = Vec::new();
        for (id, entry) in entries.iter() {
            let status = *entry.status_tx.borrow();
            if !status.is_terminal() {
                let result = entry.result.lock().await.clone();
                out.push(entry.snapshot(id, result.as_ref()));
            }
        }
        out
    }

    /// Block until every id in `ids` reaches a terminal status,
    /// returning each one's final result in the given order.
    pub async fn wait_threads(&self, ids: &[ThreadId]) -> Vec<Result<ThreadResult, OrchestratorError>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            out.push(self.wait_one(id).await);
        }
        out
    }

    async fn wait_one(&self, id: &ThreadId) -> Result<ThreadResult, OrchestratorError> {
        let entry = self.entry(id).await?;
        let mut rx = entry.status_tx.subscribe();
        while !rx.borrow().is_terminal() {
            if rx.changed().await.is_err() {
                break;
            }
        }
        entry.result.lock().await.clone().ok_or_else(|| OrchestratorError::ThreadNotFound(id.clone()))
    }

    /// Sum of cost and tokens across a set of threads (spec §4.I
    /// `aggregate_results`).
    pub async fn aggregate_results(&self, ids: &[ThreadId]) -> AggregateSummary {
        let mut summary = AggregateSummary::default();
        for id in ids {
            let Ok(entry) = self.entry(id).await else {
                summary.pending += 1;
                continue;
            };
            match entry.result.lock().await.clone() {
                Some(result) => {
                    summary.cost_total += result.cost_total;
                    summary.tokens_total += result.tokens_total;
                    summary.completed += 1;
                }
                None => summary.pending += 1,
            }
        }
        summary
    }

    /// Resolve and validate `leaf_id`'s executor chain (spec §4.D),
    /// exposed here as `get_chain`.
    pub async fn get_chain(&self, leaf_id: &str) -> Result<Vec<rye_chain::ChainElement>, OrchestratorError> {
        Ok(self.chain_resolver.resolve_chain(leaf_id).await?)
    }

    /// Substring search for item ids of `item_type` (spec §4.I
    /// `chain_search`).
    pub async fn chain_search(&self, item_type: &str, query: &str) -> Vec<String> {
        rye_runtime::dispatch::search_items(&self.config, item_type, query).await
    }

    /// Read a terminal thread's persisted, signed transcript.
    pub async fn read_transcript(&self, id: &ThreadId) -> Result<String, OrchestratorError> {
        let entry = self.entry(id).await?;
        let result = entry
            .result
            .lock()
            .await
            .clone()
            .ok_or_else(|| OrchestratorError::InvalidTransition(format!("thread `{id}` has not persisted a transcript yet")))?;
        Ok(tokio::fs::read_to_string(&result.transcript_path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rye_integrity::{LocalKeyStore, TrustedIdentity, TrustStore};
    use rye_permissions::CapabilitySet as Caps;
    use rye_provider::MockProvider;
    use rye_runtime::{NoSpawner, RuntimeDeps};
    use std::fs;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, Orchestrator<MockProvider>) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".ai/directives/demo")).unwrap();

        let local_keys = Arc::new(LocalKeyStore::new());
        let fp = local_keys.generate();
        let trust_store = Arc::new(TrustStore::new());
        let pk = rye_integrity::KeyStore::public_key_bytes(local_keys.as_ref(), &fp).await.unwrap();
        trust_store.register_key(&fp, pk);
        trust_store.register(
            TrustedIdentity { fingerprint: fp.clone(), origin: "author".into(), registered_at: chrono::Utc::now().to_rfc3339(), label: None, public_key_b64: None },
            rye_core::Space::Project,
        );
        let key_store: Arc<dyn rye_integrity::KeyStore> = local_keys.clone();

        let body = "# Ping\n\n```yaml\nid: demo/ping\ncategory: demo\nversion: 1.0.0\nmodel:\n  tier: fast\n```\n\n<process>\n<step><instruction>Say hi and call directive_return.</instruction></step>\n</process>\n";
        let sig = rye_integrity::sign(body, "<!--", &fp, &key_store, chrono::Utc::now()).await.unwrap();
        fs::write(dir.path().join(".ai/directives/demo/ping.md"), format!("{body}{sig}\n")).unwrap();

        let config = RuntimeConfig {
            project_root: dir.path().to_path_buf(),
            user_space: dir.path().join("nonexistent-user"),
            system_spaces: vec![],
            debug: false,
        };
        let resolver = Arc::new(rye_resolver::Resolver::new(config.clone()));
        let chain_resolver = Arc::new(ChainResolver::new(resolver.clone(), trust_store.clone()));

        let deps = RuntimeDeps {
            runtime_config: config.clone(),
            resolver,
            trust_store,
            chain_resolver: chain_resolver.clone(),
            key_store,
            signing_fingerprint: fp,
            spawner: Arc::new(NoSpawner),
            context_strategy: Arc::new(rye_core::NoCompaction),
        };
        let runtime = Arc::new(ThreadRuntime::new(MockProvider::new(Vec::new()), deps));
        let orchestrator = Orchestrator::new(runtime, config, chain_resolver, 8, 16);
        (dir, orchestrator)
    }

    #[tokio::test]
    async fn unknown_thread_id_is_not_found() {
        let (_dir, orchestrator) = setup().await;
        let err = orchestrator.get_status(&ThreadId::new("missing")).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ThreadNotFound(_)));
    }

    #[tokio::test]
    async fn depth_limit_is_enforced_before_allocating() {
        let (_dir, orchestrator) = setup().await;
        let parent = ParentContext { thread_id: ThreadId::new("root"), depth: 8, capabilities: Caps::All };
        let err = orchestrator
            .spawn_thread("demo/ping", Value::Null, Some(parent), None, None, SpawnMode::Sync)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::DepthExceeded { max: 8 }));
    }
}
