//! Tests for aether-agent: store, notifier, cognition, execution, runtime

use aether_agent::*;
use aether_artifacts::Templater;
use aether_core::config::QueueSettings;
use aether_core::{
    config, AgentState, AgentStatePatch, ArtifactParams, ArtifactRecord, Error, LiveEvent, Mood,
    Thought, ThoughtKind, ThoughtParams, ThoughtResult, ThoughtSource, ARTIFACT_LOG_CAPACITY,
    CONSCIOUSNESS_MAX, ENERGY_MAX, ENERGY_MIN, THOUGHT_LOG_CAPACITY,
};
use aether_llm::{LlmError, LlmGateway, LlmProvider, LlmRequest, LlmResult};
use axum::{http::StatusCode, routing::post, Router};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

// ===========================================================================
// Helpers
// ===========================================================================

fn user_thought(id: &str, kind: ThoughtKind, name: &str) -> Thought {
    Thought::new(kind, ArtifactParams::named(name), format!("make {}", name), ThoughtSource::User)
        .with_id(id)
}

/// Replace a store file with a non-empty directory so renames onto it fail.
fn block_file(path: &Path) {
    std::fs::remove_file(path).unwrap();
    std::fs::create_dir_all(path.join("blocker")).unwrap();
}

struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ()>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<&str, ()>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            delay,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: LlmRequest) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            _ => Err(LlmError::RequestFailed("script exhausted".into())),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str) -> NotifyOutcome {
        self.sent.lock().unwrap().push((title.to_string(), body.to_string()));
        NotifyOutcome::Sent
    }
}

struct Harness {
    _tmp: tempfile::TempDir,
    root: PathBuf,
    store: Arc<Store>,
    events: broadcast::Sender<LiveEvent>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    async fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let store = Arc::new(Store::open(config::state_dir(&root)).await.unwrap());
        let (events, _) = broadcast::channel(64);
        Self {
            _tmp: tmp,
            root,
            store,
            events,
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    fn cognition(&self, llm: LlmGateway, queue: QueueSettings) -> Cognition {
        Cognition::new(self.store.clone(), Arc::new(llm), self.events.clone(), queue).with_seed(7)
    }

    fn executor(&self) -> Executor {
        Executor::new(
            self.store.clone(),
            Templater::default(),
            &self.root,
            self.notifier.clone(),
            self.events.clone(),
        )
    }

    fn thoughts_file(&self) -> PathBuf {
        config::state_dir(&self.root).join("thoughts.json")
    }
}

// ===========================================================================
// Store
// ===========================================================================

#[tokio::test]
async fn open_initializes_both_files() {
    let h = Harness::new().await;
    assert!(h.thoughts_file().is_file());
    assert!(config::state_dir(&h.root).join("state.json").is_file());
    let snap = h.store.snapshot().await;
    assert_eq!(snap.agent_state, AgentState::default());
    assert_eq!(snap.queue_depth, 0);
}

#[tokio::test]
async fn duplicate_append_keeps_one_record() {
    let h = Harness::new().await;
    let t = user_thought("t1", ThoughtKind::CreateAgent, "a");
    h.store.append_thought(t.clone()).await.unwrap();
    let err = h.store.append_thought(t).await.unwrap_err();
    assert_eq!(err.code(), "duplicate_thought_id");
    assert_eq!(h.store.thoughts().await.len(), 1);
}

#[tokio::test]
async fn free_form_is_never_enqueued() {
    let h = Harness::new().await;
    let t = Thought::new(
        ThoughtKind::FreeForm,
        ArtifactParams::default(),
        "hi",
        ThoughtSource::User,
    );
    let err = h.store.append_thought(t).await.unwrap_err();
    assert!(matches!(err, Error::NotEnqueueable(ThoughtKind::FreeForm)));
    assert_eq!(h.store.queue_depth().await, 0);
}

#[tokio::test]
async fn next_pending_is_fifo_by_created_at_then_insertion() {
    let h = Harness::new().await;
    let now = Utc::now();
    let later = user_thought("later", ThoughtKind::CreateRoom, "b").with_created_at(now);
    let first = user_thought("first", ThoughtKind::CreateAgent, "a")
        .with_created_at(now - ChronoDuration::seconds(10));
    let tie = user_thought("tie", ThoughtKind::CreateTool, "c").with_created_at(now);

    h.store.append_thought(later).await.unwrap();
    h.store.append_thought(first).await.unwrap();
    h.store.append_thought(tie).await.unwrap();

    let order = ["first", "later", "tie"];
    for id in order {
        let next = h.store.next_pending().await.unwrap();
        assert_eq!(next.id, id);
        h.store.mark_executed(id, ThoughtResult::success(vec![])).await.unwrap();
    }
    assert!(h.store.next_pending().await.is_none());
}

#[tokio::test]
async fn mark_executed_exactly_once() {
    let h = Harness::new().await;
    h.store
        .append_thought(user_thought("t1", ThoughtKind::CreateAgent, "a"))
        .await
        .unwrap();

    let done = h.store.mark_executed("t1", ThoughtResult::failure("x")).await.unwrap();
    assert!(done.executed);
    assert!(done.executed_at.is_some());

    let again = h.store.mark_executed("t1", ThoughtResult::success(vec![])).await.unwrap_err();
    assert_eq!(again.code(), "already_executed");
    let missing = h.store.mark_executed("nope", ThoughtResult::success(vec![])).await.unwrap_err();
    assert_eq!(missing.code(), "not_found");

    let stored = h.store.thought("t1").await.unwrap();
    assert_eq!(stored.result, Some(ThoughtResult::failure("x")));
}

#[tokio::test]
async fn out_of_range_patch_is_rejected_without_change() {
    let h = Harness::new().await;
    let before = h.store.agent_state().await;
    let patch = AgentStatePatch {
        energy: Some(1.5),
        ..Default::default()
    };
    let err = h.store.update_agent_state(&patch).await.unwrap_err();
    assert_eq!(err.code(), "invalid_patch");
    assert_eq!(h.store.agent_state().await, before);

    let ok = h
        .store
        .update_agent_state(&AgentStatePatch {
            mood: Some(Mood::Energetic),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ok.mood, Mood::Energetic);
}

#[tokio::test]
async fn rings_are_bounded() {
    let h = Harness::new().await;
    for i in 0..(THOUGHT_LOG_CAPACITY + 5) {
        let id = format!("t{}", i);
        h.store
            .append_thought(user_thought(&id, ThoughtKind::CreateTool, &id))
            .await
            .unwrap();
    }
    for i in 0..(ARTIFACT_LOG_CAPACITY + 3) {
        let id = format!("t{}", i);
        let record = ArtifactRecord {
            thought_id: id.clone(),
            kind: ThoughtKind::CreateTool,
            name: id.clone(),
            files: vec![],
            created_at: Utc::now(),
        };
        h.store
            .complete(&id, ThoughtResult::success(vec![]), Some(record))
            .await
            .unwrap();
    }

    let snap = h.store.snapshot().await;
    assert_eq!(snap.recent_thoughts.len(), THOUGHT_LOG_CAPACITY);
    assert_eq!(snap.recent_thoughts.last().unwrap(), "make t54");
    assert_eq!(snap.recent_artifacts.len(), ARTIFACT_LOG_CAPACITY);
    assert_eq!(snap.recent_artifacts[0].thought_id, "t3");
    assert_eq!(snap.total_thoughts, THOUGHT_LOG_CAPACITY + 5);
    assert_eq!(h.store.recent_thoughts(2).await, vec!["make t53", "make t54"]);
}

#[tokio::test]
async fn snapshot_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let before = {
        let store = Store::open(tmp.path()).await.unwrap();
        store
            .append_thought(user_thought("a", ThoughtKind::CreateAgent, "a"))
            .await
            .unwrap();
        store
            .append_thought(user_thought("b", ThoughtKind::CreateRoom, "b"))
            .await
            .unwrap();
        store.mark_executed("a", ThoughtResult::success(vec!["x".into()])).await.unwrap();
        store
            .update_agent_state(&AgentStatePatch {
                cycle_count: Some(3),
                consciousness_level: Some(0.024),
                ..Default::default()
            })
            .await
            .unwrap();
        store.snapshot().await
    };

    let reopened = Store::open(tmp.path()).await.unwrap();
    assert_eq!(reopened.snapshot().await, before);
    assert_eq!(reopened.next_pending().await.unwrap().id, "b");
}

#[tokio::test]
async fn corrupt_file_is_quarantined() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("thoughts.json"), "{ not json").unwrap();
    std::fs::write(tmp.path().join("state.json"), "{\"cycle_count\": \"many\"}").unwrap();

    let store = Store::open(tmp.path()).await.unwrap();
    assert_eq!(store.snapshot().await.total_thoughts, 0);

    let names: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.starts_with("thoughts.json.corrupt-")));
    assert!(names.iter().any(|n| n.starts_with("state.json.corrupt-")));
    let fresh: Vec<Thought> =
        serde_json::from_str(&std::fs::read_to_string(tmp.path().join("thoughts.json")).unwrap())
            .unwrap();
    assert!(fresh.is_empty());
}

#[tokio::test]
async fn duplicate_ids_on_disk_count_as_corrupt() {
    let tmp = tempfile::tempdir().unwrap();
    let t = user_thought("same", ThoughtKind::CreateAgent, "a");
    std::fs::write(
        tmp.path().join("thoughts.json"),
        serde_json::to_string(&vec![t.clone(), t]).unwrap(),
    )
    .unwrap();

    let store = Store::open(tmp.path()).await.unwrap();
    assert_eq!(store.thoughts().await.len(), 0);
}

#[tokio::test]
async fn failed_write_rolls_back_memory() {
    let h = Harness::new().await;
    h.store
        .append_thought(user_thought("keep", ThoughtKind::CreateAgent, "a"))
        .await
        .unwrap();
    let before = h.store.snapshot().await;

    block_file(&h.thoughts_file());
    let err = h
        .store
        .append_thought(user_thought("lost", ThoughtKind::CreateAgent, "b"))
        .await
        .unwrap_err();

    assert!(err.is_store_io());
    assert_eq!(err.code(), "store_io_error");
    assert_eq!(h.store.snapshot().await, before);
    assert!(h.store.thought("lost").await.is_none());
}

#[tokio::test]
async fn commit_cognition_respects_depth_guard() {
    let h = Harness::new().await;
    h.store
        .append_thought(user_thought("u1", ThoughtKind::CreateAgent, "a"))
        .await
        .unwrap();
    let patch = AgentStatePatch {
        cycle_count: Some(1),
        ..Default::default()
    };
    let t = user_thought("c1", ThoughtKind::CreateRoom, "r");

    assert_eq!(h.store.commit_cognition(t.clone(), &patch, 1).await.unwrap(), None);
    assert_eq!(h.store.agent_state().await.cycle_count, 0);

    let state = h.store.commit_cognition(t, &patch, 2).await.unwrap().unwrap();
    assert_eq!(state.cycle_count, 1);
    assert_eq!(h.store.queue_depth().await, 2);
}

// ===========================================================================
// Notifier
// ===========================================================================

async fn webhook(status: StatusCode, delay: Duration) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/hook",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                status
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}/hook", addr), hits)
}

#[tokio::test]
async fn notifier_without_webhook_is_disabled() {
    let n = WebhookNotifier::new(None);
    assert!(!n.is_enabled());
    assert_eq!(n.notify("t", "b").await, NotifyOutcome::Disabled);
}

#[tokio::test]
async fn notifier_rate_limits_successful_sends() {
    let (url, hits) = webhook(StatusCode::NO_CONTENT, Duration::ZERO).await;
    let n = WebhookNotifier::new(Some(url)).with_min_interval(Duration::from_secs(60));

    assert_eq!(n.notify("one", "b").await, NotifyOutcome::Sent);
    assert_eq!(n.notify("two", "b").await, NotifyOutcome::RateLimited);
    assert_eq!(hits.load(Ordering::SeqCst), 1, "rate limited call must not hit the network");
}

#[tokio::test]
async fn notifier_failures_are_values() {
    let (url, hits) = webhook(StatusCode::INTERNAL_SERVER_ERROR, Duration::ZERO).await;
    let n = WebhookNotifier::new(Some(url)).with_min_interval(Duration::from_secs(60));

    assert_eq!(n.notify("one", "b").await, NotifyOutcome::Failed);
    assert_eq!(n.notify("two", "b").await, NotifyOutcome::Failed);
    assert_eq!(hits.load(Ordering::SeqCst), 2, "failures do not open a rate-limit window");
}

#[tokio::test]
async fn notifier_times_out() {
    let (url, _) = webhook(StatusCode::OK, Duration::from_secs(5)).await;
    let n = WebhookNotifier::new(Some(url)).with_timeout(Duration::from_millis(100));
    let started = std::time::Instant::now();
    assert_eq!(n.notify("slow", "b").await, NotifyOutcome::Failed);
    assert!(started.elapsed() < Duration::from_secs(3));
}

// ===========================================================================
// Cognition
// ===========================================================================

#[tokio::test]
async fn cognition_uses_hints_and_rotation() {
    let h = Harness::new().await;
    let provider = ScriptedProvider::new(vec![
        Ok("I will build a helper.\nname: Scout\npurpose: map the web"),
        Ok("A calm place.\ntheme: ocean"),
        Ok("Something to sell"),
    ]);
    let cognition = h.cognition(LlmGateway::new(provider.clone(), "m"), QueueSettings::default());
    let mut rx = h.events.subscribe();

    let mut kinds = Vec::new();
    for _ in 0..3 {
        match cognition.tick().await.unwrap() {
            TickOutcome::Enqueued { thought, .. } => kinds.push(thought),
            other => panic!("unexpected {:?}", other),
        }
    }

    assert_eq!(kinds[0].kind, ThoughtKind::CreateAgent);
    assert_eq!(kinds[0].params.name(), Some("Scout"));
    assert_eq!(kinds[0].params.purpose(), Some("map the web"));
    assert_eq!(kinds[0].content, "I will build a helper");
    assert_eq!(kinds[0].source, ThoughtSource::Cognition);
    assert_eq!(kinds[1].kind, ThoughtKind::CreateRoom);
    assert_eq!(kinds[1].params.theme(), Some("ocean"));
    assert_eq!(kinds[2].kind, ThoughtKind::CreateTool);

    let state = h.store.agent_state().await;
    assert_eq!(state.cycle_count, 3);
    // build (0.018) + none (0.008) + none (0.008)
    assert!((state.consciousness_level - 0.034).abs() < 1e-9);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

    assert!(matches!(rx.recv().await.unwrap(), LiveEvent::ThoughtEnqueued { .. }));
    assert!(matches!(rx.recv().await.unwrap(), LiveEvent::StateUpdated { .. }));
}

#[tokio::test]
async fn cognition_falls_back_to_mood_pool() {
    let h = Harness::new().await;
    let cognition = h.cognition(LlmGateway::disabled(), QueueSettings::default());

    let TickOutcome::Enqueued { thought, state } = cognition.tick().await.unwrap() else {
        panic!("expected enqueue");
    };
    assert!(aether_agent::prose::fallback_pool(Mood::Contemplative)
        .iter()
        .any(|line| *line == thought.content));
    assert_eq!(thought.params, ThoughtParams::default());
    assert_eq!(state.consciousness_level, 0.008);
    assert_eq!(h.store.recent_thoughts(1).await, vec![thought.content]);
}

#[tokio::test]
async fn empty_reply_still_enqueues() {
    let h = Harness::new().await;
    let provider = ScriptedProvider::new(vec![Ok("   ")]);
    let cognition = h.cognition(LlmGateway::new(provider, "m"), QueueSettings::default());
    assert!(matches!(cognition.tick().await.unwrap(), TickOutcome::Enqueued { .. }));
    assert_eq!(h.store.queue_depth().await, 1);
}

#[tokio::test]
async fn state_stays_in_bounds_over_many_ticks() {
    let h = Harness::new().await;
    let cognition = h.cognition(
        LlmGateway::disabled(),
        QueueSettings {
            high_water: 1000,
            low_water: 10,
        },
    );
    let mut last = h.store.agent_state().await;
    for _ in 0..60 {
        let TickOutcome::Enqueued { state, .. } = cognition.tick().await.unwrap() else {
            panic!("expected enqueue");
        };
        assert!((ENERGY_MIN..=ENERGY_MAX).contains(&state.energy));
        assert!(state.consciousness_level >= last.consciousness_level);
        assert!(state.consciousness_level <= CONSCIOUSNESS_MAX);
        assert_eq!(state.cycle_count, last.cycle_count + 1);
        last = state;
    }
}

#[tokio::test]
async fn cognition_backpressure_has_hysteresis() {
    let h = Harness::new().await;
    for i in 0..3 {
        h.store
            .append_thought(user_thought(&format!("u{}", i), ThoughtKind::CreateAgent, "a"))
            .await
            .unwrap();
    }
    let provider = ScriptedProvider::new(vec![Ok("hello")]);
    let cognition = h.cognition(
        LlmGateway::new(provider.clone(), "m"),
        QueueSettings {
            high_water: 3,
            low_water: 1,
        },
    );

    assert_eq!(cognition.tick().await.unwrap(), TickOutcome::Paused { queue_depth: 3 });
    assert!(cognition.is_paused());

    h.store.mark_executed("u0", ThoughtResult::success(vec![])).await.unwrap();
    assert_eq!(cognition.tick().await.unwrap(), TickOutcome::Paused { queue_depth: 2 });

    h.store.mark_executed("u1", ThoughtResult::success(vec![])).await.unwrap();
    assert_eq!(cognition.tick().await.unwrap(), TickOutcome::Paused { queue_depth: 1 });

    h.store.mark_executed("u2", ThoughtResult::success(vec![])).await.unwrap();
    assert!(matches!(cognition.tick().await.unwrap(), TickOutcome::Enqueued { .. }));
    assert!(!cognition.is_paused());

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1, "paused ticks never call the model");
    assert_eq!(h.store.agent_state().await.cycle_count, 1);
}

#[tokio::test]
async fn cancelled_tick_changes_nothing() {
    let h = Harness::new().await;
    let cognition = h.cognition(
        LlmGateway::new(ScriptedProvider::slow(Duration::from_secs(10)), "m"),
        QueueSettings::default(),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert_eq!(cognition.tick_until(&cancel).await.unwrap(), TickOutcome::Cancelled);
    assert_eq!(h.store.agent_state().await, AgentState::default());
    assert_eq!(h.store.queue_depth().await, 0);
}

// ===========================================================================
// Execution
// ===========================================================================

#[tokio::test]
async fn executes_agent_thought() {
    let h = Harness::new().await;
    let executor = h.executor();
    let mut rx = h.events.subscribe();
    h.store
        .append_thought(
            Thought::new(
                ThoughtKind::CreateAgent,
                ArtifactParams::named("DataExpert").with_purpose("Data analysis"),
                "",
                ThoughtSource::User,
            )
            .with_id("t1"),
        )
        .await
        .unwrap();

    let ExecutionOutcome::Executed(thought) = executor.tick().await.unwrap() else {
        panic!("expected execution");
    };
    let result = thought.result.unwrap();
    assert!(result.success);
    assert_eq!(
        result.files,
        vec![
            "artifacts/agents/dataexpert/main.py".to_string(),
            "artifacts/agents/dataexpert/manifest.json".to_string(),
        ]
    );
    for f in &result.files {
        assert!(h.root.join(f).is_file());
    }

    let snap = h.store.snapshot().await;
    assert_eq!(snap.recent_artifacts.len(), 1);
    assert_eq!(snap.recent_artifacts[0].name, "dataexpert");

    let sent = h.notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Created create_agent");

    match rx.recv().await.unwrap() {
        LiveEvent::ThoughtExecuted { thought_id, success, .. } => {
            assert_eq!(thought_id, "t1");
            assert!(success);
        }
        other => panic!("unexpected event {:?}", other),
    }

    assert_eq!(executor.tick().await.unwrap(), ExecutionOutcome::Idle);
}

#[tokio::test]
async fn unsupported_kind_fails_without_files() {
    let h = Harness::new().await;
    h.store
        .append_thought(user_thought("t3", ThoughtKind::Unknown("create_universe".into()), "u"))
        .await
        .unwrap();

    let ExecutionOutcome::Executed(thought) = h.executor().tick().await.unwrap() else {
        panic!("expected execution");
    };
    assert_eq!(thought.result, Some(ThoughtResult::failure("unsupported_kind")));
    assert!(!config::artifacts_dir(&h.root).exists());
    assert!(h.store.snapshot().await.recent_artifacts.is_empty());
    assert_eq!(h.notifier.sent.lock().unwrap()[0].0, "Failed create_universe");
}

#[tokio::test]
async fn unwritable_workspace_fails_every_thought() {
    let h = Harness::new().await;
    std::fs::write(config::artifacts_dir(&h.root), "not a directory").unwrap();
    let executor = h.executor();
    for (i, kind) in [ThoughtKind::CreateAgent, ThoughtKind::CreateRoom, ThoughtKind::CreateTool]
        .into_iter()
        .enumerate()
    {
        h.store
            .append_thought(user_thought(&format!("t{}", i), kind, "x"))
            .await
            .unwrap();
    }

    for _ in 0..3 {
        let ExecutionOutcome::Executed(thought) = executor.tick().await.unwrap() else {
            panic!("expected execution");
        };
        let result = thought.result.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("artifact_write_failed"));
    }
    assert_eq!(h.store.queue_depth().await, 0);
    assert_eq!(h.notifier.sent.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn store_failure_after_write_is_an_error() {
    let h = Harness::new().await;
    h.store
        .append_thought(user_thought("t1", ThoughtKind::CreateTool, "pricer"))
        .await
        .unwrap();
    block_file(&h.thoughts_file());

    let err = h.executor().tick().await.unwrap_err();
    assert!(err.is_store_io());
    assert!(h.store.next_pending().await.is_some(), "thought stays pending in memory");
}

// ===========================================================================
// Runtime
// ===========================================================================

fn runtime_for(h: &Harness, llm: LlmGateway) -> Runtime {
    let llm = Arc::new(llm);
    let cognition = Cognition::new(
        h.store.clone(),
        llm.clone(),
        h.events.clone(),
        QueueSettings::default(),
    );
    Runtime::from_parts(h.store.clone(), llm, h.events.clone(), cognition, h.executor())
}

#[tokio::test]
async fn runtime_produces_and_executes_until_cancelled() {
    let h = Harness::new().await;
    let runtime = runtime_for(&h, LlmGateway::disabled())
        .with_intervals(Duration::from_millis(20), Duration::from_millis(10));
    let cancel = CancellationToken::new();
    let task = tokio::spawn(runtime.run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel.cancel();
    task.await.unwrap().unwrap();

    let thoughts = h.store.thoughts().await;
    assert!(!thoughts.is_empty());
    assert!(thoughts.iter().any(|t| t.executed));
    assert!(h.store.agent_state().await.cycle_count >= 1);
}

#[tokio::test]
async fn runtime_stops_on_fatal_store_error() {
    let h = Harness::new().await;
    h.store
        .append_thought(user_thought("t1", ThoughtKind::CreateAgent, "a"))
        .await
        .unwrap();
    block_file(&h.thoughts_file());

    let runtime = runtime_for(&h, LlmGateway::disabled())
        .with_intervals(Duration::from_secs(3600), Duration::from_millis(10));
    let cancel = CancellationToken::new();
    let err = tokio::time::timeout(Duration::from_secs(5), runtime.run(cancel.clone()))
        .await
        .expect("runtime should stop by itself")
        .unwrap_err();

    assert!(err.is_store_io());
    assert!(cancel.is_cancelled());
}
