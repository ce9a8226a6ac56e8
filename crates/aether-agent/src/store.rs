//! Store - the single authority for durable state
//!
//! Layout under the state directory:
//!   thoughts.json   array of every thought ever appended
//!   state.json      agent state plus the thought and artifact rings
//!
//! Every mutation takes one async mutex, applies in memory, then persists
//! with write-temp/fsync/rename. A failed write restores the in-memory
//! copy before the error is returned.

use aether_core::{
    AgentState, AgentStatePatch, ArtifactRecord, Error, Result, Snapshot, Thought, ThoughtKind,
    ThoughtResult, ARTIFACT_LOG_CAPACITY, THOUGHT_LOG_CAPACITY,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const THOUGHTS_FILE: &str = "thoughts.json";
pub const STATE_FILE: &str = "state.json";

/// Contents of `state.json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(flatten)]
    pub agent: AgentState,
    #[serde(default)]
    pub thought_log: VecDeque<String>,
    #[serde(default)]
    pub artifact_log: VecDeque<ArtifactRecord>,
}

impl PersistedState {
    fn log_thought(&mut self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        self.thought_log.push_back(content.to_string());
        while self.thought_log.len() > THOUGHT_LOG_CAPACITY {
            self.thought_log.pop_front();
        }
    }

    fn log_artifact(&mut self, record: ArtifactRecord) {
        self.artifact_log.push_back(record);
        while self.artifact_log.len() > ARTIFACT_LOG_CAPACITY {
            self.artifact_log.pop_front();
        }
    }
}

struct Inner {
    thoughts: Vec<Thought>,
    ids: HashSet<String>,
    state: PersistedState,
}

impl Inner {
    fn pending(&self) -> impl Iterator<Item = &Thought> {
        self.thoughts.iter().filter(|t| t.is_pending())
    }

    fn queue_depth(&self) -> usize {
        self.pending().count()
    }
}

/// Which files a mutation dirtied.
#[derive(Clone, Copy)]
struct Dirty {
    thoughts: bool,
    state: bool,
}

impl Dirty {
    const THOUGHTS: Dirty = Dirty { thoughts: true, state: false };
    const STATE: Dirty = Dirty { thoughts: false, state: true };
    const BOTH: Dirty = Dirty { thoughts: true, state: true };
}

pub struct Store {
    thoughts_path: PathBuf,
    state_path: PathBuf,
    inner: Mutex<Inner>,
}

impl Store {
    /// Open (or initialize) the store in `state_dir`.
    ///
    /// Missing files start fresh. Malformed files are moved aside as
    /// `<file>.corrupt-<timestamp>` and replaced.
    pub async fn open(state_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = state_dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::store_io(dir, e))?;

        let thoughts_path = dir.join(THOUGHTS_FILE);
        let state_path = dir.join(STATE_FILE);

        let (thoughts, thoughts_fresh) =
            load_or_fresh(&thoughts_path, |t: &Vec<Thought>| validate_thoughts(t)).await?;
        let (state, state_fresh) =
            load_or_fresh(&state_path, |_: &PersistedState| Ok(())).await?;

        let ids = thoughts.iter().map(|t| t.id.clone()).collect();
        let store = Self {
            thoughts_path,
            state_path,
            inner: Mutex::new(Inner {
                thoughts,
                ids,
                state,
            }),
        };

        if thoughts_fresh || state_fresh {
            let inner = store.inner.lock().await;
            let dirty = Dirty {
                thoughts: thoughts_fresh,
                state: state_fresh,
            };
            store.persist(&inner, dirty).await?;
        }

        {
            let inner = store.inner.lock().await;
            info!(
                "store opened: {} thoughts ({} pending), cycle {}",
                inner.thoughts.len(),
                inner.queue_depth(),
                inner.state.agent.cycle_count
            );
        }
        Ok(store)
    }

    // -----------------------------------------------------------------------
    // Thought queue
    // -----------------------------------------------------------------------

    /// Append a thought. Fails with `DuplicateThought` if the id exists and
    /// with `NotEnqueueable` for `free_form`.
    pub async fn append_thought(&self, thought: Thought) -> Result<()> {
        let mut inner = self.inner.lock().await;
        check_enqueueable(&inner, &thought)?;

        let saved_state = inner.state.clone();
        push_thought(&mut inner, thought);

        if let Err(e) = self.persist(&inner, Dirty::BOTH).await {
            if let Some(t) = inner.thoughts.pop() {
                inner.ids.remove(&t.id);
            }
            inner.state = saved_state;
            self.repair(&inner, Dirty::BOTH).await;
            return Err(e);
        }
        Ok(())
    }

    /// Append a thought and apply a state patch in one step, unless the
    /// queue already holds `max_depth` or more pending thoughts.
    ///
    /// Returns `None` when the depth guard refused the commit.
    pub async fn commit_cognition(
        &self,
        thought: Thought,
        patch: &AgentStatePatch,
        max_depth: usize,
    ) -> Result<Option<AgentState>> {
        let mut inner = self.inner.lock().await;
        if inner.queue_depth() >= max_depth {
            return Ok(None);
        }
        check_enqueueable(&inner, &thought)?;
        let next = patch.apply(&inner.state.agent)?;

        let saved_state = inner.state.clone();
        push_thought(&mut inner, thought);
        inner.state.agent = next.clone();

        if let Err(e) = self.persist(&inner, Dirty::BOTH).await {
            if let Some(t) = inner.thoughts.pop() {
                inner.ids.remove(&t.id);
            }
            inner.state = saved_state;
            self.repair(&inner, Dirty::BOTH).await;
            return Err(e);
        }
        Ok(Some(next))
    }

    /// Oldest unexecuted thought by `created_at`, ties by insertion order.
    pub async fn next_pending(&self) -> Option<Thought> {
        let inner = self.inner.lock().await;
        inner.pending().min_by_key(|t| t.created_at).cloned()
    }

    pub async fn mark_executed(&self, id: &str, result: ThoughtResult) -> Result<Thought> {
        self.complete(id, result, None).await
    }

    /// Mark executed and, on success, push the artifact into the ring in
    /// the same step.
    pub async fn complete(
        &self,
        id: &str,
        result: ThoughtResult,
        artifact: Option<ArtifactRecord>,
    ) -> Result<Thought> {
        let mut inner = self.inner.lock().await;
        let idx = inner
            .thoughts
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::ThoughtNotFound(id.to_string()))?;
        if inner.thoughts[idx].executed {
            return Err(Error::AlreadyExecuted(id.to_string()));
        }

        let saved_thought = inner.thoughts[idx].clone();
        let saved_state = inner.state.clone();
        {
            let t = &mut inner.thoughts[idx];
            t.executed = true;
            t.executed_at = Some(Utc::now());
            t.result = Some(result);
        }
        let dirty = match artifact {
            Some(record) => {
                inner.state.log_artifact(record);
                Dirty::BOTH
            }
            None => Dirty::THOUGHTS,
        };

        if let Err(e) = self.persist(&inner, dirty).await {
            inner.thoughts[idx] = saved_thought;
            inner.state = saved_state;
            self.repair(&inner, dirty).await;
            return Err(e);
        }
        debug!(thought_id = %id, "thought marked executed");
        Ok(inner.thoughts[idx].clone())
    }

    pub async fn thought(&self, id: &str) -> Option<Thought> {
        let inner = self.inner.lock().await;
        inner.thoughts.iter().find(|t| t.id == id).cloned()
    }

    /// Every thought in insertion order.
    pub async fn thoughts(&self) -> Vec<Thought> {
        self.inner.lock().await.thoughts.clone()
    }

    pub async fn queue_depth(&self) -> usize {
        self.inner.lock().await.queue_depth()
    }

    // -----------------------------------------------------------------------
    // Agent state
    // -----------------------------------------------------------------------

    pub async fn agent_state(&self) -> AgentState {
        self.inner.lock().await.state.agent.clone()
    }

    pub async fn update_agent_state(&self, patch: &AgentStatePatch) -> Result<AgentState> {
        let mut inner = self.inner.lock().await;
        let next = patch.apply(&inner.state.agent)?;
        let saved = std::mem::replace(&mut inner.state.agent, next.clone());

        if let Err(e) = self.persist(&inner, Dirty::STATE).await {
            inner.state.agent = saved;
            self.repair(&inner, Dirty::STATE).await;
            return Err(e);
        }
        Ok(next)
    }

    /// Up to `n` most recent thought contents, newest last.
    pub async fn recent_thoughts(&self, n: usize) -> Vec<String> {
        let inner = self.inner.lock().await;
        let log = &inner.state.thought_log;
        log.iter().skip(log.len().saturating_sub(n)).cloned().collect()
    }

    pub async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock().await;
        Snapshot {
            agent_state: inner.state.agent.clone(),
            recent_thoughts: inner.state.thought_log.iter().cloned().collect(),
            recent_artifacts: inner.state.artifact_log.iter().cloned().collect(),
            queue_depth: inner.queue_depth(),
            total_thoughts: inner.thoughts.len(),
        }
    }

    /// Rewrite both files from memory.
    pub async fn flush(&self) -> Result<()> {
        let inner = self.inner.lock().await;
        self.persist(&inner, Dirty::BOTH).await?;
        debug!("store flushed");
        Ok(())
    }

    pub fn thoughts_path(&self) -> &Path {
        &self.thoughts_path
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    async fn persist(&self, inner: &Inner, dirty: Dirty) -> Result<()> {
        if dirty.thoughts {
            let json = serde_json::to_vec_pretty(&inner.thoughts)?;
            write_atomic(&self.thoughts_path, &json).await?;
        }
        if dirty.state {
            let json = serde_json::to_vec_pretty(&inner.state)?;
            write_atomic(&self.state_path, &json).await?;
        }
        Ok(())
    }

    /// After a rollback, try to bring disk back in line with memory. One
    /// file may already hold the rolled-back mutation.
    async fn repair(&self, inner: &Inner, dirty: Dirty) {
        if let Err(e) = self.persist(inner, dirty).await {
            warn!("store repair after failed write also failed: {}", e);
        }
    }
}

fn check_enqueueable(inner: &Inner, thought: &Thought) -> Result<()> {
    if thought.kind == ThoughtKind::FreeForm {
        return Err(Error::NotEnqueueable(thought.kind.clone()));
    }
    if inner.ids.contains(&thought.id) {
        return Err(Error::DuplicateThought(thought.id.clone()));
    }
    Ok(())
}

fn push_thought(inner: &mut Inner, thought: Thought) {
    inner.state.log_thought(&thought.content);
    inner.ids.insert(thought.id.clone());
    inner.thoughts.push(thought);
}

fn validate_thoughts(thoughts: &[Thought]) -> std::result::Result<(), String> {
    let mut seen = HashSet::new();
    for t in thoughts {
        if !seen.insert(t.id.as_str()) {
            return Err(format!("duplicate thought id {}", t.id));
        }
    }
    Ok(())
}

/// Load `path`, returning the value and whether it was freshly initialized.
async fn load_or_fresh<T>(
    path: &Path,
    check: impl Fn(&T) -> std::result::Result<(), String>,
) -> Result<(T, bool)>
where
    T: DeserializeOwned + Default,
{
    let bytes = match fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("{} not found, initializing", path.display());
            return Ok((T::default(), true));
        }
        Err(e) => return Err(Error::store_io(path, e)),
    };

    let reason = match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => match check(&value) {
            Ok(()) => return Ok((value, false)),
            Err(reason) => reason,
        },
        Err(e) => e.to_string(),
    };

    let moved_to = corrupt_path(path);
    fs::rename(path, &moved_to)
        .await
        .map_err(|e| Error::store_io(path, e))?;
    warn!(
        path = %path.display(),
        moved_to = %moved_to.display(),
        "store_corrupt: {}; starting fresh",
        reason
    );
    Ok((T::default(), true))
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ")));
    path.with_file_name(name)
}

/// Serialize to a sibling temp file, fsync, rename over.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let io = |e| Error::store_io(path, e);
    let mut file = fs::File::create(&tmp).await.map_err(io)?;
    file.write_all(bytes).await.map_err(io)?;
    file.sync_all().await.map_err(io)?;
    drop(file);
    fs::rename(&tmp, path).await.map_err(io)?;
    Ok(())
}
