//! Execution loop - turn the oldest pending thought into an artifact
//!
//! Each thought is attempted exactly once. Template or write failures are
//! recorded on the thought and never retried. Only store errors escape
//! `tick`.

use crate::notifier::{Notifier, NotifyOutcome};
use crate::store::Store;
use aether_artifacts::{ArtifactError, ArtifactWriter, RenderedArtifact, Templater};
use aether_core::{ArtifactRecord, LiveEvent, Result, Thought, ThoughtResult};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Queue was empty.
    Idle,
    /// The thought as stored after execution.
    Executed(Thought),
}

pub struct Executor {
    store: Arc<Store>,
    templater: Templater,
    writer: ArtifactWriter,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<LiveEvent>,
    workspace_root: PathBuf,
}

impl Executor {
    pub fn new(
        store: Arc<Store>,
        templater: Templater,
        workspace_root: impl AsRef<Path>,
        notifier: Arc<dyn Notifier>,
        events: broadcast::Sender<LiveEvent>,
    ) -> Self {
        let root = workspace_root.as_ref();
        let workspace_root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let writer = ArtifactWriter::new(aether_core::config::artifacts_dir(&workspace_root));
        Self {
            store,
            templater,
            writer,
            notifier,
            events,
            workspace_root,
        }
    }

    pub fn with_writer(mut self, writer: ArtifactWriter) -> Self {
        self.writer = writer;
        self
    }

    pub async fn tick(&self) -> Result<ExecutionOutcome> {
        let Some(thought) = self.store.next_pending().await else {
            return Ok(ExecutionOutcome::Idle);
        };
        debug!(thought_id = %thought.id, kind = %thought.kind, "executing thought");

        let (result, record) = match self
            .templater
            .render(&thought, |rel| self.writer.exists(rel))
        {
            Ok(rendered) => self.materialize(&thought, &rendered).await,
            Err(e) => {
                warn!(thought_id = %thought.id, kind = %thought.kind, "{}", e);
                (ThoughtResult::failure(e.code()), None)
            }
        };

        let executed = self.store.complete(&thought.id, result, record).await?;
        self.announce(&executed).await;
        Ok(ExecutionOutcome::Executed(executed))
    }

    async fn materialize(
        &self,
        thought: &Thought,
        rendered: &RenderedArtifact,
    ) -> (ThoughtResult, Option<ArtifactRecord>) {
        match self.writer.write(rendered).await {
            Ok(written) => {
                let files: Vec<String> = written.files.iter().map(|p| self.relative(p)).collect();
                info!(
                    thought_id = %thought.id,
                    kind = %thought.kind,
                    name = %written.name,
                    files = files.len(),
                    "artifact created"
                );
                let record = ArtifactRecord {
                    thought_id: thought.id.clone(),
                    kind: thought.kind.clone(),
                    name: written.name,
                    files: files.clone(),
                    created_at: Utc::now(),
                };
                (ThoughtResult::success(files), Some(record))
            }
            Err(failure) => {
                warn!(
                    thought_id = %thought.id,
                    kind = %thought.kind,
                    rolled_back = failure.rolled_back.len(),
                    "artifact_write_failed: {}",
                    failure.error
                );
                (ThoughtResult::failure(describe(&failure.error)), None)
            }
        }
    }

    async fn announce(&self, thought: &Thought) {
        let result = thought
            .result
            .clone()
            .unwrap_or_else(|| ThoughtResult::failure("missing result"));

        let (title, body) = if result.success {
            (
                format!("Created {}", thought.kind),
                format!("{}\n\n{}", thought.content, result.files.join("\n")),
            )
        } else {
            (
                format!("Failed {}", thought.kind),
                format!(
                    "{}\n\nerror: {}",
                    thought.content,
                    result.error.as_deref().unwrap_or("unknown")
                ),
            )
        };

        let outcome = self.notifier.notify(&title, body.trim()).await;
        if outcome != NotifyOutcome::Sent {
            debug!(thought_id = %thought.id, ?outcome, "notification not delivered");
        }

        let _ = self.events.send(LiveEvent::ThoughtExecuted {
            thought_id: thought.id.clone(),
            kind: thought.kind.clone(),
            success: result.success,
            files: result.files,
            error: result.error,
        });
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.workspace_root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

fn describe(error: &ArtifactError) -> String {
    format!("{}: {}", error.code(), error)
}
