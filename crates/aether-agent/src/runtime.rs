//! Runtime - build the agent from configuration and run both loops
//!
//! Cognition and execution run as independent tasks on their own
//! intervals. Both stop at the next suspension point once the cancellation
//! token fires; the store is flushed afterwards.

use crate::cognition::{Cognition, TickOutcome};
use crate::executor::{ExecutionOutcome, Executor};
use crate::notifier::{Notifier, WebhookNotifier};
use crate::store::Store;
use aether_artifacts::Templater;
use aether_core::{AetherConfig, Error, LiveEvent, Result};
use aether_llm::LlmGateway;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Live events buffered per subscriber before it starts lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct Runtime {
    store: Arc<Store>,
    llm: Arc<LlmGateway>,
    events: broadcast::Sender<LiveEvent>,
    cognition: Arc<Cognition>,
    executor: Arc<Executor>,
    cognition_interval: Duration,
    execution_interval: Duration,
}

impl Runtime {
    /// Open the store and wire every component from `config`.
    pub async fn from_config(config: &AetherConfig) -> Result<Self> {
        let store = Arc::new(Store::open(config.state_dir()).await?);
        let llm = Arc::new(LlmGateway::from_settings(&config.llm));
        let notifier: Arc<dyn Notifier> =
            Arc::new(WebhookNotifier::from_settings(&config.notifier, &config.name));
        if config.notifier.webhook.is_none() {
            info!("NOTIFIER_WEBHOOK not set; notifications disabled");
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cognition = Cognition::new(
            store.clone(),
            llm.clone(),
            events.clone(),
            config.queue.clone(),
        )
        .with_name(&config.name);
        let executor = Executor::new(
            store.clone(),
            Templater::new(&config.name),
            &config.workspace_root,
            notifier,
            events.clone(),
        );

        Ok(Self {
            store,
            llm,
            events,
            cognition: Arc::new(cognition),
            executor: Arc::new(executor),
            cognition_interval: config.cognition_interval(),
            execution_interval: config.execution_interval(),
        })
    }

    /// Assemble from prebuilt parts.
    pub fn from_parts(
        store: Arc<Store>,
        llm: Arc<LlmGateway>,
        events: broadcast::Sender<LiveEvent>,
        cognition: Cognition,
        executor: Executor,
    ) -> Self {
        Self {
            store,
            llm,
            events,
            cognition: Arc::new(cognition),
            executor: Arc::new(executor),
            cognition_interval: Duration::from_secs(7),
            execution_interval: Duration::from_secs(5),
        }
    }

    pub fn with_intervals(mut self, cognition: Duration, execution: Duration) -> Self {
        self.cognition_interval = cognition;
        self.execution_interval = execution;
        self
    }

    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    pub fn llm(&self) -> Arc<LlmGateway> {
        self.llm.clone()
    }

    pub fn events(&self) -> broadcast::Sender<LiveEvent> {
        self.events.clone()
    }

    pub fn cognition(&self) -> Arc<Cognition> {
        self.cognition.clone()
    }

    pub fn executor(&self) -> Arc<Executor> {
        self.executor.clone()
    }

    /// Run both loops until `cancel` fires or the execution loop hits an
    /// unrecoverable store error. In the latter case `cancel` is triggered
    /// for every other task sharing it and the error is returned.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        info!(
            "runtime started: cognition every {:?}, execution every {:?}",
            self.cognition_interval, self.execution_interval
        );

        let cognition = tokio::spawn(cognition_loop(
            self.cognition.clone(),
            self.cognition_interval,
            cancel.clone(),
        ));
        let execution = tokio::spawn(execution_loop(
            self.executor.clone(),
            self.execution_interval,
            cancel.clone(),
        ));

        let execution_result = match execution.await {
            Ok(result) => result,
            Err(e) => {
                error!("execution loop panicked: {}", e);
                cancel.cancel();
                Ok(())
            }
        };
        if execution_result.is_err() {
            cancel.cancel();
        }
        if let Err(e) = cognition.await {
            error!("cognition loop panicked: {}", e);
        }

        if let Err(e) = self.store.flush().await {
            error!("store flush on shutdown failed: {}", e);
            execution_result?;
            return Err(e);
        }
        info!("runtime stopped");
        execution_result
    }
}

async fn cognition_loop(cognition: Arc<Cognition>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        match cognition.tick_until(&cancel).await {
            Ok(TickOutcome::Enqueued { .. }) => {}
            Ok(TickOutcome::Cancelled) => break,
            Ok(TickOutcome::Paused { queue_depth }) => {
                debug!(queue_depth, "cognition tick skipped");
            }
            Err(e) => warn!(code = e.code(), "cognition tick failed: {}", e),
        }
    }
    debug!("cognition loop stopped");
}

async fn execution_loop(
    executor: Arc<Executor>,
    period: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        // Never abandoned midway: an artifact on disk must be recorded.
        match executor.tick().await {
            Ok(ExecutionOutcome::Idle) => {}
            Ok(ExecutionOutcome::Executed(thought)) => {
                debug!(thought_id = %thought.id, "execution tick done");
            }
            Err(e) if is_fatal(&e) => {
                error!(code = e.code(), "unrecoverable store error in execution loop: {}", e);
                return Err(e);
            }
            Err(e) => warn!(code = e.code(), "execution tick failed: {}", e),
        }
    }
    debug!("execution loop stopped");
    Ok(())
}

/// A thought whose artifact exists but could not be marked executed would
/// run again after restart, so store write failures stop the process.
fn is_fatal(e: &Error) -> bool {
    e.is_store_io() || matches!(e, Error::JsonError(_))
}
