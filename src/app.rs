//! Process-level operations behind the CLI subcommands

use aether_agent::{Runtime, Store};
use aether_core::{
    AetherConfig, ArtifactParams, Error, Result, Snapshot, Thought, ThoughtKind, ThoughtSource,
};
use aether_gateway::{serve, DashboardState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Configuration error on startup.
pub const EXIT_CONFIG: u8 = 1;
/// Unrecoverable store error at runtime.
pub const EXIT_STORE: u8 = 2;

pub fn exit_code(error: &Error) -> u8 {
    match error {
        Error::ConfigError(_) => EXIT_CONFIG,
        _ => EXIT_STORE,
    }
}

/// Run the agent until `shutdown` fires or the runtime stops on a fatal
/// store error. The dashboard, when enabled, shares the same token.
pub async fn run(config: &AetherConfig, shutdown: CancellationToken) -> Result<()> {
    info!(
        workspace = %config.workspace_root.display(),
        llm = config.llm.endpoint.is_some(),
        notifier = config.notifier.webhook.is_some(),
        "{} waking up",
        config.name
    );

    let runtime = Runtime::from_config(config).await?;

    let dashboard = match config.dashboard.bind.as_deref() {
        Some(addr) => {
            let listener = TcpListener::bind(addr).await.map_err(|e| {
                Error::config(format!("cannot bind dashboard to {}: {}", addr, e))
            })?;
            let state = DashboardState::new(runtime.store(), runtime.llm(), runtime.events())
                .with_name(&config.name)
                .with_shutdown(shutdown.clone());
            Some(tokio::spawn(async move {
                if let Err(e) = serve(listener, Arc::new(state)).await {
                    error!("dashboard failed: {}", e);
                }
            }))
        }
        None => {
            info!("dashboard disabled");
            None
        }
    };

    let result = runtime.run(shutdown.clone()).await;
    shutdown.cancel();
    if let Some(handle) = dashboard {
        let _ = handle.await;
    }
    result
}

/// Append a `source=seed` thought to the persisted queue. Meant for a
/// stopped agent: a running process keeps its own copy of the queue.
pub async fn seed(
    config: &AetherConfig,
    kind: ThoughtKind,
    params: ArtifactParams,
) -> Result<Thought> {
    if !kind.is_artifact() {
        return Err(Error::NotEnqueueable(kind));
    }
    let store = Store::open(config.state_dir()).await?;
    let content = match params.name.as_deref() {
        Some(name) => format!("Seeded {} {}", kind, name),
        None => format!("Seeded {}", kind),
    };
    let thought = Thought::new(kind, params, content, ThoughtSource::Seed);
    store.append_thought(thought.clone()).await?;
    info!(thought_id = %thought.id, kind = %thought.kind, "seed thought appended");
    Ok(thought)
}

/// The persisted snapshot, as a freshly started agent would see it.
pub async fn snapshot(config: &AetherConfig) -> Result<Snapshot> {
    let store = Store::open(config.state_dir()).await?;
    Ok(store.snapshot().await)
}
