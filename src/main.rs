//! Aether: autonomous agent with a thought-to-artifact loop

use aether::{app, logging};
use aether_core::{AetherConfig, ArtifactParams, ThoughtKind};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "aether",
    version,
    about = "Aether autonomous agent: thinks, then builds agents, rooms and tools"
)]
struct Cli {
    /// Workspace directory (overrides WORKSPACE_ROOT)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cognition and execution loops with the dashboard (default)
    Run,
    /// Append a thought to the queue of a stopped agent
    Seed {
        #[arg(long, value_enum)]
        kind: SeedKind,
        #[arg(long)]
        name: String,
        #[arg(long)]
        purpose: Option<String>,
        #[arg(long)]
        theme: Option<String>,
    },
    /// Print the persisted snapshot as JSON
    Snapshot,
    /// Print the effective configuration as JSON
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeedKind {
    Agent,
    Room,
    Tool,
}

impl From<SeedKind> for ThoughtKind {
    fn from(kind: SeedKind) -> Self {
        match kind {
            SeedKind::Agent => ThoughtKind::CreateAgent,
            SeedKind::Room => ThoughtKind::CreateRoom,
            SeedKind::Tool => ThoughtKind::CreateTool,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AetherConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("aether: {}", e);
            return ExitCode::from(app::EXIT_CONFIG);
        }
    };
    if let Some(workspace) = cli.workspace {
        config.workspace_root = workspace;
    }

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let _guard = logging::init(&config.logs_dir());
            let shutdown = CancellationToken::new();
            let on_signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, shutting down");
                    on_signal.cancel();
                }
            });
            let result = app::run(&config, shutdown).await;
            if let Err(e) = &result {
                error!(code = e.code(), "aether stopped: {}", e);
            }
            result
        }
        Commands::Seed {
            kind,
            name,
            purpose,
            theme,
        } => {
            logging::init_stderr();
            let mut params = ArtifactParams::named(name);
            params.purpose = purpose;
            params.theme = theme;
            app::seed(&config, kind.into(), params)
                .await
                .map(|thought| println!("{}", thought.id))
        }
        Commands::Snapshot => {
            logging::init_stderr();
            app::snapshot(&config).await.and_then(|snap| {
                println!("{}", serde_json::to_string_pretty(&snap)?);
                Ok(())
            })
        }
        Commands::Config => serde_json::to_string_pretty(&config)
            .map(|json| println!("{}", json))
            .map_err(Into::into),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("aether: {}", e);
            ExitCode::from(app::exit_code(&e))
        }
    }
}
