//! Host for a delegation dashboard session

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dnp_delegations::export::Snapshot;
use dnp_delegations::models::Role;
use dnp_delegations::{DashboardSession, SessionConfig};

#[derive(Parser)]
#[command(name = "dnp-delegations")]
#[command(about = "Delegation request dashboard core")]
#[command(version)]
struct Cli {
    /// JSON file with session settings
    #[arg(short, long, env = "DNP_CONFIG")]
    config: Option<PathBuf>,

    /// Name recorded as requester on new requests
    #[arg(long, env = "DNP_USER")]
    user: Option<String>,

    /// Session role (Admin or User)
    #[arg(long, env = "DNP_ROLE")]
    role: Option<Role>,

    /// Seconds between overdue sweeps
    #[arg(long, env = "DNP_SWEEP_SECS")]
    sweep_secs: Option<u64>,

    /// Directory that receives exported snapshots
    #[arg(long, env = "DNP_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// Restore state from a previous export instead of the built-in seed
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session with the overdue sweep until interrupted
    Run {
        /// Write a snapshot when shutting down
        #[arg(long)]
        export_on_exit: bool,
    },

    /// Print dashboard statistics and risk as JSON
    Stats,

    /// Write a snapshot file and print its path
    Export,
}

impl Cli {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SessionConfig::default(),
        };

        if let Some(user) = &self.user {
            config.user_name = user.clone();
        }
        if let Some(role) = self.role {
            config.role = role;
        }
        if let Some(secs) = self.sweep_secs {
            config.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = dir.clone();
        }

        Ok(config)
    }

    fn session(&self) -> Result<DashboardSession> {
        let config = self.session_config()?;
        match &self.snapshot {
            Some(path) => {
                let snapshot = Snapshot::read_from(path)
                    .with_context(|| format!("loading snapshot {}", path.display()))?;
                Ok(DashboardSession::from_snapshot(config, snapshot)?)
            }
            None => Ok(DashboardSession::new(config)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dnp_delegations=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let session = cli.session()?;

    match cli.command {
        Commands::Run { export_on_exit } => run(session, export_on_exit).await,
        Commands::Stats => print_stats(&session).await,
        Commands::Export => {
            let path = session.export().await?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn run(session: DashboardSession, export_on_exit: bool) -> Result<()> {
    let mut events = session.subscribe();
    let sweep = session.start_overdue_sweep();

    let stats = session.stats().await;
    tracing::info!(
        total = stats.total_requests,
        pending = stats.pending,
        approved = stats.approved,
        overdue = stats.overdue,
        active_instances = stats.active_instances,
        "Dashboard ready"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    let notification = event.notification();
                    println!("{}", serde_json::to_string(&notification)?);
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Dropped {} notifications", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    sweep.stop().await;

    if export_on_exit {
        let path = session.export().await?;
        tracing::info!("Snapshot written to {}", path.display());
    }

    Ok(())
}

async fn print_stats(session: &DashboardSession) -> Result<()> {
    let report = serde_json::json!({
        "stats": session.stats().await,
        "risk": session.risk().await,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
