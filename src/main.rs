mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lodgesync_cli::{config, db};
use tracing::info;

#[derive(Parser)]
#[command(name = "lodgesync")]
#[command(about = "Reconcile external booking calendars into a reviewable staging queue")]
struct Cli {
    /// Path to TOML config file
    #[arg(long, default_value = "lodgesync.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and reconcile the configured apartment feeds
    Sync {
        /// Only sync this apartment (by id)
        #[arg(short, long)]
        apartment: Option<i64>,
    },
    /// Show recent sync activity
    Status {
        /// Number of log entries to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// List staged reservations awaiting review
    Pending {
        /// Only show this apartment (by id)
        #[arg(short, long)]
        apartment: Option<i64>,
    },
    /// List sync alerts
    Alerts {
        /// Only unread alerts
        #[arg(long)]
        unread: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let cfg = config::load(Some(&cli.config))?;

    info!(apartments = cfg.apartments.len(), "configuration loaded");

    let pool = db::init_pool(&cfg.store.database_url).await?;
    db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Sync { apartment } => commands::sync::run(pool, &cfg, apartment).await,
        Commands::Status { limit } => commands::status::run(pool, limit).await,
        Commands::Pending { apartment } => commands::pending::run(pool, apartment).await,
        Commands::Alerts { unread } => commands::alerts::run(pool, unread).await,
    }
}
