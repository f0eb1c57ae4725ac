//! # Stockpilot Server
//!
//! `stockpilot serve` runs the REST API / function endpoints and the
//! presence gateway in one process. `stockpilot run-job <job>` runs a
//! scheduled job once and exits, for system cron or a container scheduler.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;
use stockpilot_api::{AppState, build_router, email::ContactMailer};
use stockpilot_common::config::AppConfig;
use stockpilot_db::{
    Database,
    storage::{StorageClient, StorageConfig as DbStorageConfig},
};
use stockpilot_gateway::GatewayState;
use stockpilot_jobs::{cleanup, credit_reset};
use stockpilot_media::Preprocessor;

const PRESENCE_SWEEP_EVERY: Duration = Duration::from_secs(60);
/// Three missed heartbeats and a presence session is dropped.
const PRESENCE_MAX_IDLE: Duration =
    Duration::from_millis(stockpilot_gateway::HEARTBEAT_INTERVAL_MS * 3);

#[derive(Parser)]
#[command(name = "stockpilot", version, about = "Stockpilot backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and the presence gateway (default)
    Serve,
    /// Run one scheduled job and exit
    RunJob {
        #[arg(value_enum)]
        job: Job,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Job {
    /// Delete generations older than the retention window
    Cleanup,
    /// Reset balances of subscriptions on daily-reset plans
    CreditReset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = stockpilot_common::config::init().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockpilot=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::RunJob { job } => run_job(config, job).await,
    }
}

fn storage_client(config: &AppConfig) -> anyhow::Result<StorageClient> {
    StorageClient::new(&DbStorageConfig::from(&config.storage))
        .context("Failed to create object storage client")
}

async fn serve(config: &'static AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Stockpilot v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::connect(config).await?;
    db.migrate().await?;

    let storage = storage_client(config)?;
    storage.ensure_bucket().await?;
    tracing::info!(bucket = %config.storage.bucket, "Object storage ready");

    let mailer = ContactMailer::from_config(&config.email)
        .context("Invalid email configuration")?;
    if mailer.is_none() {
        tracing::warn!("SMTP not configured, contact form is disabled");
    }

    // === REST API + function endpoints ===
    let api_router = build_router(AppState {
        db,
        storage,
        mailer,
        preprocessor: Preprocessor::from_config(&config.media),
    });
    let api_addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    // === Presence gateway ===
    let gateway_state = GatewayState::new();
    let sweeper_state = gateway_state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(PRESENCE_SWEEP_EVERY);
        loop {
            tick.tick().await;
            sweeper_state.sweep_stale(PRESENCE_MAX_IDLE).await;
        }
    });
    let gateway_router = stockpilot_gateway::build_router(gateway_state);
    let gateway_addr = SocketAddr::new(config.server.host.parse()?, config.server.gateway_port);

    tracing::info!("REST API listening on http://{api_addr}");
    tracing::info!("Presence gateway listening on ws://{gateway_addr}/presence");

    tokio::try_join!(
        async {
            let listener = tokio::net::TcpListener::bind(api_addr).await?;
            axum::serve(listener, api_router).await?;
            Ok::<_, anyhow::Error>(())
        },
        async {
            let listener = tokio::net::TcpListener::bind(gateway_addr).await?;
            axum::serve(listener, gateway_router).await?;
            Ok::<_, anyhow::Error>(())
        },
    )?;

    Ok(())
}

async fn run_job(config: &'static AppConfig, job: Job) -> anyhow::Result<()> {
    let db = Database::connect(config).await?;

    let output = match job {
        Job::Cleanup => {
            let storage = storage_client(config)?;
            let report = cleanup::run(
                &db,
                &storage,
                chrono::Utc::now(),
                chrono::Duration::days(config.jobs.retention_days),
            )
            .await?;
            serde_json::json!({ "message": report.message(), "report": report })
        }
        Job::CreditReset => {
            let report = credit_reset::run(&db).await?;
            serde_json::json!({ "message": report.message(), "report": report })
        }
    };

    println!("{output}");
    Ok(())
}
