//! `proxwatch` -- location ingestion, relay and proximity alerting.
//!
//! Configuration comes from the environment (see [`WorkerConfig::from_env`]);
//! a `.env` file in the working directory is loaded first.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use proxwatch_worker::config::WorkerConfig;
use proxwatch_worker::cycle::run_cycle;
use proxwatch_worker::engine::{forward, ingest};
use proxwatch_worker::shutdown::ShutdownSignal;
use proxwatch_worker::{EngineContext, Scheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "proxwatch", version, about = "Location relay and proximity alerts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the location source once and store new samples.
    Update,
    /// Forward every pending sample to the relay.
    Upload,
    /// Run one full cycle.
    Cycle,
    /// Run the cycle on a fixed interval until interrupted.
    Run {
        /// Seconds between cycle starts (defaults to POLL_INTERVAL_SECS).
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxwatch_worker=info,proxwatch_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = WorkerConfig::from_env().context("invalid configuration")?;

    let pool = proxwatch_db::create_pool(&config.database_url)
        .await
        .context("failed to open database")?;
    proxwatch_db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    proxwatch_db::health_check(&pool)
        .await
        .context("database health check failed")?;

    tracing::info!(database_url = %config.database_url, "Database ready");

    let ctx = EngineContext::from_config(pool, &config)?;

    match cli.command {
        Command::Update => {
            let summary = ingest::ingest(&ctx).await?;
            println!(
                "{} observations polled, {} new samples stored.",
                summary.polled, summary.inserted
            );
        }
        Command::Upload => {
            let summary = forward::upload(&ctx).await?;
            println!("{} entries processed for upload.", summary.pending);
        }
        Command::Cycle => {
            run_cycle(&ctx).await?;
        }
        Command::Run { interval_secs } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.poll_interval);
            anyhow::ensure!(!interval.is_zero(), "interval must be greater than zero");
            run_forever(ctx, interval).await?;
        }
    }

    Ok(())
}

async fn run_forever(ctx: EngineContext, interval: Duration) -> anyhow::Result<()> {
    let signal = ShutdownSignal::install().context("failed to install signal handlers")?;
    let scheduler = Scheduler::new();
    let handle = scheduler.start(interval, move || {
        let ctx = ctx.clone();
        async move { run_cycle(&ctx).await.map(|_| ()) }
    })?;

    signal.recv().await.context("failed to wait for shutdown signal")?;
    scheduler.stop();
    handle.await.context("scheduler task failed")?;

    tracing::info!("Shutdown complete");
    Ok(())
}
