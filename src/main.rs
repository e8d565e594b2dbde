use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ancient_war::config::GameConfig;
use ancient_war::game::Game;
use ancient_war::model::SystemClock;
use ancient_war::sim::spawn_ai_scheduler;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless ancient-war game server", long_about = None)]
struct Args {
    /// TOML config file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the AI tick interval, in seconds
    #[arg(long)]
    tick_secs: Option<u64>,

    /// Override the snapshot directory written on shutdown
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<GameConfig, String> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path).map_err(|e| e.to_string())?,
        None => GameConfig::default(),
    };
    if let Some(secs) = args.tick_secs {
        config.scheduler.tick_interval_secs = secs;
    }
    if let Some(dir) = &args.snapshot_dir {
        config.storage.snapshot_dir = Some(dir.clone());
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ancient_war=info")),
        )
        .init();

    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "bad configuration");
            return ExitCode::FAILURE;
        }
    };

    let game = match Game::open(&config, Arc::new(SystemClock)).await {
        Ok(game) => Arc::new(game),
        Err(e) => {
            error!(error = %e, "cannot open the game store");
            return ExitCode::FAILURE;
        }
    };
    info!(durable = game.store().is_durable(), "game ready");

    let (stop_tx, stop_rx) = watch::channel(false);
    let scheduler = spawn_ai_scheduler(game.clone(), config.scheduler.tick_interval(), stop_rx);

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for shutdown signal");
    }
    info!("shutting down");
    let _ = stop_tx.send(true);
    if let Err(e) = scheduler.await {
        error!(error = %e, "scheduler task panicked");
    }

    if let Some(dir) = &config.storage.snapshot_dir {
        match game.export_snapshot(dir).await {
            Ok(()) => info!(dir = %dir.display(), "snapshot written"),
            Err(e) => error!(error = %e, "snapshot failed"),
        }
    }
    ExitCode::SUCCESS
}
