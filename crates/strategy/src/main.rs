use std::path::PathBuf;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use leverage_strategy::config;
use leverage_strategy::keeper::Keeper;
use leverage_strategy::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let config_dir = std::env::var("STRATEGY_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        config_dir = %config_dir.display(),
        flash_loans_active = config.strategy.loop_policy.flash_loans_active,
        interval_seconds = config.keeper.interval_seconds,
        "configuration loaded"
    );

    let shutdown = CancellationToken::new();
    let mut keeper = Keeper::from_config(&config, shutdown.clone())?;

    let done = shutdown.clone();
    let keeper_handle = tokio::spawn(async move {
        match keeper.run().await {
            Ok(ticks) => info!(ticks, "keeper finished"),
            Err(e) => error!(error = %e, "keeper exited with error"),
        }
        // A tick limit ends the run without Ctrl+C.
        done.cancel();
    });

    info!("keeper running, press Ctrl+C to shutdown");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "failed to listen for Ctrl+C");
            }
            info!("shutdown signal received, stopping gracefully");
            shutdown.cancel();
        }
        () = shutdown.cancelled() => {}
    }

    if let Err(e) = keeper_handle.await {
        error!(error = %e, "keeper task panicked");
    }

    info!("shutdown complete");
    Ok(())
}
