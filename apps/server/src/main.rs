mod config;
mod main_lib;

use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Configuration errors are fatal here, before any data path exists.
    let config = Config::from_env()?;
    let state = build_state(&config).await?;

    let scheduler_handle = state.scheduler.clone().start();
    tracing::info!(
        "refresh daemon started, watchlist of {} symbols",
        config.watchlist.len()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    scheduler_handle.abort();

    Ok(())
}
