//! State construction for the refresh daemon.
//!
//! Everything is built explicitly here at process start and torn down at
//! shutdown; there is no module-level mutable state anywhere in the engine.
//! The daemon runs the proactive scheduler only; on-demand reads belong to
//! the API process, which builds a `CacheAccessor` over the same store.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use alphastream_core::{
    CacheStore, Clock, RefreshOrchestrator, RefreshPlan, RefreshScheduler, SourceClient,
    SystemClock,
};
use alphastream_market_data::{
    CategoryRouting, FinnhubProvider, FmpProvider, FredProvider, SourceAdapter,
};
use alphastream_storage_sqlite::{create_pool, run_migrations, spawn_writer, CacheRepository};

use crate::config::Config;

/// Shared daemon state.
pub struct AppState {
    pub scheduler: Arc<RefreshScheduler>,
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Build the full engine: pool, migrations, writer, repository, adapters,
/// chain, orchestrator, scheduler.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let pool = create_pool(&config.database_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer(pool.clone());

    let store: Arc<dyn CacheStore> = Arc::new(CacheRepository::new(pool, writer));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut adapters: Vec<Arc<dyn SourceAdapter>> =
        vec![Arc::new(FmpProvider::new(config.fmp_api_key.clone()))];

    match &config.finnhub_api_key {
        Some(key) => adapters.push(Arc::new(FinnhubProvider::new(key.clone()))),
        None => warn!("FINNHUB_API_KEY not set, Finnhub fallback disabled"),
    }
    match &config.fred_api_key {
        Some(key) => adapters.push(Arc::new(FredProvider::new(key.clone()))),
        None => warn!("FRED_API_KEY not set, macro indicators disabled"),
    }
    info!("{} source adapters registered", adapters.len());

    let resolver = Arc::new(SourceClient::new(adapters, CategoryRouting::defaults()));
    let orchestrator = Arc::new(RefreshOrchestrator::new(
        store.clone(),
        resolver,
        clock.clone(),
    ));

    let plan = RefreshPlan::standard(&config.watchlist);
    let scheduler = Arc::new(RefreshScheduler::new(orchestrator, store, clock, plan));

    Ok(AppState { scheduler })
}
