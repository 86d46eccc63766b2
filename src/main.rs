mod analyzer;
mod collector;
mod config;
mod model;
mod provider;
mod scheduler;
mod storage;
mod utils;

use analyzer::{CorrelationAnalyzer, CorrelationPolicy};
use collector::{NewsCollector, PriceCollector};
use config::{config_path, load_config, AppConfig};
use provider::{MarketDataProvider, YahooProvider};
use scheduler::Scheduler;
use storage::SqliteStorage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "stock_tracker=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log any panic before the process dies
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {}", panic_info);
    }));

    // Load configuration from file
    let path = config_path();
    let config: Arc<AppConfig> = match load_config(&path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error ({}): {}", path, e);
            return;
        }
    };

    // Open storage and create tables if absent
    let storage = match SqliteStorage::new(&config.database_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };
    match storage.seed_companies(&config.companies) {
        Ok(inserted) => info!(
            "Tables ready in {}, {} new companies seeded",
            config.database_path, inserted
        ),
        Err(e) => {
            error!("Failed to seed companies: {}", e);
            return;
        }
    }
    let storage = Arc::new(Mutex::new(storage));

    let provider: Arc<dyn MarketDataProvider> = match YahooProvider::new(&config.provider) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!("Failed to build data provider client: {}", e);
            return;
        }
    };

    info!("Adding jobs to scheduler...");
    let mut scheduler = Scheduler::new(
        storage.clone(),
        Duration::from_secs(config.check_interval_seconds),
    );
    scheduler.register(PriceCollector::new(
        provider.clone(),
        config.max_concurrent_fetches,
    ));
    scheduler.register(NewsCollector::new(
        provider.clone(),
        config.headline_limit,
        config.max_concurrent_fetches,
    ));
    scheduler.register(CorrelationAnalyzer::new(CorrelationPolicy::from(
        &config.correlation,
    )));
    for name in scheduler.job_names() {
        info!("Job registered: {} (every {}s)", name, config.check_interval_seconds);
    }

    let ticks = scheduler.run_until(shutdown_signal()).await;

    info!("Scheduler stopped by user after {} ticks.", ticks);
}

/// Resolves on Ctrl-C. If the handler cannot be installed the process runs until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
