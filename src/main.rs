use appcensus::config::Config;
use appcensus::db;
use appcensus::services::{AppStore, CollectorService};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load configuration; fail fast before any network call
    let config = Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!(
        "Starting enterprise app sync pass (lookback: {} days, page size: {})",
        config.sync.lookback_days,
        config.sync.page_size
    );

    // Create database pool and make sure the target schema exists
    let pool = db::create_pool(&config.database).await.map_err(|e| {
        log::error!("Database pool error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    AppStore::ensure_schema(&pool).await.map_err(|e| {
        log::error!("Schema bootstrap error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    // Run the single synchronization pass
    let collector = CollectorService::new(&config).map_err(|e| {
        log::error!("Failed to build Graph client: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let summary = collector.run(&pool).await.map_err(|e| {
        log::error!("Sync pass failed: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    pool.close().await;

    log::info!("Finished: {} enterprise app rows written", summary.upserted);
    Ok(())
}
