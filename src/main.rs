use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use agrirank::api::{self, ApiState};
use agrirank::config::AppConfig;
use agrirank::db::store::Store;
use agrirank::monitoring::logger;
use agrirank::notify::PushClient;
use agrirank::ranking::cache::{self, BoardCache};

#[derive(Parser)]
#[command(name = "agrirank", about = "Farmer leaderboard service")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, secrets) = AppConfig::load(&cli.config)?;

    logger::init_logging(&config.monitoring)?;

    tracing::info!(
        db = %config.database.path,
        port = config.server.port,
        cache_ttl_s = config.cache.ttl_seconds,
        warm_interval_s = config.cache.warm_interval_seconds,
        "Leaderboard service starting"
    );

    let store = Store::new(&config.database.path).await?;

    let cache = Arc::new(BoardCache::new(
        Arc::new(store),
        config.scoring.clone(),
        &config.cache,
    ));

    // Primes the cache immediately, then keeps it warm on the long interval
    let warmer = cache::spawn_warmer(cache.clone(), config.cache.warm_interval_seconds);

    let push = Arc::new(PushClient::new(
        secrets.push_webhook_url,
        config.notify.enabled,
    ));
    if !push.is_enabled() {
        tracing::info!("Push channel disabled; refreshes will not broadcast");
    }

    let state = ApiState::new(cache, push, &config.server, &config.notify);
    let result = api::serve(state, &config.server.bind, config.server.port).await;

    warmer.abort();
    result
}
