use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub scoring: ScoringConfig,
    pub notify: NotifyConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub default_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Snapshot age beyond which a read triggers recomputation.
    pub ttl_seconds: u64,
    /// Background warmer period. Refreshes even with zero traffic.
    pub warm_interval_seconds: u64,
}

/// Weights of the performance score. Policy knobs, not laws: product owns
/// these numbers and tunes them per season.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub per_sale: Decimal,
    pub per_thousand_revenue: Decimal,
    pub per_rating_point: Decimal,
    pub win_rate_weight: Decimal,
    pub per_active_bid: Decimal,
    pub activity_cap: Decimal,
    pub completion_weight: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub enabled: bool,
    /// How many entries ride along on the leaderboard-updated event.
    pub top_slice: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub json_logs: bool,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub push_webhook_url: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            push_webhook_url: std::env::var("AGRIRANK_PUSH_WEBHOOK_URL").ok(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, overlaying environment variables for secrets.
    pub fn load(config_path: &Path) -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let secrets = Secrets::from_env();

        Ok((config, secrets))
    }
}
