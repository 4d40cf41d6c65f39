pub mod board;
pub mod cache;
pub mod metrics;
pub mod score;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::store::{BidAggregate, FarmerRecord, OrderAggregate, SalesAggregate, Store};
use crate::ranking::metrics::FarmerMetrics;

/// Podium badge for the top three ranks. Only awarded when the farmer has
/// at least one sale, so an empty marketplace has no gold badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Gold,
    Silver,
    Bronze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Elite,
    Advanced,
    Standard,
    Newcomer,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elite => write!(f, "elite"),
            Self::Advanced => write!(f, "advanced"),
            Self::Standard => write!(f, "standard"),
            Self::Newcomer => write!(f, "newcomer"),
        }
    }
}

/// One row of the computed leaderboard. Derived data, rebuilt wholesale on
/// every recomputation and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: usize,
    pub farmer_id: String,
    pub name: String,
    pub state: String,
    pub district: String,
    pub city: Option<String>,
    pub crops: Vec<String>,
    pub joined_at: DateTime<Utc>,
    pub score: i64,
    pub badge: Option<Badge>,
    pub tier: Tier,
    pub metrics: FarmerMetrics,
    /// Position within a region slice. Absent on the global board.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_rank: Option<usize>,
}

/// Summary numbers over the whole ranked list, served by the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStats {
    pub total_farmers: usize,
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub total_transactions: i64,
    pub total_bids_won: i64,
    pub average_score: Decimal,
    pub top_score: i64,
}

/// Everything a leaderboard recomputation reads. The store implements it
/// for production; tests drive the cache with canned data behind the same
/// trait.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn farmers(&self) -> Result<Vec<FarmerRecord>>;
    async fn sales_aggregates(&self) -> Result<Vec<SalesAggregate>>;
    async fn order_aggregates(&self) -> Result<Vec<OrderAggregate>>;
    async fn bid_aggregates(&self) -> Result<Vec<BidAggregate>>;
}

#[async_trait]
impl MetricsSource for Store {
    async fn farmers(&self) -> Result<Vec<FarmerRecord>> {
        self.list_farmers().await
    }

    async fn sales_aggregates(&self) -> Result<Vec<SalesAggregate>> {
        Store::sales_aggregates(self).await
    }

    async fn order_aggregates(&self) -> Result<Vec<OrderAggregate>> {
        Store::order_aggregates(self).await
    }

    async fn bid_aggregates(&self) -> Result<Vec<BidAggregate>> {
        Store::bid_aggregates(self).await
    }
}
