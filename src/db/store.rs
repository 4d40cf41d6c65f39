use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

pub struct Store {
    pool: SqlitePool,
}

/// Farmer profile row. Source of truth lives with the marketplace; the
/// ranking engine only reads it.
#[derive(Debug, Clone, FromRow)]
pub struct FarmerRecord {
    pub id: String,
    pub name: String,
    pub state: String,
    pub district: String,
    pub city: Option<String>,
    pub land_acres: String,
    pub crops: String,
    pub joined_at: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub id: Option<i64>,
    pub farmer_id: String,
    pub amount: String,
    pub rating: Option<f64>,
    pub crop: Option<String>,
    pub sold_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: Option<i64>,
    pub farmer_id: String,
    pub status: String,
    pub amount: String,
    pub crop: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BidRecord {
    pub id: Option<i64>,
    pub farmer_id: String,
    pub status: String,
    pub winning_amount: Option<String>,
    pub current_price: Option<String>,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
}

/// Per-farmer sales rollup. Revenue and rating come back from SQLite as
/// TEXT and are parsed into Decimal here.
#[derive(Debug, Clone)]
pub struct SalesAggregate {
    pub farmer_id: String,
    pub sales_count: i64,
    pub revenue: Decimal,
    pub avg_rating: Decimal,
}

#[derive(Debug, Clone)]
pub struct OrderAggregate {
    pub farmer_id: String,
    pub completed_orders: i64,
    pub completed_revenue: Decimal,
}

#[derive(Debug, Clone)]
pub struct BidAggregate {
    pub farmer_id: String,
    pub total_bids: i64,
    pub won_bids: i64,
    pub active_bids: i64,
    pub bid_revenue: Decimal,
}

fn parse_decimal(raw: Option<String>) -> Decimal {
    raw.as_deref()
        .and_then(|s| Decimal::from_str(s).ok())
        .unwrap_or(Decimal::ZERO)
}

impl Store {
    /// Create a Store from an existing pool (for sharing between the API and the warmer).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))
            .context("Invalid database path")?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        let migration_sql = include_str!("../../migrations/001_init.sql");
        // Execute each statement separately (sqlx doesn't support multiple statements in one call)
        for statement in migration_sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .with_context(|| format!("Failed to execute migration: {trimmed}"))?;
            }
        }
        Ok(())
    }

    // --- Farmer operations ---

    pub async fn insert_farmer(&self, farmer: &FarmerRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO farmers (id, name, state, district, city, land_acres, crops, joined_at, active)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&farmer.id)
        .bind(&farmer.name)
        .bind(&farmer.state)
        .bind(&farmer.district)
        .bind(&farmer.city)
        .bind(&farmer.land_acres)
        .bind(&farmer.crops)
        .bind(&farmer.joined_at)
        .bind(farmer.active)
        .execute(&self.pool)
        .await
        .context("Failed to insert farmer")?;
        Ok(())
    }

    /// All farmer profiles, active or not. The ranking pass filters inactive
    /// ones itself so the exclusion stays visible in one place.
    pub async fn list_farmers(&self) -> Result<Vec<FarmerRecord>> {
        let farmers = sqlx::query_as::<_, FarmerRecord>("SELECT * FROM farmers ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch farmers")?;
        Ok(farmers)
    }

    // --- Sale operations ---

    pub async fn insert_sale(&self, sale: &SaleRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO sales (farmer_id, amount, rating, crop)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&sale.farmer_id)
        .bind(&sale.amount)
        .bind(sale.rating)
        .bind(&sale.crop)
        .execute(&self.pool)
        .await
        .context("Failed to insert sale")?;

        Ok(result.last_insert_rowid())
    }

    /// Per-farmer sale count, revenue sum, and mean rating. Unrated sales
    /// are left out of the average (SQL AVG skips NULL).
    pub async fn sales_aggregates(&self) -> Result<Vec<SalesAggregate>> {
        let rows: Vec<(String, i64, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT farmer_id,
                    COUNT(*),
                    CAST(SUM(CAST(amount AS REAL)) AS TEXT),
                    CAST(AVG(rating) AS TEXT)
             FROM sales GROUP BY farmer_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate sales")?;

        Ok(rows
            .into_iter()
            .map(|(farmer_id, sales_count, revenue, avg_rating)| SalesAggregate {
                farmer_id,
                sales_count,
                revenue: parse_decimal(revenue),
                avg_rating: parse_decimal(avg_rating),
            })
            .collect())
    }

    // --- Order operations ---

    pub async fn insert_order(&self, order: &OrderRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO orders (farmer_id, status, amount, crop, completed_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&order.farmer_id)
        .bind(&order.status)
        .bind(&order.amount)
        .bind(&order.crop)
        .bind(&order.completed_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert order")?;

        Ok(result.last_insert_rowid())
    }

    /// Per-farmer completed-order count and revenue. Only completed orders
    /// count toward the leaderboard; pending and cancelled ones are ignored.
    pub async fn order_aggregates(&self) -> Result<Vec<OrderAggregate>> {
        let rows: Vec<(String, i64, Option<String>)> = sqlx::query_as(
            "SELECT farmer_id,
                    SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END),
                    CAST(SUM(CASE WHEN status = 'completed' THEN CAST(amount AS REAL) ELSE 0 END) AS TEXT)
             FROM orders GROUP BY farmer_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate orders")?;

        Ok(rows
            .into_iter()
            .map(|(farmer_id, completed_orders, completed_revenue)| OrderAggregate {
                farmer_id,
                completed_orders,
                completed_revenue: parse_decimal(completed_revenue),
            })
            .collect())
    }

    // --- Bid operations ---

    pub async fn insert_bid(&self, bid: &BidRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO bids (farmer_id, status, winning_amount, current_price, closed_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&bid.farmer_id)
        .bind(&bid.status)
        .bind(&bid.winning_amount)
        .bind(&bid.current_price)
        .bind(&bid.closed_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert bid")?;

        Ok(result.last_insert_rowid())
    }

    /// Per-farmer bid activity. A bid is won when it completed with a
    /// recorded winning amount; completed bids without one are not wins.
    pub async fn bid_aggregates(&self) -> Result<Vec<BidAggregate>> {
        let rows: Vec<(String, i64, i64, i64, Option<String>)> = sqlx::query_as(
            "SELECT farmer_id,
                    COUNT(*),
                    SUM(CASE WHEN status = 'completed' AND winning_amount IS NOT NULL THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END),
                    CAST(SUM(CASE WHEN status = 'completed' AND winning_amount IS NOT NULL THEN CAST(winning_amount AS REAL) ELSE 0 END) AS TEXT)
             FROM bids GROUP BY farmer_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate bids")?;

        Ok(rows
            .into_iter()
            .map(
                |(farmer_id, total_bids, won_bids, active_bids, bid_revenue)| BidAggregate {
                    farmer_id,
                    total_bids,
                    won_bids,
                    active_bids,
                    bid_revenue: parse_decimal(bid_revenue),
                },
            )
            .collect())
    }
}
