//! End-to-end board computation over a real SQLite store.

use agrirank::config::{CacheConfig, ScoringConfig};
use agrirank::db::store::{BidRecord, FarmerRecord, OrderRecord, SaleRecord, Store};
use agrirank::ranking::board::compute_board;
use agrirank::ranking::cache::BoardCache;
use agrirank::ranking::{Badge, Tier};

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;

fn scoring() -> ScoringConfig {
    ScoringConfig {
        per_sale: dec!(10),
        per_thousand_revenue: dec!(5),
        per_rating_point: dec!(20),
        win_rate_weight: dec!(50),
        per_active_bid: dec!(5),
        activity_cap: dec!(25),
        completion_weight: dec!(30),
    }
}

fn farmer(id: &str, active: bool) -> FarmerRecord {
    FarmerRecord {
        id: id.to_string(),
        name: format!("Farmer {id}"),
        state: "Punjab".to_string(),
        district: "Ludhiana".to_string(),
        city: Some("Khanna".to_string()),
        land_acres: "4.5".to_string(),
        crops: r#"["wheat","mustard"]"#.to_string(),
        joined_at: "2024-02-01T00:00:00Z".to_string(),
        active,
    }
}

fn sale(farmer_id: &str, amount: &str, rating: Option<f64>) -> SaleRecord {
    SaleRecord {
        id: None,
        farmer_id: farmer_id.to_string(),
        amount: amount.to_string(),
        rating,
        crop: Some("wheat".to_string()),
        sold_at: None,
    }
}

fn completed_order(farmer_id: &str, amount: &str) -> OrderRecord {
    OrderRecord {
        id: None,
        farmer_id: farmer_id.to_string(),
        status: "completed".to_string(),
        amount: amount.to_string(),
        crop: Some("wheat".to_string()),
        completed_at: Some("2024-05-01T00:00:00Z".to_string()),
        created_at: None,
    }
}

fn bid(farmer_id: &str, status: &str, winning_amount: Option<&str>) -> BidRecord {
    BidRecord {
        id: None,
        farmer_id: farmer_id.to_string(),
        status: status.to_string(),
        winning_amount: winning_amount.map(|s| s.to_string()),
        current_price: Some("250".to_string()),
        created_at: None,
        closed_at: None,
    }
}

// ──────────────────────────────────────────
// Full pipeline
// ──────────────────────────────────────────

#[tokio::test]
async fn pipeline_derives_metrics_and_score() {
    let store = Store::new(":memory:").await.unwrap();
    store.insert_farmer(&farmer("f1", true)).await.unwrap();

    // 2 direct sales + 1 completed order, 4 bids with 2 won and 1 active
    store.insert_sale(&sale("f1", "1000", Some(4.0))).await.unwrap();
    store.insert_sale(&sale("f1", "2000", Some(5.0))).await.unwrap();
    store.insert_order(&completed_order("f1", "1000")).await.unwrap();
    store.insert_bid(&bid("f1", "completed", Some("500"))).await.unwrap();
    store.insert_bid(&bid("f1", "completed", Some("500"))).await.unwrap();
    store.insert_bid(&bid("f1", "active", None)).await.unwrap();
    store.insert_bid(&bid("f1", "withdrawn", None)).await.unwrap();

    let entries = compute_board(&store, &scoring()).await.unwrap();
    assert_eq!(entries.len(), 1);

    let m = &entries[0].metrics;
    assert_eq!(m.sales_count, 3);
    assert_eq!(m.total_revenue, dec!(5000));
    assert_eq!(m.avg_rating, dec!(4.5));
    assert_eq!(m.total_bids, 4);
    assert_eq!(m.won_bids, 2);
    assert_eq!(m.active_bids, 1);
    assert_eq!(m.win_rate, dec!(0.5));
    assert_eq!(m.total_transactions, 5);

    // 10*3 + 5*5 + 20*4.5 + 50*0.5 + 5*1 + 30*(5/7) = 196.43 -> 196
    assert_eq!(entries[0].score, 196);
    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[0].badge, Some(Badge::Gold));
    assert_eq!(entries[0].tier, Tier::Elite);
}

#[tokio::test]
async fn board_orders_by_sales_not_score() {
    let store = Store::new(":memory:").await.unwrap();
    store.insert_farmer(&farmer("many_sales", true)).await.unwrap();
    store.insert_farmer(&farmer("big_ticket", true)).await.unwrap();

    // Three tiny unrated sales against two enormous five-star ones
    for _ in 0..3 {
        store.insert_sale(&sale("many_sales", "100", None)).await.unwrap();
    }
    store.insert_sale(&sale("big_ticket", "90000", Some(5.0))).await.unwrap();
    store.insert_sale(&sale("big_ticket", "90000", Some(5.0))).await.unwrap();

    let entries = compute_board(&store, &scoring()).await.unwrap();

    assert_eq!(entries[0].farmer_id, "many_sales");
    assert_eq!(entries[1].farmer_id, "big_ticket");
    // The runner-up out-scores the leader; the sort key is sales volume
    assert!(entries[1].score > entries[0].score);
}

#[tokio::test]
async fn sale_and_completed_order_both_count() {
    let store = Store::new(":memory:").await.unwrap();
    store.insert_farmer(&farmer("f1", true)).await.unwrap();

    // One business transaction recorded in both collections inflates the
    // leaderboard; there is no dedup key to collapse them.
    store.insert_sale(&sale("f1", "1000", None)).await.unwrap();
    store.insert_order(&completed_order("f1", "1000")).await.unwrap();

    let entries = compute_board(&store, &scoring()).await.unwrap();
    assert_eq!(entries[0].metrics.sales_count, 2);
    assert_eq!(entries[0].metrics.total_revenue, dec!(2000));
}

#[tokio::test]
async fn refresh_is_idempotent_without_data_changes() {
    let store = Store::new(":memory:").await.unwrap();
    for i in 0..8 {
        let id = format!("f{i}");
        store.insert_farmer(&farmer(&id, true)).await.unwrap();
        for _ in 0..(i % 4) {
            store.insert_sale(&sale(&id, "1000", Some(4.0))).await.unwrap();
        }
    }

    let first = compute_board(&store, &scoring()).await.unwrap();
    let second = compute_board(&store, &scoring()).await.unwrap();

    let order1: Vec<&str> = first.iter().map(|e| e.farmer_id.as_str()).collect();
    let order2: Vec<&str> = second.iter().map(|e| e.farmer_id.as_str()).collect();
    assert_eq!(order1, order2);
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.rank, b.rank);
        assert_eq!(a.score, b.score);
    }
}

// ──────────────────────────────────────────
// Badges, tiers, exclusions
// ──────────────────────────────────────────

#[tokio::test]
async fn podium_and_newcomer_assignment() {
    let store = Store::new(":memory:").await.unwrap();
    for (id, sales) in [("a", 5), ("b", 4), ("c", 3), ("d", 2), ("idle", 0)] {
        store.insert_farmer(&farmer(id, true)).await.unwrap();
        for _ in 0..sales {
            store.insert_sale(&sale(id, "1000", Some(4.0))).await.unwrap();
        }
    }

    let entries = compute_board(&store, &scoring()).await.unwrap();

    assert_eq!(entries[0].badge, Some(Badge::Gold));
    assert_eq!(entries[1].badge, Some(Badge::Silver));
    assert_eq!(entries[2].badge, Some(Badge::Bronze));
    assert_eq!(entries[3].badge, None);

    let idle = entries.iter().find(|e| e.farmer_id == "idle").unwrap();
    assert_eq!(idle.score, 0);
    assert_eq!(idle.badge, None);
    assert_eq!(idle.tier, Tier::Newcomer);
}

#[tokio::test]
async fn inactive_top_seller_is_dropped() {
    let store = Store::new(":memory:").await.unwrap();
    store.insert_farmer(&farmer("active", true)).await.unwrap();
    store.insert_farmer(&farmer("banned", false)).await.unwrap();

    store.insert_sale(&sale("active", "500", None)).await.unwrap();
    for _ in 0..20 {
        store.insert_sale(&sale("banned", "9000", Some(5.0))).await.unwrap();
    }

    let entries = compute_board(&store, &scoring()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].farmer_id, "active");
    assert_eq!(entries[0].rank, 1);
}

// ──────────────────────────────────────────
// Cache over a real store
// ──────────────────────────────────────────

#[tokio::test]
async fn cache_sees_new_data_only_after_refresh() {
    let store = Store::new(":memory:").await.unwrap();
    let pool = store.pool().clone();
    store.insert_farmer(&farmer("f1", true)).await.unwrap();
    store.insert_sale(&sale("f1", "1000", None)).await.unwrap();

    let cache = BoardCache::new(
        Arc::new(store),
        scoring(),
        &CacheConfig {
            ttl_seconds: 3600,
            warm_interval_seconds: 86_400,
        },
    );

    let now = Utc::now();
    let snap = cache.refresh_if_stale(now).await.unwrap();
    assert_eq!(snap.entries[0].metrics.sales_count, 1);

    // A sale recorded after the snapshot stays invisible until a refresh
    let writer = Store::from_pool(pool);
    writer.insert_sale(&sale("f1", "2000", None)).await.unwrap();

    let cached = cache.refresh_if_stale(now).await.unwrap();
    assert_eq!(cached.entries[0].metrics.sales_count, 1);

    let forced = cache.force_refresh(now).await.unwrap();
    assert_eq!(forced.entries[0].metrics.sales_count, 2);
}
