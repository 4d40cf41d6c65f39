//! Leaderboard assembly.
//!
//! Left-joins the store aggregates onto the farmer list, scores each
//! farmer, sorts by the tie-break chain, and assigns rank, badge, and
//! tier. Region views are cut from the finished board and re-ranked
//! within the slice.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::ScoringConfig;
use crate::ranking::metrics::FarmerMetrics;
use crate::ranking::score::performance_score;
use crate::ranking::{Badge, BoardStats, MetricsSource, RankingEntry, Tier};

/// Run the full pipeline: fetch, merge, score, sort, rank.
///
/// Any source failure aborts the whole computation; there is no partial
/// board built from the aggregates that did succeed.
pub async fn compute_board(
    source: &dyn MetricsSource,
    scoring: &ScoringConfig,
) -> Result<Vec<RankingEntry>> {
    let farmers = source.farmers().await?;
    let sales = source.sales_aggregates().await?;
    let orders = source.order_aggregates().await?;
    let bids = source.bid_aggregates().await?;

    let sales_by_id: HashMap<&str, _> = sales.iter().map(|a| (a.farmer_id.as_str(), a)).collect();
    let orders_by_id: HashMap<&str, _> = orders.iter().map(|a| (a.farmer_id.as_str(), a)).collect();
    let bids_by_id: HashMap<&str, _> = bids.iter().map(|a| (a.farmer_id.as_str(), a)).collect();

    let mut entries = Vec::with_capacity(farmers.len());
    for farmer in &farmers {
        // Deactivated accounts drop out entirely, not just to the bottom
        if !farmer.active {
            continue;
        }

        let metrics = FarmerMetrics::from_aggregates(
            sales_by_id.get(farmer.id.as_str()).copied(),
            orders_by_id.get(farmer.id.as_str()).copied(),
            bids_by_id.get(farmer.id.as_str()).copied(),
        );
        let score = performance_score(&metrics, scoring);

        entries.push(RankingEntry {
            rank: 0,
            farmer_id: farmer.id.clone(),
            name: farmer.name.clone(),
            state: farmer.state.clone(),
            district: farmer.district.clone(),
            city: farmer.city.clone(),
            crops: parse_crops(&farmer.crops),
            joined_at: parse_joined_at(&farmer.joined_at),
            score,
            badge: None,
            tier: Tier::Newcomer,
            metrics,
            region_rank: None,
        });
    }

    rank_entries(&mut entries);
    Ok(entries)
}

/// Sort by the tie-break chain and stamp rank, badge, and tier.
///
/// Chain: sales count, then total revenue, then total transactions, then
/// join date, all descending. The sort is stable, so farmers equal on all
/// four keys keep their input order.
pub fn rank_entries(entries: &mut [RankingEntry]) {
    entries.sort_by(|a, b| {
        b.metrics
            .sales_count
            .cmp(&a.metrics.sales_count)
            .then_with(|| b.metrics.total_revenue.cmp(&a.metrics.total_revenue))
            .then_with(|| {
                b.metrics
                    .total_transactions
                    .cmp(&a.metrics.total_transactions)
            })
            .then_with(|| b.joined_at.cmp(&a.joined_at))
    });

    for (i, entry) in entries.iter_mut().enumerate() {
        let rank = i + 1;
        entry.rank = rank;
        entry.badge = badge_for(rank, entry.metrics.sales_count);
        entry.tier = tier_for(rank, entry.metrics.sales_count);
    }
}

fn badge_for(rank: usize, sales_count: i64) -> Option<Badge> {
    if sales_count == 0 {
        return None;
    }
    match rank {
        1 => Some(Badge::Gold),
        2 => Some(Badge::Silver),
        3 => Some(Badge::Bronze),
        _ => None,
    }
}

fn tier_for(rank: usize, sales_count: i64) -> Tier {
    if sales_count == 0 {
        Tier::Newcomer
    } else if rank <= 10 {
        Tier::Elite
    } else if rank <= 50 {
        Tier::Advanced
    } else {
        Tier::Standard
    }
}

/// Cut a state or district view out of the global board.
///
/// Entries keep their global rank and gain a 1-based position within the
/// slice. Unknown kinds match nothing rather than erroring.
pub fn region_slice(entries: &[RankingEntry], kind: &str, name: &str) -> Vec<RankingEntry> {
    let mut slice: Vec<RankingEntry> = entries
        .iter()
        .filter(|e| match kind.to_ascii_lowercase().as_str() {
            "state" => e.state.eq_ignore_ascii_case(name),
            "district" => e.district.eq_ignore_ascii_case(name),
            _ => false,
        })
        .cloned()
        .collect();

    for (i, entry) in slice.iter_mut().enumerate() {
        entry.region_rank = Some(i + 1);
    }
    slice
}

/// Summarize the finished board for the stats endpoint.
pub fn board_stats(entries: &[RankingEntry]) -> BoardStats {
    let total_farmers = entries.len();
    let total_sales = entries.iter().map(|e| e.metrics.sales_count).sum();
    let total_revenue = entries.iter().map(|e| e.metrics.total_revenue).sum();
    let total_transactions = entries.iter().map(|e| e.metrics.total_transactions).sum();
    let total_bids_won = entries.iter().map(|e| e.metrics.won_bids).sum();

    // Board order follows sales, not score, so the top score needs a scan
    let top_score = entries.iter().map(|e| e.score).max().unwrap_or(0);
    let average_score = if entries.is_empty() {
        Decimal::ZERO
    } else {
        let sum: Decimal = entries.iter().map(|e| Decimal::from(e.score)).sum();
        (sum / Decimal::from(total_farmers as i64)).round_dp(2)
    };

    BoardStats {
        total_farmers,
        total_sales,
        total_revenue,
        total_transactions,
        total_bids_won,
        average_score,
        top_score,
    }
}

fn parse_joined_at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn parse_crops(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
