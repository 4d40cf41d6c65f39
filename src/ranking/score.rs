//! Farmer performance score.
//!
//! Collapses merged activity metrics into a single ranked integer using
//! config-tunable weights. The weights are product policy and change
//! between seasons; the shape of the formula does not.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::config::ScoringConfig;
use crate::ranking::metrics::FarmerMetrics;

/// Calculate the performance score for one farmer.
///
/// # Formula
/// ```text
/// score = per_sale * sales_count
///       + per_thousand_revenue * (total_revenue / 1000)
///       + per_rating_point * avg_rating
///       + win_rate_weight * win_rate
///       + min(activity_cap, per_active_bid * active_bids)
///       + completion_weight * completion_rate
/// ```
/// Rounded half-away-from-zero to the nearest integer, floored at zero.
pub fn performance_score(metrics: &FarmerMetrics, config: &ScoringConfig) -> i64 {
    let sale_points = config.per_sale * Decimal::from(metrics.sales_count);
    let revenue_points = config.per_thousand_revenue * (metrics.total_revenue / dec!(1000));
    let rating_points = config.per_rating_point * metrics.avg_rating;
    let win_points = config.win_rate_weight * metrics.win_rate;

    // Active-bid reward saturates so parked bids can't farm the board
    let activity_points =
        (config.per_active_bid * Decimal::from(metrics.active_bids)).min(config.activity_cap);

    let completion_points = config.completion_weight * metrics.completion_rate;

    let raw = sale_points
        + revenue_points
        + rating_points
        + win_points
        + activity_points
        + completion_points;

    let rounded = raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().unwrap_or(0).max(0)
}
