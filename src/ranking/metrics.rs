//! Per-farmer metric merge.
//!
//! Folds the three store aggregates (sales, orders, bids) into one typed
//! metrics value per farmer. Missing aggregates mean zero activity, never
//! an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::store::{BidAggregate, OrderAggregate, SalesAggregate};

/// Merged activity metrics for one farmer. Every field defaults to zero so
/// a farmer with no sales, orders, or bids still gets a complete value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerMetrics {
    /// Direct sales plus completed orders. The two sources are merged with
    /// no dedup key, so an order that also produced a sale row counts twice.
    pub sales_count: i64,
    /// Sale revenue, completed-order revenue, and won-bid revenue combined.
    pub total_revenue: Decimal,
    /// Mean buyer rating over rated sales. Zero when nothing is rated.
    pub avg_rating: Decimal,
    pub total_bids: i64,
    pub won_bids: i64,
    pub active_bids: i64,
    /// won_bids / total_bids, with a floor of one bid in the denominator.
    pub win_rate: Decimal,
    /// Sales plus won bids.
    pub total_transactions: i64,
    /// Transactions over attempts (sales + total bids). Zero on no attempts.
    pub completion_rate: Decimal,
}

impl FarmerMetrics {
    pub fn from_aggregates(
        sales: Option<&SalesAggregate>,
        orders: Option<&OrderAggregate>,
        bids: Option<&BidAggregate>,
    ) -> Self {
        let (direct_sales, sale_revenue, avg_rating) = match sales {
            Some(s) => (s.sales_count, s.revenue, s.avg_rating),
            None => (0, Decimal::ZERO, Decimal::ZERO),
        };
        let (completed_orders, order_revenue) = match orders {
            Some(o) => (o.completed_orders, o.completed_revenue),
            None => (0, Decimal::ZERO),
        };
        let (total_bids, won_bids, active_bids, bid_revenue) = match bids {
            Some(b) => (b.total_bids, b.won_bids, b.active_bids, b.bid_revenue),
            None => (0, 0, 0, Decimal::ZERO),
        };

        let sales_count = direct_sales + completed_orders;
        let total_revenue = sale_revenue + order_revenue + bid_revenue;
        let total_transactions = sales_count + won_bids;

        let win_rate = Decimal::from(won_bids) / Decimal::from(total_bids.max(1));

        let attempts = sales_count + total_bids;
        let completion_rate = if attempts > 0 {
            Decimal::from(total_transactions) / Decimal::from(attempts)
        } else {
            Decimal::ZERO
        };

        Self {
            sales_count,
            total_revenue,
            avg_rating,
            total_bids,
            won_bids,
            active_bids,
            win_rate,
            total_transactions,
            completion_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sales_agg(count: i64, revenue: Decimal, rating: Decimal) -> SalesAggregate {
        SalesAggregate {
            farmer_id: "f1".to_string(),
            sales_count: count,
            revenue,
            avg_rating: rating,
        }
    }

    fn order_agg(completed: i64, revenue: Decimal) -> OrderAggregate {
        OrderAggregate {
            farmer_id: "f1".to_string(),
            completed_orders: completed,
            completed_revenue: revenue,
        }
    }

    fn bid_agg(total: i64, won: i64, active: i64, revenue: Decimal) -> BidAggregate {
        BidAggregate {
            farmer_id: "f1".to_string(),
            total_bids: total,
            won_bids: won,
            active_bids: active,
            bid_revenue: revenue,
        }
    }

    #[test]
    fn test_all_sources_merge() {
        let sales = sales_agg(3, dec!(6000), dec!(4.5));
        let orders = order_agg(2, dec!(1000));
        let bids = bid_agg(10, 6, 2, dec!(3000));

        let m = FarmerMetrics::from_aggregates(Some(&sales), Some(&orders), Some(&bids));

        // Completed orders fold into the sales count and revenue
        assert_eq!(m.sales_count, 5);
        assert_eq!(m.total_revenue, dec!(10000));
        assert_eq!(m.avg_rating, dec!(4.5));
        assert_eq!(m.total_bids, 10);
        assert_eq!(m.won_bids, 6);
        assert_eq!(m.active_bids, 2);
        assert_eq!(m.win_rate, dec!(0.6));
        assert_eq!(m.total_transactions, 11);
        // 11 transactions over 15 attempts
        assert_eq!(m.completion_rate.round_dp(4), dec!(0.7333));
    }

    #[test]
    fn test_missing_aggregates_default_to_zero() {
        let m = FarmerMetrics::from_aggregates(None, None, None);
        assert_eq!(m.sales_count, 0);
        assert_eq!(m.total_revenue, Decimal::ZERO);
        assert_eq!(m.win_rate, Decimal::ZERO);
        assert_eq!(m.completion_rate, Decimal::ZERO);
        assert_eq!(m.total_transactions, 0);
    }

    #[test]
    fn test_win_rate_guard_with_zero_bids() {
        let sales = sales_agg(2, dec!(500), dec!(4));
        let m = FarmerMetrics::from_aggregates(Some(&sales), None, None);
        // No bids: win rate is 0/1, not a division error
        assert_eq!(m.win_rate, Decimal::ZERO);
        // Two sales, two transactions, two attempts
        assert_eq!(m.completion_rate, Decimal::ONE);
    }

    #[test]
    fn test_completion_rate_never_exceeds_one() {
        // Won bids can never exceed total bids, so transactions <= attempts
        let bids = bid_agg(4, 4, 0, dec!(100));
        let m = FarmerMetrics::from_aggregates(None, None, Some(&bids));
        assert_eq!(m.completion_rate, Decimal::ONE);
        assert_eq!(m.win_rate, Decimal::ONE);
    }

    #[test]
    fn test_bids_only_farmer() {
        let bids = bid_agg(5, 0, 3, Decimal::ZERO);
        let m = FarmerMetrics::from_aggregates(None, None, Some(&bids));
        assert_eq!(m.sales_count, 0);
        assert_eq!(m.active_bids, 3);
        assert_eq!(m.win_rate, Decimal::ZERO);
        // 0 transactions over 5 attempts
        assert_eq!(m.completion_rate, Decimal::ZERO);
    }
}
