//! Leaderboard ranking engine for an agricultural marketplace.
//!
//! Aggregates farmer activity (sales, orders, auction bids) out of SQLite,
//! scores and ranks every active farmer, and serves the result over a small
//! JSON API backed by a TTL cache with a background warmer.

pub mod api;
pub mod config;
pub mod db;
pub mod monitoring;
pub mod notify;
pub mod ranking;
