//! Endpoint handlers and response envelopes.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::ranking::board::{board_stats, region_slice};
use crate::ranking::cache::Snapshot;
use crate::ranking::{BoardStats, RankingEntry};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMeta {
    pub total: usize,
    pub last_updated: DateTime<Utc>,
    pub next_update: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BoardResponse {
    pub success: bool,
    pub data: Vec<RankingEntry>,
    pub meta: BoardMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub success: bool,
    pub data: RankingEntry,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub data: BoardStats,
    pub meta: BoardMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub meta: BoardMeta,
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
    limit: Option<String>,
    refresh: Option<String>,
}

fn board_meta(total: usize, snapshot: &Snapshot, ttl: Duration) -> BoardMeta {
    BoardMeta {
        total,
        last_updated: snapshot.computed_at,
        next_update: snapshot.computed_at + ttl,
    }
}

/// Garbage limits fall back to the default rather than erroring.
fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.parse::<usize>().ok()).unwrap_or(default)
}

fn wants_refresh(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

pub async fn top_handler(
    State(state): State<ApiState>,
    Query(params): Query<TopParams>,
) -> Result<Json<BoardResponse>, ApiError> {
    let now = Utc::now();
    let snapshot = if wants_refresh(params.refresh.as_deref()) {
        state.cache.force_refresh(now).await?
    } else {
        state.cache.refresh_if_stale(now).await?
    };

    let limit = parse_limit(params.limit.as_deref(), state.default_limit);
    let data: Vec<RankingEntry> = snapshot.entries.iter().take(limit).cloned().collect();

    Ok(Json(BoardResponse {
        success: true,
        meta: board_meta(snapshot.entries.len(), &snapshot, state.cache.ttl()),
        data,
    }))
}

pub async fn farmer_handler(
    State(state): State<ApiState>,
    Path(farmer_id): Path<String>,
) -> Result<Json<EntryResponse>, ApiError> {
    let snapshot = state.cache.refresh_if_stale(Utc::now()).await?;

    // Inactive farmers are absent from the board, so they 404 here too
    let entry = snapshot
        .entries
        .iter()
        .find(|e| e.farmer_id == farmer_id)
        .cloned()
        .ok_or(ApiError::FarmerNotFound(farmer_id))?;

    Ok(Json(EntryResponse {
        success: true,
        data: entry,
    }))
}

pub async fn stats_handler(
    State(state): State<ApiState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let snapshot = state.cache.refresh_if_stale(Utc::now()).await?;
    let stats = board_stats(&snapshot.entries);

    Ok(Json(StatsResponse {
        success: true,
        data: stats,
        meta: board_meta(snapshot.entries.len(), &snapshot, state.cache.ttl()),
    }))
}

pub async fn region_handler(
    State(state): State<ApiState>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<Json<BoardResponse>, ApiError> {
    let snapshot = state.cache.refresh_if_stale(Utc::now()).await?;
    let data = region_slice(&snapshot.entries, &kind, &name);

    Ok(Json(BoardResponse {
        success: true,
        meta: board_meta(data.len(), &snapshot, state.cache.ttl()),
        data,
    }))
}

pub async fn refresh_handler(
    State(state): State<ApiState>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let snapshot = state.cache.force_refresh(Utc::now()).await?;

    let top: Vec<RankingEntry> = snapshot
        .entries
        .iter()
        .take(state.push_top_slice)
        .cloned()
        .collect();
    state
        .push
        .leaderboard_updated(&top, snapshot.computed_at)
        .await;

    Ok(Json(RefreshResponse {
        success: true,
        meta: board_meta(snapshot.entries.len(), &snapshot, state.cache.ttl()),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub uptime_seconds: i64,
    pub snapshot_age_seconds: Option<i64>,
    pub ranked_farmers: Option<usize>,
}

/// Service liveness. Reads the cache without ever triggering a recompute.
pub async fn health_handler(State(state): State<ApiState>) -> Json<HealthData> {
    let now = Utc::now();
    let snapshot = state.cache.get().await;

    Json(HealthData {
        status: "ok".to_string(),
        uptime_seconds: (now - state.started_at).num_seconds(),
        snapshot_age_seconds: snapshot
            .as_ref()
            .map(|s| (now - s.computed_at).num_seconds()),
        ranked_farmers: snapshot.as_ref().map(|s| s.entries.len()),
    })
}
