//! Board cache and background warmer.
//!
//! Holds the last computed leaderboard with its timestamp. Reads within the
//! TTL are served from memory; stale reads recompute behind a single-flight
//! guard so a burst of cold requests costs one aggregation pass, not one
//! per request. A recompute failure propagates to the caller; the stale
//! snapshot is not served as a fallback.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{CacheConfig, ScoringConfig};
use crate::ranking::board::compute_board;
use crate::ranking::{MetricsSource, RankingEntry};

/// One computed board plus its freshness stamp. Entries are shared, not
/// copied, between concurrent readers.
#[derive(Clone)]
pub struct Snapshot {
    pub entries: Arc<Vec<RankingEntry>>,
    pub computed_at: DateTime<Utc>,
}

pub struct BoardCache {
    source: Arc<dyn MetricsSource>,
    scoring: ScoringConfig,
    ttl: Duration,
    inner: RwLock<Option<Snapshot>>,
    // Held across the whole recompute so only one is in flight
    recompute: Mutex<()>,
}

impl BoardCache {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        scoring: ScoringConfig,
        config: &CacheConfig,
    ) -> Self {
        Self {
            source,
            scoring,
            ttl: Duration::seconds(config.ttl_seconds as i64),
            inner: RwLock::new(None),
            recompute: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot with no freshness check. None before the first
    /// computation.
    pub async fn get(&self) -> Option<Snapshot> {
        self.inner.read().await.clone()
    }

    /// Drop the snapshot so the next read recomputes. Available to write
    /// paths that want event-driven freshness; nothing calls it today, so
    /// staleness stays purely time-based.
    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }

    /// Serve the cached board, recomputing first when it is missing or
    /// older than the TTL. Concurrent stale readers share one recompute:
    /// late arrivals re-check freshness after the guard and leave without
    /// touching the source.
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> Result<Snapshot> {
        if let Some(snapshot) = self.get().await {
            if self.is_fresh(&snapshot, now) {
                return Ok(snapshot);
            }
        }

        let _guard = self.recompute.lock().await;

        if let Some(snapshot) = self.get().await {
            if self.is_fresh(&snapshot, now) {
                return Ok(snapshot);
            }
        }

        self.recompute_locked(now).await
    }

    /// Recompute unconditionally. The refresh query flag and the manual
    /// refresh endpoint land here; sequential calls each pay a full pass.
    pub async fn force_refresh(&self, now: DateTime<Utc>) -> Result<Snapshot> {
        let _guard = self.recompute.lock().await;
        self.recompute_locked(now).await
    }

    fn is_fresh(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> bool {
        now - snapshot.computed_at < self.ttl
    }

    async fn recompute_locked(&self, now: DateTime<Utc>) -> Result<Snapshot> {
        let entries = compute_board(self.source.as_ref(), &self.scoring).await?;
        let snapshot = Snapshot {
            entries: Arc::new(entries),
            computed_at: now,
        };
        *self.inner.write().await = Some(snapshot.clone());
        info!(farmers = snapshot.entries.len(), "Leaderboard recomputed");
        Ok(snapshot)
    }
}

/// Spawn the periodic warm task. The first tick fires immediately, so the
/// cache is primed at startup; after that the board refreshes every
/// `interval_seconds` even with zero readers.
pub fn spawn_warmer(cache: Arc<BoardCache>, interval_seconds: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_seconds));
        loop {
            ticker.tick().await;
            if let Err(e) = cache.force_refresh(Utc::now()).await {
                warn!(error = %e, "Warm refresh failed");
            }
        }
    })
}
