//! Real-time push channel.
//!
//! Broadcasts a leaderboard-updated event to a configured webhook after a
//! manual refresh. Delivery is best-effort: failures are logged and never
//! surfaced to the HTTP caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::ranking::RankingEntry;

/// Push webhook client. Disabled when no URL is configured, in which case
/// every send is a no-op.
pub struct PushClient {
    webhook_url: Option<String>,
    http: reqwest::Client,
    enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushEvent<'a> {
    event: &'static str,
    updated_at: DateTime<Utc>,
    top: &'a [RankingEntry],
}

impl PushClient {
    pub fn new(webhook_url: Option<String>, enabled: bool) -> Self {
        Self {
            enabled: enabled && webhook_url.is_some(),
            webhook_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Announce a refreshed board with its top slice.
    pub async fn leaderboard_updated(&self, top: &[RankingEntry], updated_at: DateTime<Utc>) {
        if !self.enabled {
            return;
        }

        let Some(ref url) = self.webhook_url else {
            return;
        };

        let payload = PushEvent {
            event: "leaderboard-updated",
            updated_at,
            top,
        };

        match self.http.post(url).json(&payload).send().await {
            Ok(response) => {
                if !response.status().is_success() {
                    warn!(
                        status = %response.status(),
                        "Push channel returned non-success status"
                    );
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to push leaderboard update");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_client_disabled_without_url() {
        let client = PushClient::new(None, true);
        assert!(!client.is_enabled());
    }

    #[test]
    fn test_push_client_disabled_by_config() {
        let client = PushClient::new(Some("http://localhost/hook".to_string()), false);
        assert!(!client.is_enabled());
    }

    #[test]
    fn test_push_client_enabled_with_url() {
        let client = PushClient::new(Some("http://localhost/hook".to_string()), true);
        assert!(client.is_enabled());
    }

    #[tokio::test]
    async fn test_send_disabled_noop() {
        let client = PushClient::new(None, true);
        // No URL configured: returns quietly instead of erroring
        client.leaderboard_updated(&[], Utc::now()).await;
    }
}
