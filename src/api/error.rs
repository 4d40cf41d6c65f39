use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the leaderboard endpoints.
///
/// Malformed query input is deliberately absent: a bad limit falls back to
/// the default and an unknown region kind matches nothing, neither is a 400.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Farmer not found: {0}")]
    FarmerNotFound(String),

    #[error("Leaderboard computation failed: {0}")]
    Compute(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::FarmerNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Compute(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
