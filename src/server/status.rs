//! Read-only status endpoint for observability.
//!
//! Reports account and comment counts plus the remaining API quota of the
//! application credentials.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::accounts::AccountStore;
use crate::github::{CommentHost, HostError, RateLimit};

use super::AppState;

/// The status document.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub user_count: u64,
    pub comment_count: u64,
    pub rate: RateLimit,
}

/// Errors while assembling the status document.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("could not read rate limit: {0}")]
    Host(#[from] HostError),
}

impl IntoResponse for StatusError {
    fn into_response(self) -> Response {
        error!(error = %self, "status endpoint failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Returns counts and API quota as JSON.
pub async fn status_handler<H: CommentHost, A: AccountStore>(
    State(state): State<AppState<H, A>>,
) -> Result<Json<StatusReport>, StatusError> {
    let pipeline = state.pipeline();
    let rate = pipeline.host().rate_limit().await?;

    Ok(Json(StatusReport {
        user_count: pipeline.accounts().count().await,
        comment_count: pipeline.counter().get(),
        rate,
    }))
}
