//! The comment submission endpoint.
//!
//! This is the interface boundary with the (out of scope) front end: it
//! validates the request shape, checks the CSRF token, and maps pipeline
//! outcomes and failures onto the status-code contract. The authenticated
//! commenter is injected by the session layer as a request extension; its
//! absence is an authentication failure, not a pipeline concern.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use crate::accounts::AccountStore;
use crate::github::CommentHost;
use crate::pipeline::{CommentError, CommentRequest};
use crate::types::{Commenter, InvalidTarget, Page, PageTarget};

use super::AppState;

/// The JSON body of a comment submission.
#[derive(Debug, Deserialize)]
pub struct CommentBody {
    /// The account owning write access to the repository.
    pub username: String,
    pub csrf: String,
    pub content: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
}

/// Why a submission was rejected.
#[derive(Debug, Error)]
pub enum CommentRejection {
    /// No authenticated commenter on the request.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Missing, expired or already-used CSRF token.
    #[error("invalid or expired CSRF token")]
    BadCsrf,

    /// Invalid path/id combination.
    #[error("bad page configuration: {0}")]
    BadTarget(#[from] InvalidTarget),

    /// Empty comment.
    #[error("a comment needs some content")]
    Empty,

    /// Comment over the configured length cap.
    #[error("this comment is way too long")]
    TooLong,

    /// The pipeline failed.
    #[error(transparent)]
    Pipeline(#[from] CommentError),
}

impl IntoResponse for CommentRejection {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CommentRejection::NotAuthenticated | CommentRejection::BadCsrf => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            CommentRejection::BadTarget(_)
            | CommentRejection::Empty
            | CommentRejection::TooLong => (StatusCode::BAD_REQUEST, self.to_string()),
            CommentRejection::Pipeline(err) => match err.user_message() {
                Some(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
                None => {
                    // Not user-actionable: log with full context, surface
                    // nothing internal.
                    error!(error = ?err, "comment submission failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "please try again later".to_string(),
                    )
                }
            },
        };

        (status, message).into_response()
    }
}

/// Issues a one-time CSRF token for the comment form.
pub async fn csrf_handler<H: CommentHost, A: AccountStore>(
    State(state): State<AppState<H, A>>,
) -> String {
    state.csrf().issue().await
}

/// Accepts a comment for `owner/repo` and runs the pipeline.
///
/// Responds `200` with `"committed"` or `"pending"`, `401` on
/// authentication/CSRF failure, `400` on a malformed or oversized request,
/// and `500` (with a user-safe message) when the pipeline fails.
pub async fn comment_handler<H: CommentHost, A: AccountStore>(
    State(state): State<AppState<H, A>>,
    Path((owner, repo)): Path<(String, String)>,
    commenter: Option<Extension<Commenter>>,
    Json(body): Json<CommentBody>,
) -> Result<&'static str, CommentRejection> {
    let author = commenter
        .map(|Extension(commenter)| commenter)
        .ok_or(CommentRejection::NotAuthenticated)?;

    if !state.csrf().consume(&body.csrf).await {
        return Err(CommentRejection::BadCsrf);
    }

    if body.content.is_empty() {
        return Err(CommentRejection::Empty);
    }
    if body.content.chars().count() > state.max_content_len() {
        return Err(CommentRejection::TooLong);
    }

    // Rejects both-or-neither of path/id before any network call.
    let target = PageTarget::from_parts(body.path, body.id, body.file)?;
    let page = Page::new(owner, repo, target);

    let outcome = state
        .pipeline()
        .submit(CommentRequest {
            username: body.username,
            page,
            author,
            content: body.content,
        })
        .await?;

    Ok(outcome.as_str())
}
