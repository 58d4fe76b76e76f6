//! HTTP surface of the comment bot.
//!
//! This module implements the interface boundary with the excluded
//! collaborators (front end, session layer): it validates requests, issues
//! CSRF tokens, invokes the pipeline, and exposes health and status
//! endpoints.
//!
//! # Endpoints
//!
//! - `POST /comment/csrf` - Issues a one-time CSRF token
//! - `POST /comment/{owner}/{repo}` - Accepts a comment submission
//! - `GET /health` - Returns 200 if the server is running
//! - `GET /status` - Returns counts and API quota as JSON

use std::sync::Arc;

pub mod comment;
pub mod csrf;
pub mod health;
pub mod status;

pub use comment::{comment_handler, csrf_handler, CommentBody, CommentRejection};
pub use csrf::CsrfStore;
pub use health::health_handler;
pub use status::{status_handler, StatusReport};

use crate::accounts::AccountStore;
use crate::github::CommentHost;
use crate::pipeline::CommentPipeline;

/// Shared application state, passed to all handlers via Axum's `State`
/// extractor.
pub struct AppState<H, A> {
    inner: Arc<AppStateInner<H, A>>,
}

// Manual Clone: the derive would demand H: Clone and A: Clone, but only the
// Arc is cloned.
impl<H, A> Clone for AppState<H, A> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<H, A> {
    pipeline: CommentPipeline<H, A>,
    csrf: CsrfStore,
    max_content_len: usize,
}

impl<H: CommentHost, A: AccountStore> AppState<H, A> {
    /// Default cap on comment length, in characters.
    pub const DEFAULT_MAX_CONTENT_LEN: usize = 10_000;

    pub fn new(pipeline: CommentPipeline<H, A>, csrf: CsrfStore, max_content_len: usize) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                pipeline,
                csrf,
                max_content_len,
            }),
        }
    }

    pub fn pipeline(&self) -> &CommentPipeline<H, A> {
        &self.inner.pipeline
    }

    pub fn csrf(&self) -> &CsrfStore {
        &self.inner.csrf
    }

    pub fn max_content_len(&self) -> usize {
        self.inner.max_content_len
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<H: CommentHost, A: AccountStore>(state: AppState<H, A>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/comment/csrf", post(csrf_handler::<H, A>))
        .route("/comment/{owner}/{repo}", post(comment_handler::<H, A>))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler::<H, A>))
        .with_state(state)
}
