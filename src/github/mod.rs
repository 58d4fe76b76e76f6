//! Remote hosting platform interface.
//!
//! This module defines the host traits the pipeline is written against and
//! their octocrab-backed GitHub implementation.

mod api;
mod client;
mod error;

pub use api::{
    CommentHost, CommitIdentity, FileUpdate, RateLimit, RemoteFile, RepoHost, ReviewRequest,
};
pub use client::{GithubHost, GithubRepoClient};
pub use error::HostError;
