//! Host API traits: the seam between the pipeline and the hosting platform.
//!
//! The pipeline never talks to octocrab directly; it goes through these
//! traits. The trait-based design enables:
//! - Mock hosts for testing the pipeline state machine
//! - Scoping: a [`RepoHost`] is constructed for one repository with one
//!   user's credentials, so individual operations carry neither

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::{RepoId, Sha, UserId};

use super::error::HostError;

/// The platform-level API surface, authenticated with the application's own
/// credentials.
///
/// User-scoped repository work goes through [`CommentHost::repo`], which
/// builds a [`RepoHost`] around an account's token.
pub trait CommentHost: Send + Sync + 'static {
    type Repo: RepoHost;

    /// Translates a username to the platform's stable numeric id.
    ///
    /// Usernames are mutable; accounts are keyed by this id.
    fn lookup_user_id(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<UserId, HostError>> + Send;

    /// Builds a repository-scoped client authenticated with a user token.
    fn repo(&self, repo: &RepoId, token: &str) -> Result<Self::Repo, HostError>;

    /// The primary email of the user a token belongs to.
    ///
    /// Consumed by the login layer when enrolling an account.
    fn authenticated_email(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<String, HostError>> + Send;

    /// Remaining API quota for the application credentials.
    fn rate_limit(&self) -> impl Future<Output = Result<RateLimit, HostError>> + Send;
}

/// Operations on one repository with one user's credentials.
pub trait RepoHost: Send + Sync {
    /// Fetches a file at a branch reference.
    ///
    /// Fails with [`HostError::NotFound`] when the path or ref is absent and
    /// with [`HostError::NotAFile`] when the entry is a directory, symlink or
    /// submodule.
    fn file(
        &self,
        path: &str,
        reference: &str,
    ) -> impl Future<Output = Result<RemoteFile, HostError>> + Send;

    /// The commit SHA at the tip of a branch.
    ///
    /// Fails with [`HostError::NotFound`] when the branch does not exist;
    /// callers use that to decide whether to create it.
    fn branch_head(&self, branch: &str)
        -> impl Future<Output = Result<Sha, HostError>> + Send;

    /// Creates a branch ref pointing at an existing commit.
    fn create_branch(
        &self,
        branch: &str,
        from: &Sha,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Atomically replaces one file on one branch tip.
    ///
    /// The update carries the previously read blob SHA as an
    /// optimistic-concurrency precondition; a stale token fails with
    /// [`HostError::Conflict`] instead of silently overwriting.
    fn update_file(
        &self,
        update: FileUpdate<'_>,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Open review requests from `head` into `base`, most recent first.
    fn list_review_requests(
        &self,
        base: &str,
        head: &str,
    ) -> impl Future<Output = Result<Vec<ReviewRequest>, HostError>> + Send;

    fn create_review_request(
        &self,
        title: &str,
        body: &str,
        base: &str,
        head: &str,
    ) -> impl Future<Output = Result<ReviewRequest, HostError>> + Send;

    /// Appends a discussion comment to an existing review request.
    fn comment_on_review_request(
        &self,
        number: u64,
        body: &str,
    ) -> impl Future<Output = Result<(), HostError>> + Send;
}

/// A fetched file: transport-encoded content plus its revision token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    /// Raw transport representation: base64 of the UTF-8 text, possibly with
    /// embedded line breaks (the API wraps base64 at 60 columns).
    pub content: String,
    /// Blob SHA, the optimistic-concurrency token for the next write.
    pub sha: Sha,
}

/// One atomic single-file commit.
#[derive(Debug, Clone)]
pub struct FileUpdate<'a> {
    pub path: &'a str,
    pub branch: &'a str,
    /// Transport-encoded (base64) new content.
    pub content: String,
    pub message: String,
    /// Expected current blob SHA of the file being replaced.
    pub expected: &'a Sha,
    pub identity: &'a CommitIdentity,
}

/// The fixed service identity recorded as committer and author on comment
/// commits. The human author appears in the commit message body instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

/// An open review request (pull request) summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    pub number: u64,
    pub head_ref: String,
    pub base_ref: String,
}

/// Remaining API quota for a set of credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp at which the quota resets.
    pub reset: u64,
}
