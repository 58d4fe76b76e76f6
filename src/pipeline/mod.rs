//! The comment pipeline orchestrator.
//!
//! Sequences the end-to-end "post a comment" operation:
//! acquire the repository lock, resolve the commenting identity and its
//! account, resolve the comment branch, read the target file, splice the
//! comment in, commit, and, when not committing directly to the published
//! branch, make sure a review request carries the comment. Every failure
//! maps to one kind in [`CommentError`] and releases the lock.
//!
//! There are no automatic retries anywhere in the pipeline: every failure
//! aborts the run and returns a single terminal outcome. Partial remote
//! writes (e.g. branch created but file commit failed) are left for a human
//! to resolve.

pub mod branch;
pub mod counter;
pub mod error;
pub mod review;

#[cfg(test)]
mod tests;

use std::time::Duration;

use tracing::{debug, error, info, instrument};

use crate::accounts::AccountStore;
use crate::codec;
use crate::github::{CommentHost, CommitIdentity, FileUpdate, RepoHost};
use crate::lock::RepoLocks;
use crate::types::{Comment, Commenter, Page};

pub use counter::CommentCounter;
pub use error::CommentError;

/// A validated comment submission.
#[derive(Debug, Clone)]
pub struct CommentRequest {
    /// Username of the account owning write access to the repository. This
    /// is the mutable display name; the pipeline resolves the stable id.
    pub username: String,
    pub page: Page,
    pub author: Commenter,
    /// Raw comment text; entity-encoded when the record is built.
    pub content: String,
}

/// Terminal success state of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The comment is live on the published branch.
    Committed,
    /// The comment sits on a review request awaiting the owner.
    Pending,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Committed => "committed",
            Outcome::Pending => "pending",
        }
    }
}

/// The orchestrator, generic over the host platform and account storage so
/// the state machine is testable against scripted implementations.
pub struct CommentPipeline<H, A> {
    host: H,
    accounts: A,
    locks: RepoLocks,
    counter: CommentCounter,
    identity: CommitIdentity,
    submission_timeout: Duration,
}

impl<H: CommentHost, A: AccountStore> CommentPipeline<H, A> {
    pub fn new(
        host: H,
        accounts: A,
        locks: RepoLocks,
        counter: CommentCounter,
        identity: CommitIdentity,
        submission_timeout: Duration,
    ) -> Self {
        CommentPipeline {
            host,
            accounts,
            locks,
            counter,
            identity,
            submission_timeout,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    pub fn counter(&self) -> &CommentCounter {
        &self.counter
    }

    /// Runs one comment submission to its terminal outcome.
    ///
    /// Runs for the same repository are serialized by the repository lock;
    /// the submission timeout bounds the hold. The lock is released on every
    /// exit path.
    #[instrument(
        skip_all,
        fields(username = %request.username, repo = %request.page.repo_id())
    )]
    pub async fn submit(&self, request: CommentRequest) -> Result<Outcome, CommentError> {
        let key = request.page.repo_id().lock_key();
        debug!("comment submission pending");

        self.locks
            .with_lock(&key, async {
                match tokio::time::timeout(self.submission_timeout, self.run(&request)).await {
                    Ok(result) => result,
                    Err(_) => Err(CommentError::Timeout),
                }
            })
            .await?
    }

    async fn run(&self, request: &CommentRequest) -> Result<Outcome, CommentError> {
        let page = &request.page;

        // Usernames change; the account is keyed by the stable platform id.
        let platform_id = self
            .host
            .lookup_user_id(&request.username)
            .await
            .map_err(CommentError::Host)?;
        let user = self
            .accounts
            .find_by_platform_id(platform_id)
            .await
            .ok_or_else(|| CommentError::NotRegistered(request.username.clone()))?;
        let policy = user.settings.policy();

        let repo = self
            .host
            .repo(&page.repo_id(), &user.token)
            .map_err(CommentError::Host)?;

        // Resolving
        let comment_branch = branch::resolve(&repo, page, policy).await?;

        // Reading
        let path = page.repo_path();
        let file = repo
            .file(&path, &comment_branch)
            .await
            .map_err(CommentError::from_read)?;
        debug!(file = %file.name, branch = %comment_branch, "fetched target file");

        // Transforming. The record's date is fixed here, at submission time,
        // never taken from the client.
        let comment = Comment::submitted(request.author.clone(), &request.content);
        let content = codec::append_comment(&file.content, &page.target, &comment)
            .map_err(CommentError::from_codec)?;

        // Committing
        let update = FileUpdate {
            path: &path,
            branch: &comment_branch,
            content,
            message: format!("Comment by {}", comment.author.display_line()),
            expected: &file.sha,
            identity: &self.identity,
        };
        repo.update_file(update).await.map_err(|err| {
            let err = CommentError::from_commit(err);
            if matches!(err, CommentError::RevisionConflict) {
                error!(
                    path = %path,
                    branch = %comment_branch,
                    "revision token went stale under the repository lock"
                );
            }
            err
        })?;
        debug!(branch = %comment_branch, "committed comment");

        // Reviewing, unless the policy commits straight to the published
        // branch.
        let outcome = if policy.is_master() {
            Outcome::Committed
        } else {
            review::ensure_review_request(&repo, page, &comment_branch, &comment).await?;
            Outcome::Pending
        };

        let total = self.counter.increment();
        info!(
            target: "audit",
            page = ?page,
            comment = ?comment,
            total,
            "posted comment"
        );

        Ok(outcome)
    }
}
