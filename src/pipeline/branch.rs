//! Branch resolution: which branch a comment commit must land on, created
//! from the origin branch when absent.
//!
//! Branch-creation races between two requests computing the same comment
//! branch are prevented by the repository lock wrapping the whole pipeline
//! run, not by this module.

use tracing::debug;

use crate::github::RepoHost;
use crate::types::{Page, PublishPolicy};

use super::error::CommentError;

/// Resolves the comment branch for a page under a publishing policy.
///
/// On success the returned branch is guaranteed to exist.
pub async fn resolve<R: RepoHost>(
    repo: &R,
    page: &Page,
    policy: PublishPolicy,
) -> Result<String, CommentError> {
    // Direct-commit fast path: no existence check, no creation.
    if policy.is_master() {
        return Ok(page.branch.clone());
    }

    let path = page.repo_path();
    let branch = policy.comment_branch(&page.branch, &path);

    // The source file must exist on the origin branch: "nothing to comment
    // on" is the commenter's problem, distinct from later transient errors.
    repo.file(&path, &page.branch)
        .await
        .map_err(CommentError::from_read)?;

    match repo.branch_head(&branch).await {
        Ok(_) => Ok(branch),
        Err(err) if err.is_not_found() => {
            debug!(branch = %branch, origin = %page.branch, "creating comment branch");
            let tip = repo
                .branch_head(&page.branch)
                .await
                .map_err(CommentError::Host)?;
            repo.create_branch(&branch, &tip)
                .await
                .map_err(CommentError::Host)?;
            // Re-read to confirm the ref is visible before any file write.
            repo.branch_head(&branch)
                .await
                .map_err(CommentError::Host)?;
            debug!(branch = %branch, tip = %tip.short(), "created comment branch");
            Ok(branch)
        }
        Err(other) => Err(CommentError::Host(other)),
    }
}
