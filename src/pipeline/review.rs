//! Review-request coordination for comments that do not commit directly.
//!
//! Finds the open review request carrying a repository's pending comments
//! and appends a human-readable note to it, or opens a new one when none
//! matches.

use tracing::{debug, warn};

use crate::github::RepoHost;
use crate::types::{Comment, Page};

use super::error::CommentError;

/// Ensures an open review request from `comment_branch` into the page's
/// published branch carries a note for this comment.
pub async fn ensure_review_request<R: RepoHost>(
    repo: &R,
    page: &Page,
    comment_branch: &str,
    comment: &Comment,
) -> Result<(), CommentError> {
    let origin = &page.branch;
    let candidates = repo
        .list_review_requests(origin, comment_branch)
        .await
        .map_err(CommentError::Host)?;

    if candidates.len() > 1 {
        // Only the first candidate is used; more than one open request with
        // the same head and base is ambiguous (e.g. opened manually).
        warn!(
            count = candidates.len(),
            head = comment_branch,
            base = %origin,
            "multiple review requests match; using the first"
        );
    }

    let note = format_note(comment);

    match candidates.first() {
        Some(first) if first.head_ref == comment_branch && first.base_ref == *origin => {
            debug!(number = first.number, "appending note to review request");
            repo.comment_on_review_request(first.number, &note)
                .await
                .map_err(CommentError::Host)?;
        }
        _ => {
            let title = format!("Comments for file {}.", page.repo_path());
            let created = repo
                .create_review_request(&title, &note, origin, comment_branch)
                .await
                .map_err(CommentError::Host)?;
            debug!(number = created.number, "opened review request");
        }
    }

    Ok(())
}

/// The human-readable summary appended for each comment.
fn format_note(comment: &Comment) -> String {
    format!(
        "**Date:** {}\n**Author:** {}\n**Content:** {}\n",
        comment.date.to_rfc2822(),
        comment.author.display_line(),
        comment.content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Commenter, CommenterKind};

    #[test]
    fn note_carries_date_author_and_content() {
        let comment = Comment::submitted(
            Commenter::new(
                CommenterKind::Github,
                "octocat",
                Some("https://github.com/octocat".into()),
                None,
            ),
            "nice post",
        );
        let note = format_note(&comment);
        assert!(note.contains("**Date:**"));
        assert!(note.contains("**Author:** octocat (https://github.com/octocat)"));
        assert!(note.contains("**Content:** nice post"));
    }
}
