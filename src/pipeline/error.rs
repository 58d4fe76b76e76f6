//! The pipeline's terminal failure taxonomy.
//!
//! Every pipeline run ends in exactly one outcome or one of these kinds.
//! The user-actionable kinds carry a message safe to show a commenter; the
//! rest are logged with full context and surfaced as a generic "try again
//! later" so internal detail never leaks.

use thiserror::Error;

use crate::codec::CodecError;
use crate::github::HostError;
use crate::lock::LockTimeout;

/// A terminal pipeline failure.
#[derive(Debug, Error)]
pub enum CommentError {
    /// The repository stayed busy past the bounded lock wait. Retryable
    /// later; no partial state is guaranteed to have changed.
    #[error("the repository is busy, try again in a moment")]
    LockTimeout(#[from] LockTimeout),

    /// The commenting target's owner has no linked account and token.
    #[error("{0} is not registered")]
    NotRegistered(String),

    /// The source file or branch does not exist.
    #[error("repository or file not found")]
    NotFound,

    /// The path resolves to a directory, symlink or submodule.
    #[error("{name} is not a file but a {kind}")]
    NotAFile { name: String, kind: String },

    /// Front-matter mode found no delimited block.
    #[error("no front matter in the file")]
    MalformedFile,

    /// The file changed under us: the revision token read at the start of
    /// the run was stale at commit time. The repository lock makes this an
    /// invariant violation rather than ordinary contention, so it is fatal
    /// and never retried.
    #[error("the file changed while the comment was being committed")]
    RevisionConflict,

    /// The overall submission exceeded its bounded duration.
    #[error("comment submission timed out")]
    Timeout,

    /// Any other remote API failure: network, auth, rate limit.
    #[error("github api failure")]
    Host(#[source] HostError),

    /// Content could not be decoded or re-encoded (other than a missing
    /// front-matter block).
    #[error("could not re-encode the comment file")]
    Codec(#[source] CodecError),
}

impl CommentError {
    /// The message shown to the commenter, when the failure is actionable
    /// by them (or worth a retry); `None` means only a generic message may
    /// be surfaced.
    pub fn user_message(&self) -> Option<String> {
        match self {
            CommentError::LockTimeout(_)
            | CommentError::NotRegistered(_)
            | CommentError::NotFound
            | CommentError::NotAFile { .. }
            | CommentError::MalformedFile => {
                Some(format!("could not commit the comment ({self})"))
            }
            CommentError::RevisionConflict
            | CommentError::Timeout
            | CommentError::Host(_)
            | CommentError::Codec(_) => None,
        }
    }

    /// Wraps a codec failure, promoting a missing front-matter block to its
    /// user-actionable kind.
    pub(crate) fn from_codec(err: CodecError) -> Self {
        match err {
            CodecError::MissingFrontMatter => CommentError::MalformedFile,
            other => CommentError::Codec(other),
        }
    }

    /// Wraps a host failure from the file-read step, where a missing path
    /// and a non-file entry are the commenter's problem to fix.
    pub(crate) fn from_read(err: HostError) -> Self {
        match err {
            HostError::NotFound(_) => CommentError::NotFound,
            HostError::NotAFile { name, kind } => CommentError::NotAFile { name, kind },
            other => CommentError::Host(other),
        }
    }

    /// Wraps a host failure from the commit step, where a precondition
    /// conflict means the revision token went stale.
    pub(crate) fn from_commit(err: HostError) -> Self {
        match err {
            HostError::Conflict(_) => CommentError::RevisionConflict,
            other => CommentError::Host(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_actionable_kinds_have_messages() {
        assert_eq!(
            CommentError::NotFound.user_message().as_deref(),
            Some("could not commit the comment (repository or file not found)")
        );
        assert!(CommentError::MalformedFile.user_message().is_some());
        assert!(CommentError::NotRegistered("octocat".into())
            .user_message()
            .is_some());
    }

    #[test]
    fn internal_kinds_have_no_user_message() {
        assert!(CommentError::Timeout.user_message().is_none());
        assert!(CommentError::RevisionConflict.user_message().is_none());
        assert!(CommentError::Host(HostError::api("boom"))
            .user_message()
            .is_none());
    }

    #[test]
    fn missing_front_matter_is_promoted() {
        assert!(matches!(
            CommentError::from_codec(CodecError::MissingFrontMatter),
            CommentError::MalformedFile
        ));
    }

    #[test]
    fn commit_conflict_is_a_revision_conflict() {
        assert!(matches!(
            CommentError::from_commit(HostError::Conflict("stale".into())),
            CommentError::RevisionConflict
        ));
        assert!(matches!(
            CommentError::from_commit(HostError::api("boom")),
            CommentError::Host(_)
        ));
    }
}
