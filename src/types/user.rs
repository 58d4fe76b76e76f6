//! Accounts that own write credentials, and their publishing policy.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// Per-owner publishing settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Commit straight onto the published branch, skipping review.
    pub master: bool,
    /// When not committing directly, share one long-lived comment branch and
    /// review request per repository instead of one per file.
    pub group: bool,
}

impl Settings {
    pub fn policy(&self) -> PublishPolicy {
        if self.master {
            PublishPolicy::Master
        } else if self.group {
            PublishPolicy::GroupedReview
        } else {
            PublishPolicy::PerFileReview
        }
    }
}

/// How a comment reaches the published branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPolicy {
    /// Commit directly onto the published branch.
    Master,
    /// One comment branch and review request for the whole repository.
    GroupedReview,
    /// One comment branch and review request per commented file.
    PerFileReview,
}

impl PublishPolicy {
    /// The branch a comment commit must land on.
    ///
    /// `Master` reuses the origin branch verbatim; the review policies derive
    /// a comment branch from it.
    pub fn comment_branch(&self, origin: &str, path: &str) -> String {
        match self {
            PublishPolicy::Master => origin.to_string(),
            PublishPolicy::GroupedReview => format!("{origin}_comments"),
            PublishPolicy::PerFileReview => format!("{origin}_comments_{path}"),
        }
    }

    pub fn is_master(&self) -> bool {
        matches!(self, PublishPolicy::Master)
    }
}

/// An account owning the write credentials for its repositories.
///
/// `id` is the stable platform identity; everything else may change between
/// logins and is refreshed by the account store's upsert.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub token: String,
    pub picture: String,
    pub settings: Settings,
}

// Manual Debug so the API token never reaches logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("picture", &self.picture)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_map_to_policies() {
        let master = Settings {
            master: true,
            group: false,
        };
        assert_eq!(master.policy(), PublishPolicy::Master);
        // master wins over group
        let both = Settings {
            master: true,
            group: true,
        };
        assert_eq!(both.policy(), PublishPolicy::Master);
        let grouped = Settings {
            master: false,
            group: true,
        };
        assert_eq!(grouped.policy(), PublishPolicy::GroupedReview);
        assert_eq!(Settings::default().policy(), PublishPolicy::PerFileReview);
    }

    #[test]
    fn comment_branch_naming() {
        let path = "_posts/hello.md";
        assert_eq!(PublishPolicy::Master.comment_branch("master", path), "master");
        assert_eq!(
            PublishPolicy::GroupedReview.comment_branch("master", path),
            "master_comments"
        );
        assert_eq!(
            PublishPolicy::PerFileReview.comment_branch("master", path),
            "master_comments__posts/hello.md"
        );
    }

    #[test]
    fn user_debug_never_prints_token() {
        let user = User {
            id: UserId(1),
            username: "octocat".into(),
            email: "octocat@example.com".into(),
            token: "gho_secret".into(),
            picture: "https://example.com/p.png".into(),
            settings: Settings::default(),
        };
        let rendered = format!("{user:?}");
        assert!(!rendered.contains("gho_secret"));
    }
}
