//! The target location of a comment: a repository, its published branch, and
//! the file the comment is stored in.
//!
//! The original wire format carried two mutually exclusive optional fields
//! (`path` vs `id`); here that is an explicit tagged variant so an invalid
//! combination is unrepresentable past the request boundary.

use serde::Serialize;
use thiserror::Error;

use super::ids::RepoId;

/// Where a comment is stored inside the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PageTarget {
    /// A single content file (e.g. a blog post) whose front matter holds the
    /// `comments` sequence.
    FrontMatter { path: String },

    /// A shared data file mapping page ids to comment sequences, stored under
    /// `_data/<file>.yml`.
    KeyedDocument { id: String, file: String },
}

/// Default data file name for keyed-document targets, without the `.yml`
/// extension.
pub const DEFAULT_KEYED_FILE: &str = "comments";

/// Error for an invalid path/id combination in a comment request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("exactly one of `path` or `id` must be set")]
pub struct InvalidTarget;

impl PageTarget {
    /// Builds a target from the raw request fields.
    ///
    /// Exactly one of `path` and `id` must be present; `file` falls back to
    /// [`DEFAULT_KEYED_FILE`]. This runs before any network call, so a
    /// misconfigured page rejects cheaply.
    pub fn from_parts(
        path: Option<String>,
        id: Option<String>,
        file: Option<String>,
    ) -> Result<Self, InvalidTarget> {
        match (path, id) {
            (Some(path), None) => Ok(PageTarget::FrontMatter { path }),
            (None, Some(id)) => Ok(PageTarget::KeyedDocument {
                id,
                file: file.unwrap_or_else(|| DEFAULT_KEYED_FILE.to_string()),
            }),
            _ => Err(InvalidTarget),
        }
    }

    /// The repository path of the file this target edits.
    pub fn repo_path(&self) -> String {
        match self {
            PageTarget::FrontMatter { path } => path.clone(),
            PageTarget::KeyedDocument { file, .. } => format!("_data/{file}.yml"),
        }
    }
}

/// A page a visitor is commenting on.
///
/// `branch` is the *published* branch of the site, derived from the repository
/// naming convention: a user site (`<owner>.github.io`) publishes from
/// `master`, a project site from `gh-pages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub target: PageTarget,
}

impl Page {
    /// Creates a page, deriving the published branch from the repository name.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, target: PageTarget) -> Self {
        let owner = owner.into();
        let repo = repo.into();
        let branch = Self::published_branch(&owner, &repo).to_string();
        Page {
            owner,
            repo,
            branch,
            target,
        }
    }

    /// The branch a site publishes from, by repository naming convention.
    pub fn published_branch(owner: &str, repo: &str) -> &'static str {
        if repo == format!("{owner}.github.io") {
            "master"
        } else {
            "gh-pages"
        }
    }

    pub fn repo_id(&self) -> RepoId {
        RepoId::new(self.owner.clone(), self.repo.clone())
    }

    /// The repository path of the file this page's comments live in.
    pub fn repo_path(&self) -> String {
        self.target.repo_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_of_path_or_id() {
        assert!(PageTarget::from_parts(None, None, None).is_err());
        assert!(
            PageTarget::from_parts(Some("a.md".into()), Some("page".into()), None).is_err()
        );

        let front = PageTarget::from_parts(Some("_posts/hello.md".into()), None, None).unwrap();
        assert_eq!(
            front,
            PageTarget::FrontMatter {
                path: "_posts/hello.md".into()
            }
        );

        let keyed = PageTarget::from_parts(None, Some("about".into()), None).unwrap();
        assert_eq!(
            keyed,
            PageTarget::KeyedDocument {
                id: "about".into(),
                file: DEFAULT_KEYED_FILE.into()
            }
        );
    }

    #[test]
    fn keyed_target_path_is_under_data() {
        let keyed =
            PageTarget::from_parts(None, Some("about".into()), Some("guestbook".into())).unwrap();
        assert_eq!(keyed.repo_path(), "_data/guestbook.yml");
    }

    #[test]
    fn published_branch_follows_user_site_convention() {
        assert_eq!(Page::published_branch("octocat", "octocat.github.io"), "master");
        assert_eq!(Page::published_branch("octocat", "blog"), "gh-pages");
        // Another owner's user-site name is still a project for this owner.
        assert_eq!(Page::published_branch("octocat", "other.github.io"), "gh-pages");
    }

    #[test]
    fn page_derives_branch_on_construction() {
        let page = Page::new(
            "octocat",
            "blog",
            PageTarget::FrontMatter {
                path: "_posts/hello.md".into(),
            },
        );
        assert_eq!(page.branch, "gh-pages");
        assert_eq!(page.repo_id(), RepoId::new("octocat", "blog"));
        assert_eq!(page.repo_path(), "_posts/hello.md");
    }
}
