//! Octocrab-backed implementation of the host traits.
//!
//! [`GithubHost`] holds the application-credential client; [`GithubRepoClient`]
//! wraps a per-user octocrab instance scoped to a specific repository, so all
//! operations performed through one client target the same repository with the
//! same credentials.
//!
//! Typed octocrab endpoints are used where they exist (pulls, issue comments,
//! contents, refs). Update-file, user lookup, emails and the rate limit go
//! through octocrab's generic verbs with locally defined response structs:
//! the contents-write endpoint must receive the ready-encoded content and the
//! SHA precondition verbatim, which the typed builder does not let us express.

use octocrab::params::repos::Reference;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};

use crate::config::GithubConfig;
use crate::types::{RepoId, Sha, UserId};

use super::api::{
    CommentHost, FileUpdate, RateLimit, RemoteFile, RepoHost, ReviewRequest,
};
use super::error::HostError;

/// Entry point to the GitHub API with application credentials.
pub struct GithubHost {
    app: Octocrab,
}

impl GithubHost {
    /// Builds the application client from OAuth app credentials.
    pub fn new(config: &GithubConfig) -> Result<Self, HostError> {
        let app = Octocrab::builder()
            .basic_auth(config.client_id.clone(), config.client_secret.clone())
            .build()
            .map_err(|e| HostError::from_octocrab(e, "building app client"))?;
        Ok(GithubHost { app })
    }

    fn user_client(token: &str) -> Result<Octocrab, HostError> {
        Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| HostError::from_octocrab(e, "building user client"))
    }
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct EmailRecord {
    email: String,
    primary: bool,
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    rate: RateRecord,
}

#[derive(Debug, Deserialize)]
struct RateRecord {
    limit: u64,
    remaining: u64,
    reset: u64,
}

impl CommentHost for GithubHost {
    type Repo = GithubRepoClient;

    async fn lookup_user_id(&self, username: &str) -> Result<UserId, HostError> {
        let record: UserRecord = self
            .app
            .get(format!("/users/{username}"), None::<&()>)
            .await
            .map_err(|e| HostError::from_octocrab(e, &format!("user {username}")))?;
        Ok(UserId(record.id))
    }

    fn repo(&self, repo: &RepoId, token: &str) -> Result<Self::Repo, HostError> {
        let client = Self::user_client(token)?;
        Ok(GithubRepoClient {
            client,
            repo: repo.clone(),
        })
    }

    async fn authenticated_email(&self, token: &str) -> Result<String, HostError> {
        let client = Self::user_client(token)?;
        let emails: Vec<EmailRecord> = client
            .get("/user/emails", None::<&()>)
            .await
            .map_err(|e| HostError::from_octocrab(e, "authenticated user emails"))?;
        emails
            .iter()
            .find(|e| e.primary)
            .or_else(|| emails.first())
            .map(|e| e.email.clone())
            .ok_or_else(|| HostError::api("account has no email address"))
    }

    async fn rate_limit(&self) -> Result<RateLimit, HostError> {
        let response: RateLimitResponse = self
            .app
            .get("/rate_limit", None::<&()>)
            .await
            .map_err(|e| HostError::from_octocrab(e, "rate limit"))?;
        Ok(RateLimit {
            limit: response.rate.limit,
            remaining: response.rate.remaining,
            reset: response.rate.reset,
        })
    }
}

/// A GitHub client scoped to one repository with one user's credentials.
pub struct GithubRepoClient {
    client: Octocrab,
    repo: RepoId,
}

impl GithubRepoClient {
    fn owner(&self) -> &str {
        &self.repo.owner
    }

    fn repo_name(&self) -> &str {
        &self.repo.repo
    }
}

impl std::fmt::Debug for GithubRepoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubRepoClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct IdentityBody<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateFileBody<'a> {
    message: &'a str,
    content: &'a str,
    sha: &'a str,
    branch: &'a str,
    committer: IdentityBody<'a>,
    author: IdentityBody<'a>,
}

impl RepoHost for GithubRepoClient {
    async fn file(&self, path: &str, reference: &str) -> Result<RemoteFile, HostError> {
        let context = format!("{} at {}:{}", self.repo, reference, path);
        let contents = self
            .client
            .repos(self.owner(), self.repo_name())
            .get_content()
            .path(path)
            .r#ref(reference)
            .send()
            .await
            .map_err(|e| HostError::from_octocrab(e, &context))?;

        let mut items = contents.items;
        if items.len() > 1 {
            // A multi-entry listing means the path resolved to a directory.
            return Err(HostError::NotAFile {
                name: file_name_of(path).to_string(),
                kind: "dir".to_string(),
            });
        }
        let item = items.pop().ok_or_else(|| HostError::NotFound(context))?;

        if item.r#type != "file" {
            return Err(HostError::NotAFile {
                name: item.name,
                kind: item.r#type,
            });
        }

        let content = item
            .content
            .ok_or_else(|| HostError::api(format!("no content returned for {path}")))?;
        Ok(RemoteFile {
            name: item.name,
            content,
            sha: Sha::new(item.sha),
        })
    }

    async fn branch_head(&self, branch: &str) -> Result<Sha, HostError> {
        use octocrab::models::repos::Object;

        let context = format!("branch {branch} of {}", self.repo);
        let reference = self
            .client
            .repos(self.owner(), self.repo_name())
            .get_ref(&Reference::Branch(branch.to_string()))
            .await
            .map_err(|e| HostError::from_octocrab(e, &context))?;

        match reference.object {
            Object::Commit { sha, .. } => Ok(Sha::new(sha)),
            Object::Tag { sha, .. } => Ok(Sha::new(sha)),
            _ => Err(HostError::api(format!(
                "ref for {branch} does not point at a commit"
            ))),
        }
    }

    async fn create_branch(&self, branch: &str, from: &Sha) -> Result<(), HostError> {
        let context = format!("creating branch {branch} of {}", self.repo);
        self.client
            .repos(self.owner(), self.repo_name())
            .create_ref(&Reference::Branch(branch.to_string()), from.as_str())
            .await
            .map_err(|e| HostError::from_octocrab(e, &context))?;
        Ok(())
    }

    async fn update_file(&self, update: FileUpdate<'_>) -> Result<(), HostError> {
        let context = format!(
            "updating {} on {}:{}",
            update.path, self.repo, update.branch
        );
        let body = UpdateFileBody {
            message: &update.message,
            content: &update.content,
            sha: update.expected.as_str(),
            branch: update.branch,
            committer: IdentityBody {
                name: &update.identity.name,
                email: &update.identity.email,
            },
            author: IdentityBody {
                name: &update.identity.name,
                email: &update.identity.email,
            },
        };
        let route = format!(
            "/repos/{}/{}/contents/{}",
            self.owner(),
            self.repo_name(),
            update.path
        );
        let _: serde_json::Value = self
            .client
            .put(route, Some(&body))
            .await
            .map_err(|e| HostError::from_octocrab(e, &context))?;
        Ok(())
    }

    async fn list_review_requests(
        &self,
        base: &str,
        head: &str,
    ) -> Result<Vec<ReviewRequest>, HostError> {
        let context = format!("listing review requests {head} -> {base} in {}", self.repo);
        let page = self
            .client
            .pulls(self.owner(), self.repo_name())
            .list()
            .base(base)
            .head(format!("{}:{}", self.owner(), head))
            .per_page(30)
            .send()
            .await
            .map_err(|e| HostError::from_octocrab(e, &context))?;

        Ok(page
            .items
            .into_iter()
            .map(|pull| ReviewRequest {
                number: pull.number,
                head_ref: pull.head.ref_field.clone(),
                base_ref: pull.base.ref_field.clone(),
            })
            .collect())
    }

    async fn create_review_request(
        &self,
        title: &str,
        body: &str,
        base: &str,
        head: &str,
    ) -> Result<ReviewRequest, HostError> {
        let context = format!("creating review request {head} -> {base} in {}", self.repo);
        let pull = self
            .client
            .pulls(self.owner(), self.repo_name())
            .create(title, head, base)
            .body(body)
            .send()
            .await
            .map_err(|e| HostError::from_octocrab(e, &context))?;

        Ok(ReviewRequest {
            number: pull.number,
            head_ref: pull.head.ref_field.clone(),
            base_ref: pull.base.ref_field.clone(),
        })
    }

    async fn comment_on_review_request(&self, number: u64, body: &str) -> Result<(), HostError> {
        let context = format!("commenting on review request #{number} in {}", self.repo);
        self.client
            .issues(self.owner(), self.repo_name())
            .create_comment(number, body)
            .await
            .map_err(|e| HostError::from_octocrab(e, &context))?;
        Ok(())
    }
}

fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_of_strips_directories() {
        assert_eq!(file_name_of("_posts/2015/hello.md"), "hello.md");
        assert_eq!(file_name_of("hello.md"), "hello.md");
    }
}
