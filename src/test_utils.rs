//! Shared test utilities: a scripted in-memory host.
//!
//! `MockHost` implements both host traits over one shared state cell. Tests
//! seed users, branches and files, optionally plant a failure at a specific
//! operation, and afterwards inspect the recorded call log and writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::codec::transport;
use crate::github::{
    CommentHost, FileUpdate, HostError, RateLimit, RemoteFile, RepoHost, ReviewRequest,
};
use crate::types::{RepoId, Sha, UserId};

/// Operations a failure can be planted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    LookupUser,
    File,
    BranchHead,
    CreateBranch,
    UpdateFile,
    ListReviews,
    CreateReview,
    CommentReview,
}

/// The kind of failure to inject.
#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    NotFound,
    NotAFile,
    Conflict,
    Api,
}

impl MockFailure {
    fn to_error(self, context: &str) -> HostError {
        match self {
            MockFailure::NotFound => HostError::NotFound(context.to_string()),
            MockFailure::NotAFile => HostError::NotAFile {
                name: context.to_string(),
                kind: "dir".to_string(),
            },
            MockFailure::Conflict => HostError::Conflict(context.to_string()),
            MockFailure::Api => HostError::api(format!("injected failure at {context}")),
        }
    }
}

struct FailPlan {
    op: MockOp,
    /// Matching calls to let through before failing.
    skip: usize,
    failure: MockFailure,
}

/// One recorded `update_file` call.
#[derive(Debug, Clone)]
pub struct RecordedUpdate {
    pub path: String,
    pub branch: String,
    /// Decoded text of the committed content.
    pub text: String,
    pub message: String,
    pub expected: Sha,
    pub identity_name: String,
}

#[derive(Default)]
struct MockHostState {
    user_ids: HashMap<String, u64>,
    /// (branch, path) -> file
    files: HashMap<(String, String), RemoteFile>,
    branches: HashMap<String, Sha>,
    reviews: Vec<ReviewRequest>,
    fail_plans: Vec<FailPlan>,
    calls: Vec<String>,
    updates: Vec<RecordedUpdate>,
    review_comments: Vec<(u64, String)>,
    next_review_number: u64,
    next_blob: u64,
}

/// A scripted host implementing both host traits.
#[derive(Clone, Default)]
pub struct MockHost {
    state: Arc<Mutex<MockHostState>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, username: &str, id: u64) {
        self.lock().user_ids.insert(username.to_string(), id);
    }

    pub fn seed_branch(&self, branch: &str, sha: &str) {
        self.lock()
            .branches
            .insert(branch.to_string(), Sha::new(sha));
    }

    /// Stores a file, transport-encoding `text`, and returns its blob SHA.
    pub fn seed_file(&self, branch: &str, path: &str, text: &str) -> Sha {
        let mut state = self.lock();
        state.next_blob += 1;
        let sha = Sha::new(format!("blob{}", state.next_blob));
        state.files.insert(
            (branch.to_string(), path.to_string()),
            RemoteFile {
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                content: transport::encode(text),
                sha: sha.clone(),
            },
        );
        sha
    }

    pub fn seed_review(&self, number: u64, head: &str, base: &str) {
        let mut state = self.lock();
        state.next_review_number = state.next_review_number.max(number);
        state.reviews.push(ReviewRequest {
            number,
            head_ref: head.to_string(),
            base_ref: base.to_string(),
        });
    }

    /// Fails the next matching call.
    pub fn fail_on(&self, op: MockOp, failure: MockFailure) {
        self.fail_on_nth(op, 0, failure);
    }

    /// Fails the matching call after letting `skip` of them through.
    pub fn fail_on_nth(&self, op: MockOp, skip: usize, failure: MockFailure) {
        self.lock().fail_plans.push(FailPlan { op, skip, failure });
    }

    pub fn clear_failures(&self) {
        self.lock().fail_plans.clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn calls_for(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.lock().updates.clone()
    }

    pub fn reviews(&self) -> Vec<ReviewRequest> {
        self.lock().reviews.clone()
    }

    pub fn review_comments(&self) -> Vec<(u64, String)> {
        self.lock().review_comments.clone()
    }

    pub fn branch_exists(&self, branch: &str) -> bool {
        self.lock().branches.contains_key(branch)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockHostState> {
        self.state.lock().unwrap()
    }

    /// Records the call, then returns the planted failure if one matches.
    fn observe(&self, op: MockOp, call: String) -> Result<(), HostError> {
        let mut state = self.lock();
        state.calls.push(call.clone());
        if let Some(index) = state.fail_plans.iter().position(|plan| plan.op == op) {
            if state.fail_plans[index].skip > 0 {
                state.fail_plans[index].skip -= 1;
                return Ok(());
            }
            let plan = state.fail_plans.remove(index);
            return Err(plan.failure.to_error(&call));
        }
        Ok(())
    }
}

impl CommentHost for MockHost {
    type Repo = MockHost;

    async fn lookup_user_id(&self, username: &str) -> Result<UserId, HostError> {
        self.observe(MockOp::LookupUser, format!("lookup_user {username}"))?;
        self.lock()
            .user_ids
            .get(username)
            .map(|id| UserId(*id))
            .ok_or_else(|| HostError::NotFound(format!("user {username}")))
    }

    fn repo(&self, repo: &RepoId, token: &str) -> Result<Self::Repo, HostError> {
        self.lock().calls.push(format!("repo {repo} as {token}"));
        Ok(self.clone())
    }

    async fn authenticated_email(&self, _token: &str) -> Result<String, HostError> {
        Ok("commenter@example.com".to_string())
    }

    async fn rate_limit(&self) -> Result<RateLimit, HostError> {
        Ok(RateLimit {
            limit: 5000,
            remaining: 4999,
            reset: 0,
        })
    }
}

impl RepoHost for MockHost {
    async fn file(&self, path: &str, reference: &str) -> Result<RemoteFile, HostError> {
        self.observe(MockOp::File, format!("file {path}@{reference}"))?;
        self.lock()
            .files
            .get(&(reference.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("{path}@{reference}")))
    }

    async fn branch_head(&self, branch: &str) -> Result<Sha, HostError> {
        self.observe(MockOp::BranchHead, format!("branch_head {branch}"))?;
        self.lock()
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("branch {branch}")))
    }

    async fn create_branch(&self, branch: &str, from: &Sha) -> Result<(), HostError> {
        self.observe(MockOp::CreateBranch, format!("create_branch {branch}"))?;
        let mut state = self.lock();
        state.branches.insert(branch.to_string(), from.clone());
        // Files visible on the origin branch become visible on the new one.
        let origin = state
            .branches
            .iter()
            .find(|(name, sha)| **sha == *from && name.as_str() != branch)
            .map(|(name, _)| name.clone());
        if let Some(origin) = origin {
            let copied: Vec<((String, String), RemoteFile)> = state
                .files
                .iter()
                .filter(|((b, _), _)| *b == origin)
                .map(|((_, p), f)| ((branch.to_string(), p.clone()), f.clone()))
                .collect();
            state.files.extend(copied);
        }
        Ok(())
    }

    async fn update_file(&self, update: FileUpdate<'_>) -> Result<(), HostError> {
        self.observe(
            MockOp::UpdateFile,
            format!("update_file {}@{}", update.path, update.branch),
        )?;
        let text = transport::decode(&update.content).expect("mock received invalid transport");
        let mut state = self.lock();
        state.updates.push(RecordedUpdate {
            path: update.path.to_string(),
            branch: update.branch.to_string(),
            text,
            message: update.message.clone(),
            expected: update.expected.clone(),
            identity_name: update.identity.name.clone(),
        });
        // Write back so a later fetch on the same branch sees the new
        // revision, like the real contents API.
        state.next_blob += 1;
        let sha = Sha::new(format!("blob{}", state.next_blob));
        state.files.insert(
            (update.branch.to_string(), update.path.to_string()),
            RemoteFile {
                name: update
                    .path
                    .rsplit('/')
                    .next()
                    .unwrap_or(update.path)
                    .to_string(),
                content: update.content.clone(),
                sha,
            },
        );
        Ok(())
    }

    async fn list_review_requests(
        &self,
        base: &str,
        head: &str,
    ) -> Result<Vec<ReviewRequest>, HostError> {
        self.observe(MockOp::ListReviews, format!("list_reviews {head}->{base}"))?;
        Ok(self.lock().reviews.clone())
    }

    async fn create_review_request(
        &self,
        title: &str,
        _body: &str,
        base: &str,
        head: &str,
    ) -> Result<ReviewRequest, HostError> {
        self.observe(
            MockOp::CreateReview,
            format!("create_review {head}->{base} titled {title}"),
        )?;
        let mut state = self.lock();
        state.next_review_number += 1;
        let review = ReviewRequest {
            number: state.next_review_number,
            head_ref: head.to_string(),
            base_ref: base.to_string(),
        };
        state.reviews.push(review.clone());
        Ok(review)
    }

    async fn comment_on_review_request(&self, number: u64, body: &str) -> Result<(), HostError> {
        self.observe(MockOp::CommentReview, format!("comment_review #{number}"))?;
        self.lock()
            .review_comments
            .push((number, body.to_string()));
        Ok(())
    }
}
