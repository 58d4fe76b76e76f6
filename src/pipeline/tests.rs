//! State-machine tests for the comment pipeline, driven by the scripted
//! mock host.

use std::sync::Arc;
use std::time::Duration;

use crate::accounts::MemoryAccountStore;
use crate::github::CommitIdentity;
use crate::lock::RepoLocks;
use crate::test_utils::{MockFailure, MockHost, MockOp};
use crate::types::{Commenter, CommenterKind, Page, PageTarget, Settings, User, UserId};

use super::{CommentCounter, CommentError, CommentPipeline, CommentRequest, Outcome};

const OWNER: &str = "octocat";
const SITE_REPO: &str = "octocat.github.io";
const POST_PATH: &str = "_posts/hello.md";
const POST: &str = "---\ntitle: Hello\n---\n\nPost body.\n";
const COMMENT_BRANCH: &str = "master_comments__posts/hello.md";

fn post_page() -> Page {
    // A user site publishes from master.
    Page::new(
        OWNER,
        SITE_REPO,
        PageTarget::FrontMatter {
            path: POST_PATH.into(),
        },
    )
}

fn seeded_host() -> MockHost {
    let host = MockHost::new();
    host.seed_user(OWNER, 77);
    host.seed_branch("master", "abc123");
    host.seed_file("master", POST_PATH, POST);
    host
}

async fn store_with(settings: Settings) -> MemoryAccountStore {
    let store = MemoryAccountStore::new();
    store
        .insert(User {
            id: UserId(77),
            username: OWNER.into(),
            email: "octocat@example.com".into(),
            token: "gho_tok".into(),
            picture: "https://example.com/p.png".into(),
            settings,
        })
        .await;
    store
}

fn pipeline(
    host: MockHost,
    store: MemoryAccountStore,
) -> CommentPipeline<MockHost, MemoryAccountStore> {
    CommentPipeline::new(
        host,
        store,
        RepoLocks::new(Duration::from_secs(1)),
        CommentCounter::new(),
        CommitIdentity {
            name: "Comment Bot".into(),
            email: "bot@example.com".into(),
        },
        Duration::from_secs(5),
    )
}

fn request(page: Page) -> CommentRequest {
    CommentRequest {
        username: OWNER.into(),
        page,
        author: Commenter::new(
            CommenterKind::Github,
            "visitor",
            Some("https://github.com/visitor".into()),
            None,
        ),
        content: "great post!".into(),
    }
}

#[tokio::test]
async fn per_file_review_creates_branch_and_review_request() {
    let host = seeded_host();
    let pipeline = pipeline(host.clone(), store_with(Settings::default()).await);

    let outcome = pipeline.submit(request(post_page())).await.unwrap();
    assert_eq!(outcome, Outcome::Pending);

    // The comment branch was created from master, exactly once.
    assert!(host.branch_exists(COMMENT_BRANCH));
    assert_eq!(host.calls_for("create_branch").len(), 1);

    // The commit landed on the comment branch with the read revision token
    // and the service identity.
    let updates = host.updates();
    assert_eq!(updates.len(), 1);
    let update = &updates[0];
    assert_eq!(update.branch, COMMENT_BRANCH);
    assert_eq!(update.path, POST_PATH);
    assert_eq!(
        update.message,
        "Comment by visitor (https://github.com/visitor)"
    );
    assert_eq!(update.identity_name, "Comment Bot");
    assert!(update.text.contains("great post!"));
    assert!(update.text.ends_with("\nPost body.\n"));

    // No review request matched, so a new one was opened, titled with the
    // target path.
    let creates = host.calls_for("create_review");
    assert_eq!(creates.len(), 1);
    assert!(creates[0].contains(POST_PATH));
    let reviews = host.reviews();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].head_ref, COMMENT_BRANCH);
    assert_eq!(reviews[0].base_ref, "master");

    assert_eq!(pipeline.counter().get(), 1);
}

#[tokio::test]
async fn master_policy_commits_directly_with_no_branch_check() {
    let host = seeded_host();
    let settings = Settings {
        master: true,
        group: false,
    };
    let pipeline = pipeline(host.clone(), store_with(settings).await);

    let outcome = pipeline.submit(request(post_page())).await.unwrap();
    assert_eq!(outcome, Outcome::Committed);

    // Fast path: no branch existence check, no creation, no review step,
    // and only the single read on the published branch.
    assert!(host.calls_for("branch_head").is_empty());
    assert!(host.calls_for("create_branch").is_empty());
    assert!(host.calls_for("list_reviews").is_empty());
    assert_eq!(host.calls_for("file").len(), 1);

    let updates = host.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].branch, "master");
}

#[tokio::test]
async fn grouped_policy_shares_one_comment_branch() {
    let host = seeded_host();
    let settings = Settings {
        master: false,
        group: true,
    };
    let pipeline = pipeline(host.clone(), store_with(settings).await);

    let outcome = pipeline.submit(request(post_page())).await.unwrap();
    assert_eq!(outcome, Outcome::Pending);
    assert!(host.branch_exists("master_comments"));
    assert_eq!(host.updates()[0].branch, "master_comments");
}

#[tokio::test]
async fn unregistered_username_fails_before_repo_work() {
    let host = seeded_host();
    // Account store knows nobody.
    let pipeline = pipeline(host.clone(), MemoryAccountStore::new());

    let err = pipeline.submit(request(post_page())).await.unwrap_err();
    assert!(matches!(err, CommentError::NotRegistered(name) if name == OWNER));
    assert!(host.calls_for("file").is_empty());
    assert_eq!(pipeline.counter().get(), 0);
}

#[tokio::test]
async fn missing_source_file_is_not_found() {
    let host = MockHost::new();
    host.seed_user(OWNER, 77);
    host.seed_branch("master", "abc123");
    // No file seeded: nothing to comment on.
    let pipeline = pipeline(host.clone(), store_with(Settings::default()).await);

    let err = pipeline.submit(request(post_page())).await.unwrap_err();
    assert!(matches!(err, CommentError::NotFound));
    // Failed during resolution, before any branch work.
    assert!(host.calls_for("branch_head").is_empty());
}

#[tokio::test]
async fn directory_path_is_not_a_file() {
    let host = seeded_host();
    // Source check passes on the origin branch; the read on the comment
    // branch resolves to a directory.
    host.fail_on_nth(MockOp::File, 1, MockFailure::NotAFile);
    let pipeline = pipeline(host.clone(), store_with(Settings::default()).await);

    let err = pipeline.submit(request(post_page())).await.unwrap_err();
    assert!(matches!(err, CommentError::NotAFile { .. }));
    assert!(host.updates().is_empty());
}

#[tokio::test]
async fn file_without_front_matter_is_malformed() {
    let host = MockHost::new();
    host.seed_user(OWNER, 77);
    host.seed_branch("master", "abc123");
    host.seed_file("master", POST_PATH, "Just a plain file.\n");
    let pipeline = pipeline(host.clone(), store_with(Settings::default()).await);

    let err = pipeline.submit(request(post_page())).await.unwrap_err();
    assert!(matches!(err, CommentError::MalformedFile));
    assert!(host.updates().is_empty());
}

#[tokio::test]
async fn keyed_document_mode_edits_the_data_file() {
    let host = MockHost::new();
    host.seed_user(OWNER, 77);
    host.seed_branch("master", "abc123");
    host.seed_file("master", "_data/comments.yml", "");
    let settings = Settings {
        master: true,
        group: false,
    };
    let pipeline = pipeline(host.clone(), store_with(settings).await);

    let page = Page::new(
        OWNER,
        SITE_REPO,
        PageTarget::from_parts(None, Some("about".into()), None).unwrap(),
    );
    let outcome = pipeline.submit(request(page)).await.unwrap();
    assert_eq!(outcome, Outcome::Committed);

    let updates = host.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].path, "_data/comments.yml");
    let document: serde_yaml::Value = serde_yaml::from_str(&updates[0].text).unwrap();
    assert_eq!(
        document["about"].as_sequence().map(|s| s.len()),
        Some(1)
    );
}

#[tokio::test]
async fn stale_revision_token_is_a_fatal_conflict() {
    let host = seeded_host();
    host.fail_on(MockOp::UpdateFile, MockFailure::Conflict);
    let pipeline = pipeline(host.clone(), store_with(Settings::default()).await);

    let err = pipeline.submit(request(post_page())).await.unwrap_err();
    assert!(matches!(err, CommentError::RevisionConflict));
    // The run aborted: no review request work, no counter bump.
    assert!(host.calls_for("list_reviews").is_empty());
    assert_eq!(pipeline.counter().get(), 0);
}

#[tokio::test]
async fn existing_review_request_gets_a_note_appended() {
    let host = seeded_host();
    host.seed_branch(COMMENT_BRANCH, "abc123");
    host.seed_file(COMMENT_BRANCH, POST_PATH, POST);
    host.seed_review(4, COMMENT_BRANCH, "master");
    let pipeline = pipeline(host.clone(), store_with(Settings::default()).await);

    let outcome = pipeline.submit(request(post_page())).await.unwrap();
    assert_eq!(outcome, Outcome::Pending);

    assert!(host.calls_for("create_review").is_empty());
    let notes = host.review_comments();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, 4);
    assert!(notes[0].1.contains("**Author:** visitor"));
    assert!(notes[0].1.contains("**Content:** great post!"));
}

#[tokio::test]
async fn mismatched_review_request_is_not_reused() {
    let host = seeded_host();
    host.seed_branch(COMMENT_BRANCH, "abc123");
    host.seed_file(COMMENT_BRANCH, POST_PATH, POST);
    // Same repository, but a review request for some other branch pair.
    host.seed_review(9, "feature", "master");
    let pipeline = pipeline(host.clone(), store_with(Settings::default()).await);

    pipeline.submit(request(post_page())).await.unwrap();

    assert!(host.review_comments().is_empty());
    assert_eq!(host.calls_for("create_review").len(), 1);
}

#[tokio::test]
async fn failures_at_each_state_release_the_lock_and_stop_the_run() {
    // (planted op, calls to let through, evidence the run stopped there)
    let stages: [(MockOp, usize, &str); 4] = [
        (MockOp::BranchHead, 0, "update_file"), // Resolving
        (MockOp::File, 1, "update_file"),       // Reading
        (MockOp::UpdateFile, 0, "list_reviews"), // Committing
        (MockOp::ListReviews, 0, "create_review"), // Reviewing
    ];

    for (op, skip, never_reached) in stages {
        let host = seeded_host();
        host.fail_on_nth(op, skip, MockFailure::Api);
        let pipeline = pipeline(host.clone(), store_with(Settings::default()).await);

        let err = pipeline.submit(request(post_page())).await.unwrap_err();
        assert!(
            matches!(err, CommentError::Host(_)),
            "stage {op:?}: unexpected error {err:?}"
        );
        assert!(
            host.calls_for(never_reached).is_empty(),
            "stage {op:?}: pipeline advanced past the failure"
        );
        assert_eq!(pipeline.counter().get(), 0);

        // The planted failure is consumed, so a retry proves the lock was
        // released by the failing run.
        let outcome = pipeline.submit(request(post_page())).await.unwrap();
        assert_eq!(outcome, Outcome::Pending, "stage {op:?}: retry failed");
    }
}

#[tokio::test]
async fn concurrent_submissions_serialize_and_create_one_branch() {
    let host = seeded_host();
    let pipeline = Arc::new(pipeline(host.clone(), store_with(Settings::default()).await));

    let first = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.submit(request(post_page())).await }
    });
    let second = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.submit(request(post_page())).await }
    });

    assert_eq!(first.await.unwrap().unwrap(), Outcome::Pending);
    assert_eq!(second.await.unwrap().unwrap(), Outcome::Pending);

    // Exactly one branch creation despite two racing submissions.
    assert_eq!(host.calls_for("create_branch").len(), 1);

    // Serialized read-modify-write: the later run read the earlier run's
    // revision, so its write carries both comments.
    let updates = host.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1].text.matches("great post!").count(), 2);
    assert_eq!(pipeline.counter().get(), 2);
}
