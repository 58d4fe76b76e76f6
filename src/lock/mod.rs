//! Named, timeout-bounded mutual exclusion keyed by repository.
//!
//! Two concurrent comments on the same repository must not race on branch
//! creation or on the read-modify-write of the comment file, so pipeline runs
//! are serialized per repository key. Unrelated repositories share nothing
//! remotely mutable and proceed fully concurrently, which is why the lock is
//! per-key and not global.
//!
//! The guard is scoped: it is dropped on every exit path (success, error or
//! cancellation of the critical section's future), so a failed run can never
//! leave a repository wedged.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Acquisition of the repository lock timed out: the repository has been busy
/// for longer than the bounded wait.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("timed out waiting for the lock on {key}")]
pub struct LockTimeout {
    pub key: String,
}

/// A map of named async mutexes with bounded-wait acquisition.
pub struct RepoLocks {
    entries: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    acquire_timeout: Duration,
}

impl RepoLocks {
    /// Default bounded wait for acquisition.
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(acquire_timeout: Duration) -> Self {
        RepoLocks {
            entries: Mutex::new(HashMap::new()),
            acquire_timeout,
        }
    }

    /// Runs `critical` while holding the lock for `key`.
    ///
    /// Waits at most the configured acquisition timeout for the lock; on
    /// expiry the critical section never starts and [`LockTimeout`] is
    /// returned. The guard is released when the critical section's future
    /// completes or is dropped.
    pub async fn with_lock<F>(&self, key: &str, critical: F) -> Result<F::Output, LockTimeout>
    where
        F: Future,
    {
        let entry = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(key.to_string()).or_default())
        };

        let guard = tokio::time::timeout(self.acquire_timeout, entry.lock_owned())
            .await
            .map_err(|_| LockTimeout {
                key: key.to_string(),
            })?;
        debug!(key, "repository lock acquired");

        let output = critical.await;

        drop(guard);
        debug!(key, "repository lock released");
        Ok(output)
    }
}

impl Default for RepoLocks {
    fn default() -> Self {
        RepoLocks::new(Self::DEFAULT_ACQUIRE_TIMEOUT)
    }
}
