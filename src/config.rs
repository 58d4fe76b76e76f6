//! Process configuration, read once from the environment at startup and
//! owned by the entry point.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::github::CommitIdentity;

/// OAuth application credentials for the platform API.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: String,
}

/// Everything the process needs to run.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub github: GithubConfig,
    /// Service identity recorded on comment commits.
    pub identity: CommitIdentity,
    /// Bounded wait for the per-repository lock.
    pub lock_acquire_timeout: Duration,
    /// Bound on one whole submission, lock hold included.
    pub submission_timeout: Duration,
    /// Cap on comment length, in characters.
    pub max_content_len: usize,
}

/// A configuration problem worth refusing to start over.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            listen_addr: parsed("COMMENT_BOT_LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            github: GithubConfig {
                client_id: required("GITHUB_CLIENT_ID")?,
                client_secret: required("GITHUB_CLIENT_SECRET")?,
            },
            identity: CommitIdentity {
                name: optional("COMMENT_BOT_COMMIT_NAME", "Comment Bot"),
                email: optional("COMMENT_BOT_COMMIT_EMAIL", "comments@example.com"),
            },
            lock_acquire_timeout: Duration::from_secs(parsed(
                "COMMENT_BOT_LOCK_TIMEOUT_SECS",
                5u64,
            )?),
            submission_timeout: Duration::from_secs(parsed(
                "COMMENT_BOT_SUBMISSION_TIMEOUT_SECS",
                30u64,
            )?),
            max_content_len: parsed("COMMENT_BOT_MAX_CONTENT_LEN", 10_000usize)?,
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::Missing(var))
}

fn optional(var: &'static str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parsed<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
