//! One-time CSRF tokens for the comment form.
//!
//! The widget fetches a token, then submits it with the comment. Tokens are
//! single-use and short-lived; consuming one removes it whether or not it
//! was still valid.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

/// Issues and validates one-time tokens.
pub struct CsrfStore {
    tokens: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
}

impl CsrfStore {
    /// How long an issued token stays valid.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

    pub fn new(ttl: Duration) -> Self {
        CsrfStore {
            tokens: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Issues a fresh token, dropping any expired ones.
    pub async fn issue(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let now = Instant::now();
        let mut tokens = self.tokens.lock().await;
        tokens.retain(|_, deadline| *deadline > now);
        tokens.insert(token.clone(), now + self.ttl);
        token
    }

    /// Consumes a token; true when it existed and had not expired.
    pub async fn consume(&self, token: &str) -> bool {
        let mut tokens = self.tokens.lock().await;
        match tokens.remove(token) {
            Some(deadline) => deadline > Instant::now(),
            None => false,
        }
    }
}

impl Default for CsrfStore {
    fn default() -> Self {
        CsrfStore::new(Self::DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_is_consumed_once() {
        let store = CsrfStore::default();
        let token = store.issue().await;
        assert!(store.consume(&token).await);
        assert!(!store.consume(&token).await);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let store = CsrfStore::default();
        assert!(!store.consume("not-a-token").await);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let store = CsrfStore::new(Duration::ZERO);
        let token = store.issue().await;
        assert!(!store.consume(&token).await);
    }
}
