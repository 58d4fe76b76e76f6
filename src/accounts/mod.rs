//! Account storage boundary.
//!
//! The pipeline only ever resolves accounts by platform id; the login layer
//! (out of scope here) drives the upsert lifecycle. The trait keeps the
//! datastore swappable: the in-memory implementation below serves a single
//! process; a persistent backend implements the same contract.

use std::collections::HashMap;
use std::future::Future;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::types::{Settings, User, UserId};

/// An error from the account store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// A login record with a missing field cannot be saved.
    #[error("cannot save invalid user record: missing {0}")]
    InvalidLogin(&'static str),

    /// A settings update referenced an account that does not exist.
    #[error("unknown account {0}")]
    UnknownAccount(UserId),
}

/// The fields a successful login provides.
///
/// `id` is the stable platform identity; the rest is refreshed on every
/// login.
#[derive(Debug, Clone)]
pub struct Login {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub token: String,
    pub picture: String,
}

impl Login {
    fn validate(&self) -> Result<(), AccountError> {
        if self.id.0 == 0 {
            return Err(AccountError::InvalidLogin("id"));
        }
        for (field, value) in [
            ("username", &self.username),
            ("email", &self.email),
            ("token", &self.token),
            ("picture", &self.picture),
        ] {
            if value.is_empty() {
                return Err(AccountError::InvalidLogin(field));
            }
        }
        Ok(())
    }
}

/// Which publishing option a settings update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsKey {
    Master,
    Group,
}

impl SettingsKey {
    /// Parses the option name used on the wire; anything else is unknown.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "master" => Some(SettingsKey::Master),
            "group" => Some(SettingsKey::Group),
            _ => None,
        }
    }
}

/// Storage for accounts owning write credentials.
pub trait AccountStore: Send + Sync + 'static {
    /// Resolves an account by its stable platform id.
    fn find_by_platform_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Option<User>> + Send;

    /// Creates or refreshes an account from a login.
    ///
    /// First login creates the account with default settings; later logins
    /// refresh username/email/token/picture but preserve settings. Stale
    /// rows holding the new username under a different id are removed
    /// (repair after a username change).
    fn upsert(&self, login: Login) -> impl Future<Output = Result<User, AccountError>> + Send;

    /// Flips one publishing option on an existing account.
    fn set_option(
        &self,
        id: UserId,
        key: SettingsKey,
        value: bool,
    ) -> impl Future<Output = Result<(), AccountError>> + Send;

    /// Number of registered accounts.
    fn count(&self) -> impl Future<Output = u64> + Send;
}

/// In-memory account store keyed by platform id.
#[derive(Default)]
pub struct MemoryAccountStore {
    users: RwLock<HashMap<u64, User>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account directly; used by tests and local setups.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.0, user);
    }
}

impl AccountStore for MemoryAccountStore {
    async fn find_by_platform_id(&self, id: UserId) -> Option<User> {
        self.users.read().await.get(&id.0).cloned()
    }

    async fn upsert(&self, login: Login) -> Result<User, AccountError> {
        login.validate()?;

        let mut users = self.users.write().await;
        let settings = match users.get(&login.id.0) {
            Some(existing) => existing.settings,
            None => {
                info!(username = %login.username, id = %login.id, "new user");
                Settings::default()
            }
        };

        let user = User {
            id: login.id,
            username: login.username,
            email: login.email,
            token: login.token,
            picture: login.picture,
            settings,
        };
        users.insert(user.id.0, user.clone());

        // A username freed by one user and claimed by another leaves stale
        // rows behind; the new login wins the name.
        users.retain(|id, other| *id == user.id.0 || other.username != user.username);

        info!(username = %user.username, id = %user.id, "user saved");
        Ok(user)
    }

    async fn set_option(
        &self,
        id: UserId,
        key: SettingsKey,
        value: bool,
    ) -> Result<(), AccountError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id.0)
            .ok_or(AccountError::UnknownAccount(id))?;
        match key {
            SettingsKey::Master => user.settings.master = value,
            SettingsKey::Group => user.settings.group = value,
        }
        info!(id = %id, ?key, value, "saved option");
        Ok(())
    }

    async fn count(&self) -> u64 {
        self.users.read().await.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(id: u64, username: &str) -> Login {
        Login {
            id: UserId(id),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            token: "gho_token".to_string(),
            picture: "https://example.com/p.png".to_string(),
        }
    }

    #[tokio::test]
    async fn first_login_gets_default_settings() {
        let store = MemoryAccountStore::new();
        let user = store.upsert(login(1, "octocat")).await.unwrap();
        assert_eq!(user.settings, Settings::default());
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn settings_survive_relogin() {
        let store = MemoryAccountStore::new();
        store.upsert(login(1, "octocat")).await.unwrap();
        store
            .set_option(UserId(1), SettingsKey::Master, true)
            .await
            .unwrap();

        let mut relogin = login(1, "octocat");
        relogin.token = "gho_newer".to_string();
        let user = store.upsert(relogin).await.unwrap();

        assert!(user.settings.master);
        assert_eq!(user.token, "gho_newer");
    }

    #[tokio::test]
    async fn username_change_repairs_stale_rows() {
        let store = MemoryAccountStore::new();
        // Old account held the name, then a different platform identity
        // claims it.
        store.upsert(login(1, "shared-name")).await.unwrap();
        store.upsert(login(2, "shared-name")).await.unwrap();

        assert_eq!(store.count().await, 1);
        assert!(store.find_by_platform_id(UserId(1)).await.is_none());
        assert!(store.find_by_platform_id(UserId(2)).await.is_some());
    }

    #[tokio::test]
    async fn invalid_login_is_rejected() {
        let store = MemoryAccountStore::new();
        let mut bad = login(1, "octocat");
        bad.email = String::new();
        assert_eq!(
            store.upsert(bad).await.unwrap_err(),
            AccountError::InvalidLogin("email")
        );
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn set_option_on_unknown_account_fails() {
        let store = MemoryAccountStore::new();
        assert_eq!(
            store
                .set_option(UserId(9), SettingsKey::Group, true)
                .await
                .unwrap_err(),
            AccountError::UnknownAccount(UserId(9))
        );
    }

    #[test]
    fn settings_key_parses_known_options_only() {
        assert_eq!(SettingsKey::parse("master"), Some(SettingsKey::Master));
        assert_eq!(SettingsKey::parse("group"), Some(SettingsKey::Group));
        assert_eq!(SettingsKey::parse("anonymous"), None);
    }
}
