/// Persistence collaborator for accounts and refresh tokens.
///
/// The session core only ever talks to [`AuthStore`]; atomicity of every
/// individual call (notably the revoke transition) is the implementation's
/// responsibility. Two backends are provided:
/// - `PgStore` over a sqlx Postgres pool
/// - `InMemoryStore` behind a tokio mutex, for tests and local runs

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;

/// A registered account as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    /// Set once the payment provider reports a completed upgrade.
    pub is_chirpy_red: bool,
}

/// Insert payload for a freshly issued refresh token.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    /// SHA-256 hex digest of the transport value.
    pub token_hash: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Persisted refresh token.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Computed lifecycle state of a refresh token.
///
/// `Revoked` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenStatus {
    Active,
    Revoked,
    Expired,
}

impl RefreshTokenRecord {
    pub fn status_at(&self, now: DateTime<Utc>) -> RefreshTokenStatus {
        if self.revoked_at.is_some() {
            RefreshTokenStatus::Revoked
        } else if now >= self.expires_at {
            RefreshTokenStatus::Expired
        } else {
            RefreshTokenStatus::Active
        }
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == RefreshTokenStatus::Active
    }
}

/// Storage contract consumed by the session core.
///
/// Every call may block and is independently ordered with respect to
/// concurrent requests.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn create_account(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<Account, StoreError>;

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn create_refresh_token(&self, token: NewRefreshToken) -> Result<(), StoreError>;

    async fn get_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Idempotent. An existing revocation time is kept and unknown tokens
    /// are ignored.
    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Marks the account as upgraded. Repeat upgrades succeed.
    ///
    /// Fails with [`StoreError::AccountNotFound`] for an unknown id.
    async fn upgrade_account(&self, id: Uuid) -> Result<(), StoreError>;

    /// Deletes every account and, with them, every refresh token.
    async fn reset(&self) -> Result<(), StoreError>;
}
