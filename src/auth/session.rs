/// Session lifecycle: register, login, refresh, revoke.
///
/// Per refresh token: `active -> revoked` or `active -> expired`, both
/// terminal. Expiry is computed from the record, never written. The
/// manager holds no mutable state of its own; all shared state lives behind
/// [`AuthStore`].

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Utc};
use lazy_static::lazy_static;
use uuid::Uuid;

use crate::auth::{
    extract_bearer, find_refresh_token, generate_refresh_token, hash_password,
    issue_access_token, revoke_refresh_token, save_refresh_token, validate_access_token,
    verify_password,
};
use crate::error::{AppError, AuthError};
use crate::store::{Account, AuthStore, RefreshTokenStatus};

/// Access token lifetime when the caller does not ask for one, and the
/// longest lifetime a caller may ask for.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

lazy_static! {
    // Verified against when the email is unknown so both login failures cost
    // one bcrypt verify.
    static ref ABSENT_ACCOUNT_HASH: Option<String> =
        hash_password("chirpy-absent-account").ok();
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: Account,
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates the credential hasher, token codec and refresh token store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AuthStore>,
    /// Read-only signing secret, loaded once at startup.
    secret: String,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn AuthStore>, secret: impl Into<String>) -> Self {
        Self {
            store,
            secret: secret.into(),
        }
    }

    pub fn store(&self) -> &dyn AuthStore {
        self.store.as_ref()
    }

    /// Hash the password and create an account.
    pub async fn register(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let hashed = hash_password(password)?;
        let account = self.store.create_account(email, &hashed).await?;

        tracing::info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    /// Verify credentials and issue an access token plus a new refresh token.
    ///
    /// `expires_in` of `None` or not positive falls back to one hour, and
    /// anything longer is capped at one hour. Unknown email and wrong password
    /// both fail with `Unauthenticated`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        expires_in: Option<Duration>,
    ) -> Result<LoginOutcome, AppError> {
        let account = match self.store.get_account_by_email(email).await? {
            Some(account) => account,
            None => {
                if let Some(hashed) = ABSENT_ACCOUNT_HASH.as_deref() {
                    let _ = verify_password(password, hashed);
                }
                tracing::warn!("Login rejected: unknown email");
                return Err(AuthError::Unauthenticated.into());
            }
        };

        if !verify_password(password, &account.hashed_password)? {
            tracing::warn!(account_id = %account.id, "Login rejected: wrong password");
            return Err(AuthError::Unauthenticated.into());
        }

        let ttl = access_token_ttl(expires_in);
        let access_token = issue_access_token(account.id, &self.secret, ttl)?;

        let refresh_token = generate_refresh_token()?;
        save_refresh_token(self.store.as_ref(), &refresh_token, account.id, Utc::now()).await?;

        tracing::info!(account_id = %account.id, "Account logged in");
        Ok(LoginOutcome {
            account,
            access_token,
            refresh_token,
        })
    }

    /// Mint a new access token from a usable refresh token.
    ///
    /// The refresh token itself is left untouched. Unknown, expired and
    /// revoked tokens all fail with `Unauthenticated`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let record = match find_refresh_token(self.store.as_ref(), refresh_token).await? {
            Some(record) => record,
            None => {
                tracing::warn!("Refresh rejected: unknown token");
                return Err(AuthError::Unauthenticated.into());
            }
        };

        match record.status_at(Utc::now()) {
            RefreshTokenStatus::Active => {}
            status => {
                tracing::warn!(account_id = %record.account_id, ?status, "Refresh rejected");
                return Err(AuthError::Unauthenticated.into());
            }
        }

        let access_token = issue_access_token(
            record.account_id,
            &self.secret,
            Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
        )?;

        tracing::info!(account_id = %record.account_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke a refresh token. Succeeds for unknown and already revoked tokens.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        revoke_refresh_token(self.store.as_ref(), refresh_token).await?;
        tracing::info!("Refresh token revoked");
        Ok(())
    }

    /// Validate an access token and return the account it was issued to.
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid, AuthError> {
        validate_access_token(access_token, &self.secret)
    }

    /// `refresh` with the token taken from an `Authorization: Bearer` header.
    pub async fn refresh_from_headers(
        &self,
        headers: &actix_web::http::header::HeaderMap,
    ) -> Result<String, AppError> {
        let token = extract_bearer(headers)?;
        self.refresh(token).await
    }

    /// `revoke` with the token taken from an `Authorization: Bearer` header.
    pub async fn revoke_from_headers(
        &self,
        headers: &actix_web::http::header::HeaderMap,
    ) -> Result<(), AppError> {
        let token = extract_bearer(headers)?;
        self.revoke(token).await
    }
}

fn access_token_ttl(requested: Option<Duration>) -> Duration {
    let default = Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECONDS);
    match requested {
        Some(ttl) if ttl > Duration::zero() => ttl.min(default),
        _ => default,
    }
}
