/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 bytes from the OS CSPRNG, hex-encoded to 64 characters
/// - Hashed with SHA-256 before storage (never store plaintext)
/// - Valid for a fixed 60 days from issue, until revoked
/// - Reused until revoked or expired (no rotation)

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{CryptoError, StoreError};
use crate::store::{AuthStore, NewRefreshToken, RefreshTokenRecord};

/// Number of random bytes in a refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Lifetime of a refresh token in days.
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 60;

/// Generate a new cryptographically secure refresh token
///
/// # Errors
/// Returns `CryptoError::Randomness` if the OS entropy source fails
pub fn generate_refresh_token() -> Result<String, CryptoError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Randomness(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Hash a refresh token using SHA-256
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persist a refresh token owned by `account_id`, expiring 60 days after `issued_at`
pub async fn save_refresh_token(
    store: &dyn AuthStore,
    token: &str,
    account_id: Uuid,
    issued_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    store
        .create_refresh_token(NewRefreshToken {
            token_hash: hash_token(token),
            account_id,
            created_at: issued_at,
            expires_at: issued_at + Duration::days(REFRESH_TOKEN_LIFETIME_DAYS),
        })
        .await
}

/// Look up the persisted record for a refresh token
pub async fn find_refresh_token(
    store: &dyn AuthStore,
    token: &str,
) -> Result<Option<RefreshTokenRecord>, StoreError> {
    store.get_refresh_token(&hash_token(token)).await
}

/// Revoke a refresh token now
///
/// Revoking an already revoked or unknown token succeeds.
pub async fn revoke_refresh_token(store: &dyn AuthStore, token: &str) -> Result<(), StoreError> {
    store.revoke_refresh_token(&hash_token(token), Utc::now()).await
}
