/// JWT Claims structure
///
/// Registered claims (RFC 7519) carried by every access token.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Issuer stamped into and required from every access token.
pub const ISSUER: &str = "chirpy";

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (account ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for `subject`, valid for `ttl` from `issued_at`
    ///
    /// Returns `None` when the expiry falls outside the representable range.
    pub fn new(subject: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(ttl)?;

        Some(Self {
            iss: ISSUER.to_string(),
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Extract the account ID from the subject claim
    pub fn subject(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }

    /// Expired once the current time reaches `exp`; there is no leeway.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
