/// JWT Token Generation and Validation
///
/// HS256-signed access tokens keyed by the single deployment secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::{AppError, AuthError};

/// Issue a signed access token for `subject`
///
/// # Arguments
/// * `subject` - Account ID carried in the `sub` claim
/// * `secret` - Deployment signing secret
/// * `ttl` - Token lifetime; must be positive
///
/// # Errors
/// Returns `AppError::Internal` for a non-positive or out-of-range ttl, or if
/// signing fails
pub fn issue_access_token(subject: Uuid, secret: &str, ttl: Duration) -> Result<String, AppError> {
    if ttl <= Duration::zero() {
        return Err(AppError::Internal(
            "Access token ttl must be positive".to_string(),
        ));
    }

    let claims = Claims::new(subject, Utc::now(), ttl)
        .ok_or_else(|| AppError::Internal("Access token expiry out of range".to_string()))?;

    encode_claims(&claims, secret)
}

fn encode_claims(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token and return its subject
///
/// # Errors
/// * `AuthError::InvalidToken` - bad signature, wrong issuer, malformed token
///   or a subject that is not an account ID
/// * `AuthError::ExpiredToken` - valid signature, current time at or past `exp`
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    // Expiry is checked below without leeway, after the signature.
    validation.validate_exp = false;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT validation error: {}", e);
        AuthError::InvalidToken
    })?;

    if claims.is_expired_at(Utc::now()) {
        return Err(AuthError::ExpiredToken);
    }

    claims.subject()
}
