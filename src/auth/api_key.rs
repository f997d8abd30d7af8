/// API key credentials for server-to-server callers.

use actix_web::http::header::HeaderMap;
use sha2::{Digest, Sha256};

use crate::auth::bearer::authorization_credential;
use crate::error::AuthError;

const API_KEY_PREFIX: &str = "ApiKey ";

/// Return everything after the case-sensitive `"ApiKey "` prefix, verbatim
///
/// # Errors
/// Returns `AuthError::MissingCredential` if the header is absent, not valid
/// UTF-8, or uses another scheme
pub fn extract_api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    authorization_credential(headers, API_KEY_PREFIX)
}

/// Compare a presented key with the configured one in constant time.
///
/// Both sides are hashed first so the comparison does not depend on the
/// length of the configured key.
pub fn api_key_matches(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    constant_time_eq(presented.as_slice(), expected.as_slice())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
