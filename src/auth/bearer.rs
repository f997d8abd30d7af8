/// Bearer credential extraction from request headers.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Return everything after the case-sensitive `"Bearer "` prefix, verbatim
///
/// # Errors
/// Returns `AuthError::MissingCredential` if the header is absent, not valid
/// UTF-8, or uses another scheme
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    authorization_credential(headers, BEARER_PREFIX)
}

/// Remainder of the `Authorization` header after `scheme_prefix`.
///
/// Header bytes are decoded as UTF-8 rather than restricted to visible
/// ASCII, so the remainder is returned exactly as sent.
pub(crate) fn authorization_credential<'a>(
    headers: &'a HeaderMap,
    scheme_prefix: &str,
) -> Result<&'a str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
        .and_then(|value| value.strip_prefix(scheme_prefix))
        .ok_or(AuthError::MissingCredential)
}
