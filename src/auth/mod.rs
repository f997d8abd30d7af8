/// Authentication module
///
/// Password hashing, access token issue/validation, refresh token
/// management, bearer and API key extraction, and the session lifecycle
/// built on them.

mod api_key;
mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use api_key::{api_key_matches, extract_api_key};
pub use bearer::extract_bearer;
pub use claims::{Claims, ISSUER};
pub use jwt::issue_access_token;
pub use jwt::validate_access_token;
pub use password::hash_password;
pub use password::verify_password;
pub use refresh_token::find_refresh_token;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::revoke_refresh_token;
pub use refresh_token::save_refresh_token;
pub use refresh_token::REFRESH_TOKEN_LIFETIME_DAYS;
pub use session::{LoginOutcome, SessionManager, DEFAULT_ACCESS_TOKEN_TTL_SECONDS};
