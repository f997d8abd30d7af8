/// Authentication Routes
///
/// Account registration, login, access token refresh, refresh token
/// revocation and the current account lookup.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SessionManager;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::middleware::AuthenticatedAccount;
use crate::store::Account;
use crate::validators::is_valid_email;

/// Account registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Requested access token lifetime, capped at one hour; missing,
    /// non-positive or out-of-range values mean one hour
    pub expires_in_seconds: Option<i64>,
}

/// Public account fields. The password hash never leaves the store.
#[derive(Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            created_at: account.created_at,
            updated_at: account.updated_at,
            email: account.email,
            is_chirpy_red: account.is_chirpy_red,
        }
    }
}

/// Login response: public account fields plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response carrying only the new access token
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email
/// - 409: Email already registered
/// - 500: Hashing or database failure
pub async fn register(
    form: web::Json<RegisterRequest>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("account_registration");
    let RegisterRequest { email, password } = form.into_inner();

    let email = is_valid_email(&email)?;
    let account = sessions.register(&email, &password).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        account_id = %account.id,
        "Registration request completed"
    );

    Ok(HttpResponse::Created().json(AccountResponse::from(account)))
}

/// POST /api/login
///
/// # Errors
/// - 400: Invalid email format
/// - 401: Unknown email or wrong password (indistinguishable)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("account_login");
    let LoginRequest {
        email,
        password,
        expires_in_seconds,
    } = form.into_inner();

    let email = is_valid_email(&email)?;
    let outcome = sessions
        .login(&email, &password, expires_in_seconds.and_then(Duration::try_seconds))
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        account_id = %outcome.account.id,
        "Login request completed"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        account: outcome.account.into(),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Requires `Authorization: Bearer <refresh_token>`. The refresh token is not
/// rotated.
///
/// # Errors
/// - 401: Missing, unknown, expired or revoked refresh token
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let token = sessions.refresh_from_headers(req.headers()).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// Requires `Authorization: Bearer <refresh_token>`. Answers 204 whether or
/// not the token existed.
///
/// # Errors
/// - 401: Missing bearer credential
pub async fn revoke(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    sessions.revoke_from_headers(req.headers()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/users/me
///
/// **Requires a valid access token**; the account ID is injected by
/// `JwtMiddleware`.
///
/// # Errors
/// - 401: Missing, invalid or expired access token, or the account is gone
pub async fn current_account(
    account: web::ReqData<AuthenticatedAccount>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let AuthenticatedAccount(account_id) = account.into_inner();

    let account = sessions
        .store()
        .get_account_by_id(account_id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;

    Ok(HttpResponse::Ok().json(AccountResponse::from(account)))
}
