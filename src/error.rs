/// Application Error Handling
///
/// This module provides the error taxonomy shared by the session core and the
/// HTTP boundary:
/// 1. Domain-specific error types (auth, crypto, store, validation)
/// 2. A unified `AppError` used for control flow with `?`
/// 3. HTTP response mapping with structured logging
///
/// Authentication failures are deliberately coarse at the boundary: the core
/// distinguishes expired/revoked/unknown tokens, the client never sees which.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Authentication failures. Every variant is an expected branch, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Bad credentials or an unusable refresh token.
    #[error("Invalid credentials")]
    Unauthenticated,
    /// Access token with a bad signature, issuer or shape.
    #[error("Invalid token")]
    InvalidToken,
    /// Access token with a valid signature past its expiry.
    #[error("Token has expired")]
    ExpiredToken,
    /// No `Authorization: Bearer ...` header on the request.
    #[error("Missing authentication token")]
    MissingCredential,
}

/// Failures of the underlying cryptographic primitives.
#[derive(Debug, Clone, Error)]
pub enum CryptoError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Random number generation failed: {0}")]
    Randomness(String),
}

/// Failures reported by the persistence collaborator.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Account not found")]
    AccountNotFound,
    #[error("Database error: {0}")]
    Database(String),
}

/// Validation errors for request input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the authentication failure carried by this error, if any.
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            AppError::Auth(e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for correlating the response with server logs
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (code, message) = match self {
            AppError::Validation(e) => ("VALIDATION_ERROR", e.to_string()),

            AppError::Auth(e) => match e {
                AuthError::Unauthenticated => {
                    ("UNAUTHENTICATED", "Invalid credentials".to_string())
                }
                AuthError::InvalidToken | AuthError::ExpiredToken => {
                    ("TOKEN_INVALID", "Invalid or expired token".to_string())
                }
                AuthError::MissingCredential => {
                    ("MISSING_TOKEN", "Missing authentication token".to_string())
                }
            },

            AppError::Store(StoreError::DuplicateEmail) => {
                ("DUPLICATE_ENTRY", "Email already registered".to_string())
            }
            AppError::Store(StoreError::AccountNotFound) => {
                ("NOT_FOUND", "Account not found".to_string())
            }
            AppError::Store(StoreError::Database(_)) => {
                ("DATABASE_ERROR", "Database error occurred".to_string())
            }

            // Never echo primitive failure details to clients
            AppError::Crypto(_) | AppError::Internal(_) => {
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
            AppError::Config(_) => ("CONFIG_ERROR", "Server configuration error".to_string()),
        };

        let status = ResponseError::status_code(self);
        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Store(StoreError::DuplicateEmail) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Store(StoreError::AccountNotFound) => {
                tracing::warn!(request_id = request_id, error = %self, "Unknown account");
            }
            AppError::Store(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Crypto(e) => {
                tracing::error!(request_id = request_id, error = %e, "Cryptographic primitive failure");
            }
            AppError::Config(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(StoreError::DuplicateEmail) => StatusCode::CONFLICT,
            AppError::Store(StoreError::AccountNotFound) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT
// ============================================================================

/// Per-operation context attached to log lines emitted by route handlers
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
        }
    }
}
