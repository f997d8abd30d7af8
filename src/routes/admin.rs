/// Admin Routes

use actix_web::{web, HttpResponse};

use crate::auth::SessionManager;
use crate::configuration::ApplicationSettings;
use crate::error::{AppError, ErrorContext, ErrorResponse};

/// POST /admin/reset
///
/// Deletes every account and refresh token. Only available when the
/// platform is "dev"; answers 403 otherwise.
pub async fn reset(
    sessions: web::Data<SessionManager>,
    application: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("admin_reset");

    if !application.is_dev() {
        tracing::warn!(
            request_id = %context.request_id,
            operation = %context.operation,
            "Reset refused outside dev platform"
        );
        return Ok(HttpResponse::Forbidden().json(ErrorResponse::new(
            context.request_id,
            "Forbidden".to_string(),
            "FORBIDDEN".to_string(),
            403,
        )));
    }

    sessions.store().reset().await?;
    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        "Accounts reset"
    );

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Users database reset."))
}
