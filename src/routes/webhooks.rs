/// Payment provider webhooks

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{api_key_matches, extract_api_key, SessionManager};
use crate::configuration::PolkaSettings;
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct PolkaEventData {
    pub user_id: String,
}

/// Event notification sent by the payment provider
#[derive(Deserialize)]
pub struct PolkaEvent {
    pub event: String,
    pub data: PolkaEventData,
}

/// POST /api/polka/webhooks
///
/// Requires `Authorization: ApiKey <key>`. Only `user.upgraded` has an
/// effect; every other event is acknowledged with 204.
///
/// # Errors
/// - 400: Malformed body or user id
/// - 401: Missing or wrong API key
/// - 404: Unknown account
/// - 500: Webhook key not configured
pub async fn polka_webhook(
    req: HttpRequest,
    event: web::Json<PolkaEvent>,
    sessions: web::Data<SessionManager>,
    polka: web::Data<PolkaSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("polka_webhook");

    if !polka.is_configured() {
        return Err(AppError::Config(
            "webhook api key is not configured".to_string(),
        ));
    }

    let api_key = extract_api_key(req.headers())?;
    if !api_key_matches(api_key, &polka.api_key) {
        tracing::warn!(
            request_id = %context.request_id,
            operation = %context.operation,
            "Webhook rejected: wrong api key"
        );
        return Err(AuthError::Unauthenticated.into());
    }

    let PolkaEvent { event, data } = event.into_inner();
    if event != USER_UPGRADED {
        tracing::debug!(
            request_id = %context.request_id,
            operation = %context.operation,
            %event,
            "Webhook event ignored"
        );
        return Ok(HttpResponse::NoContent().finish());
    }

    let account_id = Uuid::parse_str(&data.user_id)
        .map_err(|_| ValidationError::InvalidFormat("user_id"))?;

    sessions.store().upgrade_account(account_id).await?;

    tracing::info!(
        request_id = %context.request_id,
        operation = %context.operation,
        account_id = %account_id,
        "Account upgraded"
    );

    Ok(HttpResponse::NoContent().finish())
}
