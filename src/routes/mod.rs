mod admin;
mod auth;
mod health_check;
mod webhooks;

pub use admin::reset;
pub use auth::{current_account, login, refresh, register, revoke};
pub use auth::{AccountResponse, LoginResponse, TokenResponse};
pub use health_check::health_check;
pub use webhooks::{polka_webhook, PolkaEvent, PolkaEventData};
