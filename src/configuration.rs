use std::fmt;

use config::builder::{ConfigBuilder, DefaultState};
use config::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub polka: PolkaSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Deployment flavour; "dev" enables the admin reset endpoint.
    pub platform: String,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_dev(&self) -> bool {
        self.platform == "dev"
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

/// Access token signing settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub secret: String,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Payment provider webhook settings
#[derive(serde::Deserialize, Clone, Default)]
pub struct PolkaSettings {
    /// Shared key the provider sends as `Authorization: ApiKey <key>`.
    /// Empty disables the webhook.
    #[serde(default)]
    pub api_key: String,
}

impl PolkaSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for PolkaSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolkaSettings")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Load settings once at startup.
///
/// Sources, lowest precedence first: built-in defaults, optional
/// `configuration.yaml`, `APP_*` variables (`__` separates nesting), then
/// `SECRET`, `DB_URL`, `PLATFORM` and `POLKA_KEY`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .set_default("application.platform", "prod")?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("auth.secret", std::env::var("SECRET").ok())?
        .set_override_option("database.url", std::env::var("DB_URL").ok())?
        .set_override_option("application.platform", std::env::var("PLATFORM").ok())?
        .set_override_option("polka.api_key", std::env::var("POLKA_KEY").ok())?;

    build_settings(builder)
}

fn build_settings(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    let settings = builder.build()?.try_deserialize::<Settings>()?;

    if settings.auth.secret.trim().is_empty() {
        return Err(ConfigError::Message(
            "auth.secret (SECRET) must be set".to_string(),
        ));
    }

    Ok(settings)
}
