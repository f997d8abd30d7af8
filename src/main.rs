use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::SessionManager;
use chirpy::configuration::get_configuration;
use chirpy::startup::run;
use chirpy::store::PgStore;
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    // A missing signing secret is fatal
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    let sessions = SessionManager::new(
        Arc::new(PgStore::new(pool)),
        configuration.auth.secret.clone(),
    );

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    if !configuration.polka.is_configured() {
        tracing::warn!("POLKA_KEY is not set; payment webhooks will be refused");
    }

    let server = run(
        listener,
        sessions,
        configuration.application.clone(),
        configuration.polka.clone(),
    )?;
    tracing::info!("Server started successfully");

    server.await
}
