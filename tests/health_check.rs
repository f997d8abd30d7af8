//! Integration tests for the chirpy server's unauthenticated surface

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::SessionManager;
use chirpy::configuration::{ApplicationSettings, PolkaSettings};
use chirpy::startup::run;
use chirpy::store::InMemoryStore;

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let sessions = SessionManager::new(Arc::new(InMemoryStore::new()), "health-check-secret");
    let application = ApplicationSettings {
        host: "127.0.0.1".to_string(),
        port,
        platform: "prod".to_string(),
    };
    let server = run(listener, sessions, application, PolkaSettings::default())
        .expect("Failed to create server");

    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/healthz", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn static_app_index_is_served() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/app/", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().contains("Welcome to Chirpy"));
}

#[tokio::test]
async fn reset_is_forbidden_outside_dev() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/admin/reset", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn webhook_is_refused_without_configured_key() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/api/polka/webhooks", addr))
        .header("Authorization", "ApiKey anything")
        .json(&serde_json::json!({
            "event": "user.upgraded",
            "data": { "user_id": "3311741c-680c-4546-99f3-fc9efac2036c" }
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(500, response.status().as_u16());
}
