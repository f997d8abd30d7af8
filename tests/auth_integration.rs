use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::{validate_access_token, SessionManager};
use chirpy::configuration::{ApplicationSettings, PolkaSettings};
use chirpy::startup::run;
use chirpy::store::{AuthStore, InMemoryStore};
use serde_json::{json, Value};
use uuid::Uuid;

const SECRET: &str = "integration-test-secret";
const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub store: InMemoryStore,
    pub client: reqwest::Client,
}

impl TestApp {
    async fn register(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/users", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn login(&self, body: Value) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/login", &self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn polka_webhook(&self, api_key: Option<&str>, body: Value) -> reqwest::Response {
        let mut request = self
            .client
            .post(&format!("{}/api/polka/webhooks", &self.address))
            .json(&body);
        if let Some(key) = api_key {
            request = request.header("Authorization", format!("ApiKey {}", key));
        }
        request.send().await.expect("Failed to execute request.")
    }

    async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Registers and logs in, returning the login response body.
    async fn signed_in(&self, email: &str, password: &str) -> Value {
        assert_eq!(201, self.register(email, password).await.status().as_u16());
        let response = self
            .login(json!({ "email": email, "password": password }))
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}

fn spawn_app_on(platform: &str) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = InMemoryStore::new();
    let sessions = SessionManager::new(Arc::new(store.clone()), SECRET);
    let application = ApplicationSettings {
        host: "127.0.0.1".to_string(),
        port,
        platform: platform.to_string(),
    };

    let polka = PolkaSettings {
        api_key: POLKA_KEY.to_string(),
    };

    let server = run(listener, sessions, application, polka).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

fn spawn_app() -> TestApp {
    spawn_app_on("prod")
}

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_with_public_fields_only() {
    let app = spawn_app();

    let response = app.register("a@x.com", "hunter2").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], "a@x.com");
    assert!(body.get("id").is_some());
    assert!(body.get("created_at").is_some());
    assert!(body.get("updated_at").is_some());
    assert!(body.get("hashed_password").is_none());
    assert!(body.get("password").is_none());

    let stored = app
        .store
        .get_account_by_email("a@x.com")
        .await
        .unwrap()
        .expect("Account was not stored");
    assert_ne!(stored.hashed_password, "hunter2");
}

#[tokio::test]
async fn register_returns_409_for_duplicate_email() {
    let app = spawn_app();

    assert_eq!(201, app.register("a@x.com", "hunter2").await.status().as_u16());

    let response = app.register("a@x.com", "other").await;
    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn register_returns_400_for_invalid_email() {
    let app = spawn_app();

    for invalid_email in ["notanemail", "user@", "@example.com", "user@@example.com"] {
        let response = app.register(invalid_email, "hunter2").await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "Should reject invalid email: {}",
            invalid_email
        );
    }
}

#[tokio::test]
async fn register_returns_400_for_missing_fields() {
    let app = spawn_app();

    let test_cases = vec![
        (json!({"email": "a@x.com"}), "missing password"),
        (json!({"password": "hunter2"}), "missing email"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = app
            .client
            .post(&format!("{}/api/users", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(), "Should reject: {}", reason);
    }
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_access_and_refresh_tokens() {
    let app = spawn_app();

    let body = app.signed_in("a@x.com", "hunter2").await;

    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    let token = body["token"].as_str().expect("Missing access token");
    let refresh_token = body["refresh_token"].as_str().expect("Missing refresh token");

    assert_eq!(body["email"], "a@x.com");
    assert_eq!(validate_access_token(token, SECRET), Ok(id));
    assert_eq!(refresh_token.len(), 64);
    assert!(refresh_token.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
async fn login_with_zero_expiry_uses_default() {
    let app = spawn_app();
    assert_eq!(201, app.register("a@x.com", "hunter2").await.status().as_u16());

    let response = app
        .login(json!({"email": "a@x.com", "password": "hunter2", "expires_in_seconds": 0}))
        .await;
    assert_eq!(200, response.status().as_u16());

    // Zero falls back to the default rather than producing a dead token
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert!(validate_access_token(token, SECRET).is_ok());
}

#[tokio::test]
async fn login_with_out_of_range_expiry_uses_default() {
    let app = spawn_app();
    assert_eq!(201, app.register("a@x.com", "hunter2").await.status().as_u16());

    for expires_in_seconds in [i64::MAX, 10_000_000_000_000] {
        let response = app
            .login(json!({
                "email": "a@x.com",
                "password": "hunter2",
                "expires_in_seconds": expires_in_seconds
            }))
            .await;
        assert_eq!(200, response.status().as_u16());

        let body: Value = response.json().await.unwrap();
        let token = body["token"].as_str().unwrap();
        assert!(validate_access_token(token, SECRET).is_ok());
    }

    // The server is still answering after both requests
    let response = app
        .client
        .get(&format!("{}/api/healthz", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn unknown_email_with_huge_expiry_returns_401() {
    let app = spawn_app();

    let response = app
        .login(json!({
            "email": "nobody@x.com",
            "password": "hunter2",
            "expires_in_seconds": i64::MAX
        }))
        .await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let app = spawn_app();
    assert_eq!(201, app.register("a@x.com", "hunter2").await.status().as_u16());

    let wrong_password = app
        .login(json!({"email": "a@x.com", "password": "hunter3"}))
        .await;
    let unknown_email = app
        .login(json!({"email": "b@x.com", "password": "hunter2"}))
        .await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_email: Value = unknown_email.json().await.unwrap();
    assert_eq!(wrong_password["code"], unknown_email["code"]);
    assert_eq!(wrong_password["message"], unknown_email["message"]);
}

// --- Refresh / Revoke Tests ---

#[tokio::test]
async fn refresh_returns_access_token_for_same_account() {
    let app = spawn_app();
    let body = app.signed_in("a@x.com", "hunter2").await;
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap();

    let response = app.post_with_bearer("/api/refresh", refresh_token).await;
    assert_eq!(200, response.status().as_u16());

    let refreshed: Value = response.json().await.unwrap();
    let token = refreshed["token"].as_str().expect("Missing access token");
    assert_eq!(validate_access_token(token, SECRET), Ok(id));
    assert!(refreshed.get("refresh_token").is_none());
}

#[tokio::test]
async fn refresh_requires_bearer_credential() {
    let app = spawn_app();

    let missing = app
        .client
        .post(&format!("{}/api/refresh", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    let basic = app
        .client
        .post(&format!("{}/api/refresh", &app.address))
        .header("Authorization", "Basic xyz")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, missing.status().as_u16());
    assert_eq!(401, basic.status().as_u16());
}

#[tokio::test]
async fn refresh_with_unknown_token_returns_401() {
    let app = spawn_app();

    let response = app.post_with_bearer("/api/refresh", &"a".repeat(64)).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn revoked_token_cannot_refresh() {
    let app = spawn_app();
    let body = app.signed_in("a@x.com", "hunter2").await;
    let refresh_token = body["refresh_token"].as_str().unwrap();

    let first = app.post_with_bearer("/api/revoke", refresh_token).await;
    let second = app.post_with_bearer("/api/revoke", refresh_token).await;
    assert_eq!(204, first.status().as_u16());
    assert_eq!(204, second.status().as_u16());

    let response = app.post_with_bearer("/api/refresh", refresh_token).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn revoke_unknown_token_returns_204() {
    let app = spawn_app();

    let response = app.post_with_bearer("/api/revoke", "not-a-real-token").await;
    assert_eq!(204, response.status().as_u16());
}

#[tokio::test]
async fn revoke_without_bearer_returns_401() {
    let app = spawn_app();

    let response = app
        .client
        .post(&format!("{}/api/revoke", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn revoked_and_unknown_tokens_are_indistinguishable() {
    let app = spawn_app();
    let body = app.signed_in("a@x.com", "hunter2").await;
    let refresh_token = body["refresh_token"].as_str().unwrap();
    app.post_with_bearer("/api/revoke", refresh_token).await;

    let revoked: Value = app
        .post_with_bearer("/api/refresh", refresh_token)
        .await
        .json()
        .await
        .unwrap();
    let unknown: Value = app
        .post_with_bearer("/api/refresh", &"b".repeat(64))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(revoked["code"], unknown["code"]);
    assert_eq!(revoked["message"], unknown["message"]);
}

// --- Protected Route Tests ---

#[tokio::test]
async fn current_account_requires_access_token() {
    let app = spawn_app();
    let body = app.signed_in("a@x.com", "hunter2").await;
    let token = body["token"].as_str().unwrap();
    let refresh_token = body["refresh_token"].as_str().unwrap();

    let unauthenticated = app
        .client
        .get(&format!("{}/api/users/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, unauthenticated.status().as_u16());

    // A refresh token is not an access token
    let wrong_kind = app
        .client
        .get(&format!("{}/api/users/me", &app.address))
        .bearer_auth(refresh_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, wrong_kind.status().as_u16());

    let response = app
        .client
        .get(&format!("{}/api/users/me", &app.address))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let me: Value = response.json().await.unwrap();
    assert_eq!(me["id"], body["id"]);
    assert_eq!(me["email"], "a@x.com");
}

#[tokio::test]
async fn access_token_signed_with_other_secret_is_rejected() {
    let app = spawn_app();
    let body = app.signed_in("a@x.com", "hunter2").await;
    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    let forged = chirpy::auth::issue_access_token(id, "not-the-server-secret", chrono::Duration::hours(1))
        .unwrap();

    let response = app
        .client
        .get(&format!("{}/api/users/me", &app.address))
        .bearer_auth(forged)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());
}

// --- Webhook Tests ---

fn upgraded_event(user_id: &str) -> Value {
    json!({ "event": "user.upgraded", "data": { "user_id": user_id } })
}

#[tokio::test]
async fn webhook_upgrades_account() {
    let app = spawn_app();
    let body = app.signed_in("a@x.com", "hunter2").await;
    assert_eq!(body["is_chirpy_red"], false);
    let id = body["id"].as_str().unwrap();

    let response = app.polka_webhook(Some(POLKA_KEY), upgraded_event(id)).await;
    assert_eq!(204, response.status().as_u16());

    let login = app
        .login(json!({"email": "a@x.com", "password": "hunter2"}))
        .await;
    let body: Value = login.json().await.unwrap();
    assert_eq!(body["is_chirpy_red"], true);
}

#[tokio::test]
async fn webhook_ignores_other_events() {
    let app = spawn_app();
    let body = app.signed_in("a@x.com", "hunter2").await;
    let id = body["id"].as_str().unwrap();

    let event = json!({ "event": "user.payment_failed", "data": { "user_id": id } });
    let response = app.polka_webhook(Some(POLKA_KEY), event).await;
    assert_eq!(204, response.status().as_u16());

    let account_id: Uuid = id.parse().unwrap();
    let stored = app.store.get_account_by_id(account_id).await.unwrap().unwrap();
    assert!(!stored.is_chirpy_red);
}

#[tokio::test]
async fn webhook_requires_matching_api_key() {
    let app = spawn_app();
    let body = app.signed_in("a@x.com", "hunter2").await;
    let id = body["id"].as_str().unwrap();

    let missing = app.polka_webhook(None, upgraded_event(id)).await;
    let wrong = app.polka_webhook(Some("not-the-key"), upgraded_event(id)).await;
    assert_eq!(401, missing.status().as_u16());
    assert_eq!(401, wrong.status().as_u16());

    let account_id: Uuid = id.parse().unwrap();
    let stored = app.store.get_account_by_id(account_id).await.unwrap().unwrap();
    assert!(!stored.is_chirpy_red);
}

#[tokio::test]
async fn webhook_rejects_bad_user_id() {
    let app = spawn_app();

    let response = app
        .polka_webhook(Some(POLKA_KEY), upgraded_event("not-a-uuid"))
        .await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn webhook_unknown_account_returns_404() {
    let app = spawn_app();

    let response = app
        .polka_webhook(Some(POLKA_KEY), upgraded_event(&Uuid::new_v4().to_string()))
        .await;
    assert_eq!(404, response.status().as_u16());
}

// --- Admin Tests ---

#[tokio::test]
async fn reset_on_dev_deletes_accounts() {
    let app = spawn_app_on("dev");
    let body = app.signed_in("a@x.com", "hunter2").await;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .client
        .post(&format!("{}/admin/reset", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let login = app
        .login(json!({"email": "a@x.com", "password": "hunter2"}))
        .await;
    assert_eq!(401, login.status().as_u16());

    let refresh = app.post_with_bearer("/api/refresh", &refresh_token).await;
    assert_eq!(401, refresh.status().as_u16());
}
