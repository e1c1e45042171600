use enoki::{AppConfig, AppState, create_router, models::AuthResponse, models::HealthResponse, models::User};
use reqwest::{StatusCode, header};
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let state = AppState::in_memory(AppConfig::default());
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// A client that keeps cookies between requests, like a browser tab.
fn browser() -> reqwest::Client {
    reqwest::Client::builder().cookie_store(true).build().unwrap()
}

async fn signup(client: &reqwest::Client, app: &TestApp, email: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/auth/signup", app.address))
        .json(&json!({ "email": email, "name": "Ada", "password": "correct horse" }))
        .send()
        .await
        .expect("signup request failed")
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/api/health", app.address))
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    let health: HealthResponse = response.json().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.database, "connected");
}

#[tokio::test]
async fn test_signup_sets_session_cookie_and_returns_user() {
    let app = spawn_app().await;
    let client = browser();

    let response = signup(&client, &app, "ada@example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("session_id="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["name"], "Ada");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = spawn_app().await;
    let client = browser();
    let me_url = format!("{}/api/auth/me", app.address);

    let created: AuthResponse = signup(&client, &app, "ada@example.com").await.json().await.unwrap();

    // The cookie from signup authenticates the next request.
    let me = client.get(&me_url).send().await.unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let me: AuthResponse = me.json().await.unwrap();
    assert_eq!(me.user.id, created.user.id);

    let logout = client
        .post(format!("{}/api/auth/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::OK);

    let after = client.get(&me_url).send().await.unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_correct_and_wrong_password() {
    let app = spawn_app().await;
    signup(&browser(), &app, "ada@example.com").await;
    let login_url = format!("{}/api/auth/login", app.address);

    let client = browser();
    let wrong = client
        .post(&login_url)
        .json(&json!({ "email": "ada@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown = client
        .post(&login_url)
        .json(&json!({ "email": "nobody@example.com", "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    let ok = client
        .post(&login_url)
        .json(&json!({ "email": "ada@example.com", "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body: AuthResponse = ok.json().await.unwrap();
    assert_eq!(body.user.email, "ada@example.com");

    let me = client
        .get(format!("{}/api/auth/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = spawn_app().await;

    let first = signup(&browser(), &app, "ada@example.com").await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = signup(&browser(), &app, "ada@example.com").await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_with_blank_field_is_rejected() {
    let app = spawn_app().await;

    let response = browser()
        .post(format!("{}/api/auth/signup", app.address))
        .json(&json!({ "email": "ada@example.com", "name": "  ", "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let app = spawn_app().await;

    let response = browser()
        .post(format!("{}/api/auth/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_user_routes_require_session() {
    let app = spawn_app().await;
    let anonymous = reqwest::Client::new();

    let list = anonymous
        .get(format!("{}/api/users", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(list.status(), StatusCode::UNAUTHORIZED);

    let client = browser();
    let created: AuthResponse = signup(&client, &app, "ada@example.com").await.json().await.unwrap();
    signup(&browser(), &app, "grace@example.com").await;

    let users: Vec<User> = client
        .get(format!("{}/api/users", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let emails: Vec<&str> = users.iter().map(|user| user.email.as_str()).collect();
    assert_eq!(emails, vec!["grace@example.com", "ada@example.com"]);

    let found = client
        .get(format!("{}/api/users/{}", app.address, created.user.id))
        .send()
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);

    let missing = client
        .get(format!("{}/api/users/{}", app.address, Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_local_dev_bypass_header() {
    let app = spawn_app().await;
    let created: AuthResponse = signup(&browser(), &app, "ada@example.com").await.json().await.unwrap();

    let response = reqwest::Client::new()
        .get(format!("{}/api/auth/me", app.address))
        .header("x-user-id", created.user.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/api/health", app.address)).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
