use api_gate::{
    AppConfig, AppState, create_router,
    models::{MessageResponse, SeedUser, TokenResponse},
    repository::InMemoryDirectory,
    auth::Principal,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let directory = InMemoryDirectory::with_users(&[SeedUser {
        email: "live@example.com".to_string(),
        password: "live-password".to_string(),
        id: Some("user-live".to_string()),
    }])
    .unwrap();
    let state = AppState::new(AppConfig::default(), Arc::new(directory));
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

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_login_and_access_protected_route() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Without a credential the gate refuses.
    let response = client
        .get(format!("{}/api/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: MessageResponse = response.json().await.unwrap();
    assert_eq!(body.message, "Authentication required");

    // Log in.
    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "email": "live@example.com", "password": "live-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let issued: TokenResponse = response.json().await.unwrap();

    // Present the credential.
    let response = client
        .get(format!("{}/api/me", app.address))
        .bearer_auth(&issued.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let principal: Principal = response.json().await.unwrap();
    assert_eq!(principal.id, "user-live");

    // A tampered copy is refused with 403.
    let tampered = format!("{}x", issued.token);
    let response = client
        .get(format!("{}/api/me", app.address))
        .bearer_auth(tampered)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: MessageResponse = response.json().await.unwrap();
    assert_eq!(body.message, "Invalid token");
}
