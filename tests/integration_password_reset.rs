mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use common::{PASSWORD, TestApp};

const NEW_PASSWORD: &str = "correct-horse";

async fn request_reset(app: &TestApp, email: &str) -> String {
    let (status, body) = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": email })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "forgot-password failed: {}", body);

    app.ctx
        .notifier
        .last_to(email)
        .expect("reset email sent")
        .template_data["token"]
        .clone()
}

async fn reset(
    app: &TestApp,
    token: &str,
    email: &str,
    new_password: &str,
    confirm_password: &str,
) -> (StatusCode, serde_json::Value) {
    app.request(
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({
            "token": token,
            "email": email,
            "new_password": new_password,
            "confirm_password": confirm_password
        })),
    )
    .await
}

async fn login_status(app: &TestApp, email: &str, password: &str) -> StatusCode {
    app.request(
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
    .0
}

#[tokio::test]
async fn test_forgot_password_sends_link() {
    let app = TestApp::new();
    app.player("player@example.com");

    let token = request_reset(&app, "player@example.com").await;

    let sent = app.ctx.notifier.last().unwrap();
    assert_eq!(sent.recipient, "player@example.com");
    assert_eq!(sent.subject, "Password Reset Request");
    assert!(sent.content.contains(&token));
    assert_eq!(
        sent.template_data["action_url"],
        format!(
            "https://play.example.com/reset-password?token={}&email=player%40example.com",
            token
        )
    );
    assert_eq!(sent.template_data["expires_in_minutes"], "15");
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No account found with that email address");
    assert!(app.ctx.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_validate_reset_token() {
    let app = TestApp::new();
    app.player("player@example.com");
    let token = request_reset(&app, "player@example.com").await;

    let (status, body) = app
        .request(
            "GET",
            &format!("/api/auth/reset-password/validate?token={}", token),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert!(body["expires_at"].is_string());

    let (status, body) = app
        .request(
            "GET",
            "/api/auth/reset-password/validate?token=made-up",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired reset token");
}

#[tokio::test]
async fn test_reset_password_end_to_end() {
    let app = TestApp::new();
    app.player("player@example.com");
    let token = request_reset(&app, "player@example.com").await;

    let (status, body) = reset(
        &app,
        &token,
        "player@example.com",
        NEW_PASSWORD,
        NEW_PASSWORD,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    assert_eq!(
        login_status(&app, "player@example.com", NEW_PASSWORD).await,
        StatusCode::OK
    );
    assert_eq!(
        login_status(&app, "player@example.com", PASSWORD).await,
        StatusCode::UNAUTHORIZED
    );

    let confirmation = app.ctx.notifier.last_to("player@example.com").unwrap();
    assert_eq!(confirmation.subject, "Password Reset Successful");
}

#[tokio::test]
async fn test_reset_token_works_once() {
    let app = TestApp::new();
    app.player("player@example.com");
    let token = request_reset(&app, "player@example.com").await;

    let (status, _) = reset(&app, &token, "player@example.com", NEW_PASSWORD, NEW_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = reset(
        &app,
        &token,
        "player@example.com",
        "another-password",
        "another-password",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired reset token");
    assert_eq!(
        login_status(&app, "player@example.com", NEW_PASSWORD).await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_newer_request_invalidates_older_token() {
    let app = TestApp::new();
    app.player("player@example.com");
    let first = request_reset(&app, "player@example.com").await;
    let second = request_reset(&app, "player@example.com").await;
    assert_ne!(first, second);

    let (status, _) = reset(&app, &first, "player@example.com", NEW_PASSWORD, NEW_PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = reset(&app, &second, "player@example.com", NEW_PASSWORD, NEW_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new();
    app.player("player@example.com");
    let token = request_reset(&app, "player@example.com").await;

    app.ctx.password_resets.rewind(&token, Duration::minutes(16));

    let (status, body) = reset(&app, &token, "player@example.com", NEW_PASSWORD, NEW_PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired reset token");
}

#[tokio::test]
async fn test_password_input_errors_are_specific() {
    let app = TestApp::new();
    app.player("player@example.com");
    let token = request_reset(&app, "player@example.com").await;

    let (status, body) = reset(&app, &token, "player@example.com", NEW_PASSWORD, "different").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match");

    let (status, body) = reset(&app, &token, "player@example.com", "abc", "abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 6 characters long");

    // Neither failure consumed the token.
    let (status, _) = reset(&app, &token, "player@example.com", NEW_PASSWORD, NEW_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_is_bound_to_its_identity() {
    let app = TestApp::new();
    app.player("player@example.com");
    app.player("rival@example.com");
    let token = request_reset(&app, "player@example.com").await;

    let (status, _) = reset(&app, &token, "rival@example.com", NEW_PASSWORD, NEW_PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(
        login_status(&app, "rival@example.com", PASSWORD).await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_administrator_can_reset() {
    let app = TestApp::new();
    app.admin("ops@example.com");
    let token = request_reset(&app, "ops@example.com").await;

    let (status, _) = reset(&app, &token, "ops@example.com", NEW_PASSWORD, NEW_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ops@example.com", "password": NEW_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["namespace"], "admin");
}
