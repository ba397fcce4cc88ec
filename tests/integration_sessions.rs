mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{PASSWORD, TestApp};

#[tokio::test]
async fn test_list_flags_current_session() {
    let app = TestApp::new();
    app.player("player@example.com");
    let laptop = app.login("player@example.com", PASSWORD).await;
    let phone = app.login("player@example.com", PASSWORD).await;

    let (status, body) = app
        .request("GET", "/api/sessions", Some(&laptop.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);

    // The request itself counts as activity, so the caller's session comes first.
    assert_eq!(sessions[0]["id"].as_str(), Some(laptop.session_id.as_str()));
    assert_eq!(sessions[0]["is_current"], true);
    assert_eq!(sessions[1]["id"].as_str(), Some(phone.session_id.as_str()));
    assert_eq!(sessions[1]["is_current"], false);
    assert!(sessions[0].get("token").is_none());
}

#[tokio::test]
async fn test_login_records_device_details() {
    let app = TestApp::new();
    app.player("player@example.com");

    let (status, login) = app
        .request_with_headers(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({
                "email": "player@example.com",
                "password": PASSWORD,
                "device_info": "Arcade cabinet 7"
            })),
            &[
                ("user-agent", "PlayHubKiosk/2.1"),
                ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let token = login["token"].as_str().unwrap();
    let (_, body) = app.request("GET", "/api/sessions", Some(token), None).await;
    let session = &body["sessions"][0];

    assert_eq!(session["device_info"], "Arcade cabinet 7");
    assert_eq!(session["user_agent"], "PlayHubKiosk/2.1");
    assert_eq!(session["ip_address"], "203.0.113.7");
}

#[tokio::test]
async fn test_sessions_are_scoped_to_their_identity() {
    let app = TestApp::new();
    app.player("player@example.com");
    app.admin("ops@example.com");
    let player = app.login("player@example.com", PASSWORD).await;
    app.login("ops@example.com", PASSWORD).await;

    let (_, body) = app
        .request("GET", "/api/sessions", Some(&player.token), None)
        .await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_revoke_one_session() {
    let app = TestApp::new();
    app.player("player@example.com");
    let laptop = app.login("player@example.com", PASSWORD).await;
    let phone = app.login("player@example.com", PASSWORD).await;
    let tablet = app.login("player@example.com", PASSWORD).await;

    let (status, body) = app
        .request(
            "DELETE",
            &format!("/api/sessions/{}", phone.session_id),
            Some(&laptop.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session revoked");

    assert_eq!(app.me(&phone.token).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.me(&laptop.token).await.0, StatusCode::OK);
    assert_eq!(app.me(&tablet.token).await.0, StatusCode::OK);

    let (_, body) = app
        .request("GET", "/api/sessions", Some(&laptop.token), None)
        .await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_revoking_own_session_twice_succeeds() {
    let app = TestApp::new();
    app.player("player@example.com");
    let laptop = app.login("player@example.com", PASSWORD).await;
    let phone = app.login("player@example.com", PASSWORD).await;
    let uri = format!("/api/sessions/{}", phone.session_id);

    for _ in 0..2 {
        let (status, body) = app.request("DELETE", &uri, Some(&laptop.token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Session revoked");
    }
    assert_eq!(app.me(&phone.token).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cannot_revoke_session_of_another_identity() {
    let app = TestApp::new();
    app.player("player@example.com");
    app.player("rival@example.com");
    let player = app.login("player@example.com", PASSWORD).await;
    let rival = app.login("rival@example.com", PASSWORD).await;

    let (status, body) = app
        .request(
            "DELETE",
            &format!("/api/sessions/{}", rival.session_id),
            Some(&player.token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Session not found");
    assert_eq!(app.me(&rival.token).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_revoke_unknown_session_is_not_found() {
    let app = TestApp::new();
    app.player("player@example.com");
    let player = app.login("player@example.com", PASSWORD).await;

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/api/sessions/{}", Uuid::new_v4()),
            Some(&player.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            "DELETE",
            "/api/sessions/not-a-uuid",
            Some(&player.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_revoke_others_keeps_current() {
    let app = TestApp::new();
    app.player("player@example.com");
    let laptop = app.login("player@example.com", PASSWORD).await;
    let phone = app.login("player@example.com", PASSWORD).await;
    let tablet = app.login("player@example.com", PASSWORD).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/sessions/revoke-others",
            Some(&laptop.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 2);

    assert_eq!(app.me(&laptop.token).await.0, StatusCode::OK);
    assert_eq!(app.me(&phone.token).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.me(&tablet.token).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoke_all_includes_current() {
    let app = TestApp::new();
    app.player("player@example.com");
    let laptop = app.login("player@example.com", PASSWORD).await;
    let phone = app.login("player@example.com", PASSWORD).await;

    let (status, body) = app
        .request("POST", "/api/sessions/revoke-all", Some(&laptop.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 2);

    assert_eq!(app.me(&laptop.token).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.me(&phone.token).await.0, StatusCode::UNAUTHORIZED);

    // A fresh login still works afterwards.
    let again = app.login("player@example.com", PASSWORD).await;
    assert_eq!(app.me(&again.token).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_session_is_rejected_and_swept() {
    let app = TestApp::new();
    app.player("player@example.com");
    let session = app.login("player@example.com", PASSWORD).await;
    let id: Uuid = session.session_id.parse().unwrap();

    app.ctx.sessions.expire(id);

    let (status, body) = app.me(&session.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Session has been revoked or has expired");

    let swept = app.ctx.state.sessions().sweep().await.unwrap();
    assert_eq!(swept, 1);
    assert!(app.ctx.sessions.is_empty());
}

#[tokio::test]
async fn test_session_endpoints_require_authentication() {
    let app = TestApp::new();

    for (method, uri) in [
        ("GET", "/api/sessions"),
        ("POST", "/api/sessions/revoke-others"),
        ("POST", "/api/sessions/revoke-all"),
    ] {
        let (status, _) = app.request(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}
