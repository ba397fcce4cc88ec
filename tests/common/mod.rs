use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use playhub::router::init_router;
use playhub::state::{AppConfig, AppState};
use playhub::testing::{TestState, test_config};
use playhub_auth::Namespace;

pub const PASSWORD: &str = "hunter22";

/// The real router over in-memory stores.
pub struct TestApp {
    pub app: Router,
    pub ctx: TestState,
}

/// A logged-in caller.
#[allow(dead_code)]
pub struct LoggedIn {
    pub token: String,
    pub session_id: String,
    pub body: Value,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let ctx = TestState::with_config(config);
        let app = init_router(ctx.state.clone());
        Self { app, ctx }
    }

    /// Serves an arbitrary state, for wiring that [`TestState`] does not cover.
    pub fn router_for(state: AppState) -> Router {
        init_router(state)
    }

    pub fn player(&self, email: &str) {
        self.ctx
            .identities
            .insert(Namespace::User, email, "Player One", PASSWORD);
    }

    pub fn admin(&self, email: &str) {
        self.ctx
            .identities
            .insert(Namespace::Admin, email, "Ops Admin", PASSWORD);
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(&self.app, method, uri, token, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        send(&self.app, method, uri, token, body, headers).await
    }

    pub async fn login(&self, email: &str, password: &str) -> LoggedIn {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        LoggedIn {
            token: body["token"].as_str().unwrap().to_string(),
            session_id: body["session_id"].as_str().unwrap().to_string(),
            body,
        }
    }

    pub async fn me(&self, token: &str) -> (StatusCode, Value) {
        self.request("GET", "/api/auth/me", Some(token), None).await
    }
}

#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}
