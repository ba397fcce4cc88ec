use std::time::{Duration, Instant};

use anyhow::Context;
use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use playhub_auth::Namespace;

/// Installs the Prometheus recorder and spawns its upkeep task.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )
        .context("Failed to set buckets")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(handle)
}

/// Keeps `http_requests_active` accurate even if the request future is dropped.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        gauge!("http_requests_active").increment(1.0);
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        gauge!("http_requests_active").decrement(1.0);
    }
}

/// Unrouted requests share one label so probes for random URLs cannot grow
/// the series count.
fn route_label(matched: Option<&MatchedPath>) -> String {
    matched.map_or("unmatched", MatchedPath::as_str).to_owned()
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let _in_flight = InFlight::enter();
    let started = Instant::now();
    let method = req.method().as_str().to_owned();
    let route = route_label(req.extensions().get::<MatchedPath>());

    let response = next.run(req).await;
    let status = response.status().as_u16().to_string();

    histogram!("http_request_duration_seconds", "method" => method.clone(), "path" => route.clone())
        .record(started.elapsed().as_secs_f64());
    counter!("http_requests_total", "method" => method, "path" => route, "status" => status)
        .increment(1);

    response
}

pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_login_success(namespace: Namespace) {
    counter!("auth_logins_total", "outcome" => "success", "namespace" => namespace.as_str())
        .increment(1);
}

pub fn track_login_failure(reason: &'static str) {
    counter!("auth_logins_total", "outcome" => "failure", "reason" => reason).increment(1);
}

/// `source` is `login` or `refresh`.
pub fn track_token_issued(source: &'static str) {
    counter!("auth_tokens_issued_total", "source" => source).increment(1);
}

pub fn track_sessions_revoked(count: u64, scope: &'static str) {
    counter!("auth_sessions_revoked_total", "scope" => scope).increment(count);
}

pub fn track_sessions_swept(count: u64) {
    counter!("auth_sessions_swept_total").increment(count);
}

pub fn track_password_reset(stage: &'static str) {
    counter!("auth_password_resets_total", "stage" => stage).increment(1);
}

pub fn track_email_change(stage: &'static str) {
    counter!("auth_email_changes_total", "stage" => stage).increment(1);
}
