use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info, warn};

use playhub::logging::init_tracing;
use playhub::metrics::{init_metrics, metrics_app};
use playhub::modules::sessions::SessionService;
use playhub::router::init_router;
use playhub::state::init_app_state;
use playhub_db::{init_db_pool, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _log_guard = init_tracing()?;
    let metrics_handle = init_metrics()?;

    let db = init_db_pool().await?;
    run_migrations(&db)
        .await
        .context("Failed to run database migrations")?;

    let state = init_app_state(db);
    spawn_session_sweeper(
        state.sessions().clone(),
        Duration::from_secs(state.config.policy.session_sweep_interval_seconds),
    );

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let metrics_port: u16 = std::env::var("METRICS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(9090);

    let metrics_listener = tokio::net::TcpListener::bind(("0.0.0.0", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_app(metrics_handle)).await {
            error!(error = %e, "Metrics server stopped");
        }
    });

    let app = init_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    info!(port, "Server running on http://localhost:{}", port);
    info!("Swagger UI available at http://localhost:{}/swagger-ui", port);
    info!("Scalar UI available at http://localhost:{}/scalar", port);
    info!(metrics_port, "Metrics available at http://localhost:{}/metrics", metrics_port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Deletes expired sessions every `period`. The first run happens at startup.
fn spawn_session_sweeper(sessions: SessionService, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            if let Err(e) = sessions.sweep().await {
                warn!(error = %e, "Session sweep failed");
            }
        }
    });
}
