//! `scanbridge serve` -- HTTP webhook receiver for scan reports.
//!
//! Exposes the report orchestrator as an async HTTP service using
//! `axum` + `tokio`. Requests are independent; the tracker is the only
//! shared resource.
//!
//! Endpoints:
//! - POST /report  - Reconcile one report envelope into the tracker
//! - GET  /        - Liveness (empty 200)
//! - GET  /health  - Liveness alias
//!
//! All non-empty responses use Content-Type: application/json.

mod handlers;
mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use scanbridge_reconcile::ReportOrchestrator;
use tower_http::trace::TraceLayer;
use tracing::info;

use self::handlers::{handle_liveness, handle_not_found, handle_report};
pub(crate) use self::state::AppState;

/// Maximum request body size: 10 MB.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (
        status,
        Json(serde_json::json!({"status": "error", "message": message})),
    )
}

/// Build the webhook router around an orchestrator.
pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_liveness))
        .route("/health", get(handle_liveness))
        .route("/report", post(handle_report))
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Start the HTTP server on `host:port` and serve until Ctrl+C.
pub async fn start_server(
    host: &str,
    port: u16,
    orchestrator: ReportOrchestrator,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState { orchestrator });
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("scanbridge listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
