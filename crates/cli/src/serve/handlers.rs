//! HTTP route handlers: report ingestion and liveness.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use scanbridge_reconcile::ReportEnvelope;

use super::json_error;
use super::state::AppState;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET / and GET /health
pub(crate) async fn handle_liveness() -> StatusCode {
    StatusCode::OK
}

/// POST /report
///
/// 200 with the acknowledgment once the report has been handled, even if
/// the upload to the tracker failed. 400 for a body that does not parse as
/// an envelope, 500 when no engagement could be resolved.
pub(crate) async fn handle_report(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReportEnvelope>, JsonRejection>,
) -> impl IntoResponse {
    let Json(envelope) = match body {
        Ok(envelope) => envelope,
        Err(rejection) => {
            return json_error(StatusCode::BAD_REQUEST, &rejection.body_text()).into_response()
        }
    };

    match state.orchestrator.handle(&envelope).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()).into_response(),
    }
}
