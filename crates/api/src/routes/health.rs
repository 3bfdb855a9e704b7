//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use enrollment_store::EnrollmentStore;
use saga::PaymentProcessor;
use serde::Serialize;

use super::enrollments::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health: `ok` while the enrollment store answers, `unavailable`
/// with a 503 otherwise.
pub async fn check<S: EnrollmentStore + 'static, P: PaymentProcessor + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.saga.store().count().await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
        }
    }
}
