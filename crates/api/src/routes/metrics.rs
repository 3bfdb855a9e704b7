//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers help text for the enrollment saga metrics.
pub fn describe() {
    metrics::describe_counter!("enrollment_saga_total", "Enrollment sagas started");
    metrics::describe_counter!("enrollment_saga_completed", "Enrollment sagas that reached Done");
    metrics::describe_counter!("enrollment_saga_failed", "Enrollment sagas that ended in Failed");
    metrics::describe_counter!(
        "enrollment_compensation_failed",
        "Failed charges whose record could not be removed"
    );
    metrics::describe_histogram!(
        "enrollment_saga_duration_seconds",
        metrics::Unit::Seconds,
        "Wall time of one enrollment saga"
    );
}

/// GET /metrics: Prometheus exposition of the saga counters.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
