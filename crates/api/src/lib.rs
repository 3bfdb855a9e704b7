//! HTTP API server for yoga class enrollment.
//!
//! Provides REST endpoints for enrolling, monthly renewal and record lookup,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::Clock;
use enrollment_store::EnrollmentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{EnrollmentSaga, PaymentProcessor};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::enrollments::{self, AppState};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, P>(state: Arc<AppState<S, P>>, metrics_handle: PrometheusHandle) -> Router
where
    S: EnrollmentStore + 'static,
    P: PaymentProcessor + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S, P>))
        .route("/enroll", post(enrollments::enroll::<S, P>))
        .route("/api/yoga-enroll", post(enrollments::enroll::<S, P>))
        .route("/enroll/rules", get(enrollments::rules))
        .route("/enrollments/{id}", get(enrollments::get::<S, P>))
        .route("/enrollments/{id}/renew", post(enrollments::renew::<S, P>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the enrollment saga over a store and payment processor, applying
/// the configured fee and payment timeout. `clock` decides which month an
/// enrollment or renewal falls in.
pub fn create_state<S, P>(
    store: S,
    payment: P,
    config: &Config,
    clock: impl Clock + 'static,
) -> Arc<AppState<S, P>>
where
    S: EnrollmentStore,
    P: PaymentProcessor,
{
    let saga = EnrollmentSaga::new(store, payment)
        .with_clock(clock)
        .with_fee(config.fee.clone())
        .with_payment_timeout(config.payment_timeout);

    Arc::new(AppState {
        saga: Arc::new(saga),
    })
}
