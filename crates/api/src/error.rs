//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ValidationErrors;
use saga::SagaError;
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request body was not a JSON object. No field details available.
    MalformedBody(String),
    /// Resource not found.
    NotFound(String),
    /// Saga execution error.
    Saga(SagaError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a ValidationErrors>,
}

const INVALID_DATA: &str = "Invalid data";
const INTERNAL: &str = "Internal server error";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MalformedBody(reason) => {
                tracing::debug!(%reason, "rejected malformed request body");
                respond(StatusCode::BAD_REQUEST, INVALID_DATA, None)
            }
            ApiError::NotFound(what) => {
                let message = format!("{what} not found");
                respond(StatusCode::NOT_FOUND, &message, None)
            }
            ApiError::Saga(err) => saga_error_to_response(err),
        }
    }
}

fn saga_error_to_response(err: SagaError) -> Response {
    match &err {
        SagaError::Validation(errors) => {
            respond(StatusCode::BAD_REQUEST, INVALID_DATA, Some(errors))
        }
        SagaError::Conflict { .. } => respond(
            StatusCode::CONFLICT,
            "User with this phone number already exists",
            None,
        ),
        SagaError::AlreadyEnrolled { .. } => respond(
            StatusCode::CONFLICT,
            "Already enrolled for this month",
            None,
        ),
        SagaError::NotFound(_) => respond(StatusCode::NOT_FOUND, "Enrollment not found", None),
        SagaError::Payment { .. } => {
            tracing::warn!(error = %err, "payment failed");
            respond(StatusCode::INTERNAL_SERVER_ERROR, "Payment failed", None)
        }
        SagaError::CompensationFailed { record_id, .. } => {
            tracing::error!(error = %err, %record_id, "compensation failed");
            respond(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL, None)
        }
        SagaError::Storage(_)
        | SagaError::Interrupted(_)
        | SagaError::InvalidTransition { .. } => {
            tracing::error!(error = %err, kind = err.kind(), "internal server error");
            respond(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL, None)
        }
    }
}

fn respond(status: StatusCode, error: &str, details: Option<&ValidationErrors>) -> Response {
    (status, axum::Json(ErrorBody { error, details })).into_response()
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}
