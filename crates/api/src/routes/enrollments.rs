//! Enrollment endpoints: sign-up, monthly renewal, lookup and the published
//! validation rules.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::NaiveDate;
use common::RecordId;
use domain::{EnrollmentRecord, RawSubmission, ValidationRules};
use enrollment_store::EnrollmentStore;
use saga::{EnrollmentSaga, PaymentProcessor};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EnrollmentStore, P: PaymentProcessor> {
    pub saga: Arc<EnrollmentSaga<S, P>>,
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub age: u8,
    pub selected_batch: &'static str,
    pub phone_number: String,
}

impl From<&EnrollmentRecord> for UserResponse {
    fn from(record: &EnrollmentRecord) -> Self {
        Self {
            id: record.id().to_string(),
            name: record.name().as_str().to_string(),
            age: record.age().years(),
            selected_batch: record.selected_batch().as_str(),
            phone_number: record.phone_number().as_str().to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct EnrollResponse {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewResponse {
    pub success: bool,
    pub user: UserResponse,
    pub enrollment_dates: Vec<NaiveDate>,
}

// -- Handlers --

/// POST /enroll: validate, create and charge for a new enrollment.
///
/// The saga runs detached from the request, so a client that disconnects
/// mid-charge cannot leave an unpaid record behind.
#[tracing::instrument(skip(state, body))]
pub async fn enroll<S: EnrollmentStore + 'static, P: PaymentProcessor + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    body: Result<Json<RawSubmission>, JsonRejection>,
) -> Result<Json<EnrollResponse>, ApiError> {
    let Json(raw) = body.map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;

    let outcome = state.saga.clone().enroll_detached(raw).await?;
    tracing::info!(
        record_id = %outcome.record.id(),
        payment_id = %outcome.receipt.payment_id,
        "enrollment completed"
    );

    Ok(Json(EnrollResponse {
        success: true,
        user: UserResponse::from(&outcome.record),
    }))
}

/// POST /enrollments/{id}/renew: enroll an existing record for the
/// current month.
#[tracing::instrument(skip(state))]
pub async fn renew<S: EnrollmentStore + 'static, P: PaymentProcessor + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
) -> Result<Json<RenewResponse>, ApiError> {
    let record_id = parse_record_id(&id)?;
    let outcome = state.saga.clone().renew_detached(record_id).await?;

    Ok(Json(RenewResponse {
        success: true,
        user: UserResponse::from(&outcome.record),
        enrollment_dates: outcome.record.enrollment_dates().to_vec(),
    }))
}

/// GET /enrollments/{id}
pub async fn get<S: EnrollmentStore + 'static, P: PaymentProcessor + 'static>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(id): Path<String>,
) -> Result<Json<EnrollmentRecord>, ApiError> {
    let record_id = parse_record_id(&id)?;
    state
        .saga
        .get_record(record_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Enrollment".to_string()))
}

/// GET /enroll/rules: the limits the validator enforces.
pub async fn rules() -> Json<ValidationRules> {
    Json(ValidationRules::current())
}

// An ID that does not parse cannot name a stored record.
fn parse_record_id(id: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(id).map_err(|_| ApiError::NotFound("Enrollment".to_string()))
}
