//! Treatment history endpoints, nested under a patient for list and create.

mod storage;
pub(crate) mod types;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{MAX_TEXT_CHARS, RecordError, auth::Principal, parse_date, parse_id};
use types::{TreatmentRequest, TreatmentResponse};

const PATIENT_NOT_FOUND: &str = "Patient not found";
const TREATMENT_NOT_FOUND: &str = "Treatment not found";

fn validate_treatment(request: &TreatmentRequest) -> Result<NaiveDate, RecordError> {
    let service = request.service.trim();
    if service.is_empty() {
        return Err(RecordError::BadRequest(
            "service: cannot be empty".to_string(),
        ));
    }
    if service.chars().count() > MAX_TEXT_CHARS {
        return Err(RecordError::BadRequest(format!(
            "service: up to {MAX_TEXT_CHARS} characters only"
        )));
    }
    if request.procedure.trim().is_empty() {
        return Err(RecordError::BadRequest(
            "procedure: cannot be empty".to_string(),
        ));
    }
    parse_date(&request.service_date)
        .ok_or_else(|| RecordError::BadRequest("service_date: invalid date".to_string()))
}

fn parse_request(
    payload: Result<Json<TreatmentRequest>, JsonRejection>,
) -> Result<(TreatmentRequest, NaiveDate), RecordError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected treatment payload: {rejection}");
        RecordError::BadRequest("Invalid payload".to_string())
    })?;
    let service_date = validate_treatment(&request)?;
    Ok((request, service_date))
}

#[utoipa::path(
    get,
    path = "/v1/patients/{id}/treatments",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Treatments, newest service date first.", body = [TreatmentResponse]),
        (status = 400, description = "Invalid id."),
        (status = 401, description = "Missing or invalid session."),
        (status = 404, description = "Patient not found."),
    ),
    security(("session" = [])),
    tag = "treatments"
)]
pub async fn list_treatments(
    Extension(_principal): Extension<Principal>,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
) -> Response {
    let patient_id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    match storage::list_for_patient(&pool, patient_id).await {
        Ok(Some(list)) => (StatusCode::OK, Json(list)).into_response(),
        Ok(None) => RecordError::NotFound(PATIENT_NOT_FOUND).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/patients/{id}/treatments",
    params(("id" = String, Path, description = "Patient id")),
    request_body = TreatmentRequest,
    responses(
        (status = 201, description = "Treatment recorded.", body = TreatmentResponse),
        (status = 400, description = "Invalid id or input."),
        (status = 401, description = "Missing or invalid session."),
        (status = 404, description = "Patient not found."),
    ),
    security(("session" = [])),
    tag = "treatments"
)]
pub async fn create_treatment(
    Extension(principal): Extension<Principal>,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
    payload: Result<Json<TreatmentRequest>, JsonRejection>,
) -> Response {
    let patient_id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    let (request, service_date) = match parse_request(payload) {
        Ok(parsed) => parsed,
        Err(err) => return err.into_response(),
    };

    match storage::create_treatment(&pool, patient_id, &request, service_date).await {
        Ok(Some(treatment)) => {
            info!(
                treatment_id = %treatment.id,
                operator = %principal.subject_id,
                "Treatment recorded"
            );
            (StatusCode::CREATED, Json(treatment)).into_response()
        }
        Ok(None) => RecordError::NotFound(PATIENT_NOT_FOUND).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/v1/treatments/{id}",
    params(("id" = String, Path, description = "Treatment id")),
    request_body = TreatmentRequest,
    responses(
        (status = 200, description = "Treatment updated.", body = TreatmentResponse),
        (status = 400, description = "Invalid id or input."),
        (status = 401, description = "Missing or invalid session."),
        (status = 404, description = "Treatment not found."),
    ),
    security(("session" = [])),
    tag = "treatments"
)]
pub async fn update_treatment(
    Extension(_principal): Extension<Principal>,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
    payload: Result<Json<TreatmentRequest>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    let (request, service_date) = match parse_request(payload) {
        Ok(parsed) => parsed,
        Err(err) => return err.into_response(),
    };

    match storage::update_treatment(&pool, id, &request, service_date).await {
        Ok(Some(treatment)) => (StatusCode::OK, Json(treatment)).into_response(),
        Ok(None) => RecordError::NotFound(TREATMENT_NOT_FOUND).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/treatments/{id}",
    params(("id" = String, Path, description = "Treatment id")),
    responses(
        (status = 204, description = "Treatment deleted."),
        (status = 400, description = "Invalid id."),
        (status = 401, description = "Missing or invalid session."),
        (status = 404, description = "Treatment not found."),
    ),
    security(("session" = [])),
    tag = "treatments"
)]
pub async fn delete_treatment(
    Extension(_principal): Extension<Principal>,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    match storage::delete_treatment(&pool, id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => RecordError::NotFound(TREATMENT_NOT_FOUND).into_response(),
        Err(err) => err.into_response(),
    }
}
