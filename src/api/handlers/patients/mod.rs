//! Patient record endpoints.
//!
//! Every route runs behind the authorization gate. Handlers parse and
//! validate input; `storage` owns the SQL. A patient always carries exactly one
//! dental history and one medical chart, created and replaced together with it.

mod storage;
pub(crate) mod types;
mod validation;

use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{RecordError, auth::Principal, parse_id, records::Page};
use types::{PatientDetail, PatientListQuery, PatientPage, PatientRequest};

const PATIENT_NOT_FOUND: &str = "Patient not found";

fn invalid_payload(rejection: &JsonRejection) -> RecordError {
    debug!("Rejected patient payload: {rejection}");
    RecordError::BadRequest("Invalid payload".to_string())
}

#[utoipa::path(
    get,
    path = "/v1/patients",
    params(PatientListQuery),
    responses(
        (status = 200, description = "Page of patients ordered by name.", body = PatientPage),
        (status = 400, description = "Invalid pagination parameters."),
        (status = 401, description = "Missing or invalid session."),
    ),
    security(("session" = [])),
    tag = "patients"
)]
pub async fn list_patients(
    Extension(_principal): Extension<Principal>,
    pool: Extension<PgPool>,
    query: Result<Query<PatientListQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return RecordError::BadRequest(rejection.body_text()).into_response();
        }
    };
    let page = match Page::new(query.limit, query.offset) {
        Ok(page) => page,
        Err(err) => return err.into_response(),
    };

    let today = Utc::now().date_naive();
    match storage::list_patients(&pool, query.name.as_deref(), page, today).await {
        Ok((items, total)) => (
            StatusCode::OK,
            Json(PatientPage {
                items,
                total,
                limit: page.limit,
                offset: page.offset,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient with dental history and medical chart.", body = PatientDetail),
        (status = 400, description = "Invalid id."),
        (status = 401, description = "Missing or invalid session."),
        (status = 404, description = "Patient not found."),
    ),
    security(("session" = [])),
    tag = "patients"
)]
pub async fn get_patient(
    Extension(_principal): Extension<Principal>,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    match storage::fetch_patient(&pool, id, Utc::now().date_naive()).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail)).into_response(),
        Ok(None) => RecordError::NotFound(PATIENT_NOT_FOUND).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/patients",
    request_body = PatientRequest,
    responses(
        (status = 201, description = "Patient created.", body = PatientDetail),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid session."),
    ),
    security(("session" = [])),
    tag = "patients"
)]
pub async fn create_patient(
    Extension(principal): Extension<Principal>,
    pool: Extension<PgPool>,
    payload: Result<Json<PatientRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_payload(&rejection).into_response(),
    };
    let today = Utc::now().date_naive();
    let birth_date = match validation::validate_patient(&request, today) {
        Ok(date) => date,
        Err(err) => return err.into_response(),
    };

    let id = match storage::create_patient(&pool, &request, birth_date).await {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!(patient_id = %id, operator = %principal.subject_id, "Patient created");

    match storage::fetch_patient(&pool, id, today).await {
        Ok(Some(detail)) => (StatusCode::CREATED, Json(detail)).into_response(),
        Ok(None) => RecordError::NotFound(PATIENT_NOT_FOUND).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/v1/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientRequest,
    responses(
        (status = 200, description = "Patient replaced.", body = PatientDetail),
        (status = 400, description = "Invalid id or input."),
        (status = 401, description = "Missing or invalid session."),
        (status = 404, description = "Patient not found."),
    ),
    security(("session" = [])),
    tag = "patients"
)]
pub async fn update_patient(
    Extension(principal): Extension<Principal>,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
    payload: Result<Json<PatientRequest>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_payload(&rejection).into_response(),
    };
    let today = Utc::now().date_naive();
    let birth_date = match validation::validate_patient(&request, today) {
        Ok(date) => date,
        Err(err) => return err.into_response(),
    };

    match storage::update_patient(&pool, id, &request, birth_date).await {
        Ok(true) => {}
        Ok(false) => return RecordError::NotFound(PATIENT_NOT_FOUND).into_response(),
        Err(err) => return err.into_response(),
    }
    info!(patient_id = %id, operator = %principal.subject_id, "Patient updated");

    match storage::fetch_patient(&pool, id, today).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail)).into_response(),
        Ok(None) => RecordError::NotFound(PATIENT_NOT_FOUND).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 204, description = "Patient deleted with its nested records and treatments."),
        (status = 400, description = "Invalid id."),
        (status = 401, description = "Missing or invalid session."),
        (status = 404, description = "Patient not found."),
    ),
    security(("session" = [])),
    tag = "patients"
)]
pub async fn delete_patient(
    Extension(principal): Extension<Principal>,
    pool: Extension<PgPool>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    match storage::delete_patient(&pool, id).await {
        Ok(true) => {
            info!(patient_id = %id, operator = %principal.subject_id, "Patient deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => RecordError::NotFound(PATIENT_NOT_FOUND).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests;
