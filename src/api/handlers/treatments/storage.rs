use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{TreatmentRequest, TreatmentResponse};
use crate::{
    api::handlers::RecordError,
    db::{is_foreign_key_violation, query_span},
};

const TREATMENT_COLUMNS: &str = "id, patient_id, service, service_date, procedure, created_at";

fn treatment_from_row(row: &PgRow) -> Result<TreatmentResponse, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    let patient_id: Uuid = row.try_get("patient_id")?;
    Ok(TreatmentResponse {
        id: id.to_string(),
        patient_id: patient_id.to_string(),
        service: row.try_get("service")?,
        service_date: row.try_get("service_date")?,
        procedure: row.try_get("procedure")?,
        created_at: row.try_get("created_at")?,
    })
}

/// `None` when the patient does not exist.
pub(super) async fn list_for_patient(
    pool: &PgPool,
    patient_id: Uuid,
) -> Result<Option<Vec<TreatmentResponse>>, RecordError> {
    let exists_query = "SELECT EXISTS(SELECT 1 FROM patients WHERE id = $1) AS exists";
    let exists: bool = sqlx::query(exists_query)
        .bind(patient_id)
        .fetch_one(pool)
        .instrument(query_span("SELECT", exists_query))
        .await?
        .try_get("exists")?;
    if !exists {
        return Ok(None);
    }

    let query = format!(
        "SELECT {TREATMENT_COLUMNS} FROM treatments WHERE patient_id = $1 \
         ORDER BY service_date DESC, created_at DESC"
    );
    let rows = sqlx::query(&query)
        .bind(patient_id)
        .fetch_all(pool)
        .instrument(query_span("SELECT", &query))
        .await?;
    let treatments = rows
        .iter()
        .map(treatment_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(treatments))
}

/// `None` when the patient does not exist (foreign key violation).
pub(super) async fn create_treatment(
    pool: &PgPool,
    patient_id: Uuid,
    request: &TreatmentRequest,
    service_date: NaiveDate,
) -> Result<Option<TreatmentResponse>, RecordError> {
    let query = format!(
        "INSERT INTO treatments (id, patient_id, service, service_date, procedure) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {TREATMENT_COLUMNS}"
    );
    let result = sqlx::query(&query)
        .bind(Uuid::now_v7())
        .bind(patient_id)
        .bind(request.service.trim())
        .bind(service_date)
        .bind(&request.procedure)
        .fetch_one(pool)
        .instrument(query_span("INSERT", &query))
        .await;

    match result {
        Ok(row) => Ok(Some(treatment_from_row(&row)?)),
        Err(err) if is_foreign_key_violation(&err) => Ok(None),
        Err(err) => Err(RecordError::Database(err)),
    }
}

pub(super) async fn update_treatment(
    pool: &PgPool,
    id: Uuid,
    request: &TreatmentRequest,
    service_date: NaiveDate,
) -> Result<Option<TreatmentResponse>, RecordError> {
    let query = format!(
        "UPDATE treatments SET service = $2, service_date = $3, procedure = $4 \
         WHERE id = $1 RETURNING {TREATMENT_COLUMNS}"
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(request.service.trim())
        .bind(service_date)
        .bind(&request.procedure)
        .fetch_optional(pool)
        .instrument(query_span("UPDATE", &query))
        .await?;
    Ok(row.as_ref().map(treatment_from_row).transpose()?)
}

pub(super) async fn delete_treatment(pool: &PgPool, id: Uuid) -> Result<bool, RecordError> {
    let query = "DELETE FROM treatments WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(query_span("DELETE", query))
        .await?;
    Ok(result.rows_affected() > 0)
}
