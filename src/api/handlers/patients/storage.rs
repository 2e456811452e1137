//! Patient queries. Nested dental history and medical chart rows share the
//! patient id as primary key and are written in the same transaction.

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::{
    types::{DentalHistory, MedicalChart, PatientDetail, PatientRequest, PatientSummary},
    validation::age_on,
};
use crate::{
    api::handlers::{RecordError, records::Page},
    db::query_span,
};

const PATIENT_COLUMNS: &str = "id, full_name, birth_date, gender, marital_status, email, \
     mobile_number, telephone_number, created_at";

fn decode_error(err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

/// Escape `LIKE` wildcards and wrap for a substring match.
pub(super) fn name_pattern(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push('%');
    for ch in name.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn summary_from_row(row: &PgRow, today: NaiveDate) -> Result<PatientSummary, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    let birth_date: NaiveDate = row.try_get("birth_date")?;
    let gender: String = row.try_get("gender")?;
    let marital_status: String = row.try_get("marital_status")?;
    Ok(PatientSummary {
        id: id.to_string(),
        full_name: row.try_get("full_name")?,
        birth_date,
        age: age_on(birth_date, today),
        gender: gender.parse().map_err(decode_error)?,
        marital_status: marital_status.parse().map_err(decode_error)?,
        email: row.try_get("email")?,
        mobile_number: row.try_get("mobile_number")?,
        telephone_number: row.try_get("telephone_number")?,
        created_at: row.try_get("created_at")?,
    })
}

fn dental_from_row(row: &PgRow) -> Result<DentalHistory, sqlx::Error> {
    Ok(DentalHistory {
        palate: row.try_get("palate")?,
        bad_breath: row.try_get("bad_breath")?,
        bleeding_in_mouth: row.try_get("bleeding_in_mouth")?,
        gums_color_change: row.try_get("gums_color_change")?,
        lumps_in_mouth: row.try_get("lumps_in_mouth")?,
        teeth_color_change: row.try_get("teeth_color_change")?,
        sensitive_teeth: row.try_get("sensitive_teeth")?,
        clicking_sound: row.try_get("clicking_sound")?,
        past_dental_care_or_treatments: row.try_get("past_dental_care_or_treatments")?,
    })
}

fn chart_from_row(row: &PgRow) -> Result<MedicalChart, sqlx::Error> {
    Ok(MedicalChart {
        heart_ailment_or_disease: row.try_get("heart_ailment_or_disease")?,
        hospital_admission: row.try_get("hospital_admission")?,
        self_medication: row.try_get("self_medication")?,
        allergies: row.try_get("allergies")?,
        operations: row.try_get("operations")?,
        tumors_or_growth: row.try_get("tumors_or_growth")?,
        pregnant: row.try_get("pregnant")?,
        family_history_on_any: row.try_get("family_history_on_any")?,
        diabetes: row.try_get("diabetes")?,
        sinusitis: row.try_get("sinusitis")?,
        bleeding_gums: row.try_get("bleeding_gums")?,
        hypertension: row.try_get("hypertension")?,
        stomach_disease: row.try_get("stomach_disease")?,
        blood_disease: row.try_get("blood_disease")?,
        headache: row.try_get("headache")?,
        liver_disease: row.try_get("liver_disease")?,
        cold: row.try_get("cold")?,
        kidney: row.try_get("kidney")?,
    })
}

/// One page of patients ordered by name, plus the total match count.
pub(super) async fn list_patients(
    pool: &PgPool,
    name: Option<&str>,
    page: Page,
    today: NaiveDate,
) -> Result<(Vec<PatientSummary>, i64), RecordError> {
    let pattern = name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(name_pattern);

    let count_query =
        "SELECT COUNT(*) AS total FROM patients WHERE ($1::text IS NULL OR full_name ILIKE $1)";
    let total: i64 = sqlx::query(count_query)
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .instrument(query_span("SELECT", count_query))
        .await?
        .try_get("total")?;

    let query = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients \
         WHERE ($1::text IS NULL OR full_name ILIKE $1) \
         ORDER BY full_name, id LIMIT $2 OFFSET $3"
    );
    let rows = sqlx::query(&query)
        .bind(pattern.as_deref())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(pool)
        .instrument(query_span("SELECT", &query))
        .await?;

    let items = rows
        .iter()
        .map(|row| summary_from_row(row, today))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((items, total))
}

pub(super) async fn fetch_patient(
    pool: &PgPool,
    id: Uuid,
    today: NaiveDate,
) -> Result<Option<PatientDetail>, RecordError> {
    let query = format!(
        "SELECT p.{}, d.palate, d.bad_breath, d.bleeding_in_mouth, d.gums_color_change, \
         d.lumps_in_mouth, d.teeth_color_change, d.sensitive_teeth, d.clicking_sound, \
         d.past_dental_care_or_treatments, m.heart_ailment_or_disease, m.hospital_admission, \
         m.self_medication, m.allergies, m.operations, m.tumors_or_growth, m.pregnant, \
         m.family_history_on_any, m.diabetes, m.sinusitis, m.bleeding_gums, m.hypertension, \
         m.stomach_disease, m.blood_disease, m.headache, m.liver_disease, m.cold, m.kidney \
         FROM patients p \
         JOIN dental_histories d ON d.patient_id = p.id \
         JOIN medical_charts m ON m.patient_id = p.id \
         WHERE p.id = $1",
        PATIENT_COLUMNS.replace(", ", ", p.")
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    Ok(Some(PatientDetail {
        patient: summary_from_row(&row, today)?,
        dental_history: dental_from_row(&row)?,
        medical_chart: chart_from_row(&row)?,
    }))
}

/// Insert the patient and both nested records atomically.
pub(super) async fn create_patient(
    pool: &PgPool,
    request: &PatientRequest,
    birth_date: NaiveDate,
) -> Result<Uuid, RecordError> {
    let id = Uuid::now_v7();
    let mut tx = pool.begin().await?;

    let query = "INSERT INTO patients (id, full_name, birth_date, gender, marital_status, email, \
                 mobile_number, telephone_number) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";
    sqlx::query(query)
        .bind(id)
        .bind(request.full_name.trim())
        .bind(birth_date)
        .bind(request.gender.as_str())
        .bind(request.marital_status.as_str())
        .bind(request.email.trim())
        .bind(&request.mobile_number)
        .bind(&request.telephone_number)
        .execute(&mut *tx)
        .instrument(query_span("INSERT", query))
        .await?;

    write_dental_history(&mut tx, id, &request.dental_history, "INSERT").await?;
    write_medical_chart(&mut tx, id, &request.medical_chart, "INSERT").await?;

    tx.commit().await?;
    Ok(id)
}

/// Replace the patient and both nested records. Returns `false` if the id is unknown.
pub(super) async fn update_patient(
    pool: &PgPool,
    id: Uuid,
    request: &PatientRequest,
    birth_date: NaiveDate,
) -> Result<bool, RecordError> {
    let mut tx = pool.begin().await?;

    let query = "UPDATE patients SET full_name = $2, birth_date = $3, gender = $4, \
                 marital_status = $5, email = $6, mobile_number = $7, telephone_number = $8 \
                 WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .bind(request.full_name.trim())
        .bind(birth_date)
        .bind(request.gender.as_str())
        .bind(request.marital_status.as_str())
        .bind(request.email.trim())
        .bind(&request.mobile_number)
        .bind(&request.telephone_number)
        .execute(&mut *tx)
        .instrument(query_span("UPDATE", query))
        .await?;

    if result.rows_affected() == 0 {
        let _ = tx.rollback().await;
        return Ok(false);
    }

    write_dental_history(&mut tx, id, &request.dental_history, "UPDATE").await?;
    write_medical_chart(&mut tx, id, &request.medical_chart, "UPDATE").await?;

    tx.commit().await?;
    Ok(true)
}

/// Returns `false` if the id is unknown. Nested rows and treatments cascade.
pub(super) async fn delete_patient(pool: &PgPool, id: Uuid) -> Result<bool, RecordError> {
    let query = "DELETE FROM patients WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(query_span("DELETE", query))
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn write_dental_history(
    tx: &mut Transaction<'_, Postgres>,
    patient_id: Uuid,
    dental: &DentalHistory,
    operation: &'static str,
) -> Result<(), sqlx::Error> {
    let query = "INSERT INTO dental_histories (patient_id, palate, bad_breath, bleeding_in_mouth, \
                 gums_color_change, lumps_in_mouth, teeth_color_change, sensitive_teeth, \
                 clicking_sound, past_dental_care_or_treatments) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                 ON CONFLICT (patient_id) DO UPDATE SET palate = EXCLUDED.palate, \
                 bad_breath = EXCLUDED.bad_breath, bleeding_in_mouth = EXCLUDED.bleeding_in_mouth, \
                 gums_color_change = EXCLUDED.gums_color_change, \
                 lumps_in_mouth = EXCLUDED.lumps_in_mouth, \
                 teeth_color_change = EXCLUDED.teeth_color_change, \
                 sensitive_teeth = EXCLUDED.sensitive_teeth, \
                 clicking_sound = EXCLUDED.clicking_sound, \
                 past_dental_care_or_treatments = EXCLUDED.past_dental_care_or_treatments";
    sqlx::query(query)
        .bind(patient_id)
        .bind(dental.palate)
        .bind(dental.bad_breath)
        .bind(dental.bleeding_in_mouth)
        .bind(dental.gums_color_change)
        .bind(dental.lumps_in_mouth)
        .bind(dental.teeth_color_change)
        .bind(dental.sensitive_teeth)
        .bind(dental.clicking_sound)
        .bind(&dental.past_dental_care_or_treatments)
        .execute(&mut **tx)
        .instrument(query_span(operation, query))
        .await?;
    Ok(())
}

async fn write_medical_chart(
    tx: &mut Transaction<'_, Postgres>,
    patient_id: Uuid,
    chart: &MedicalChart,
    operation: &'static str,
) -> Result<(), sqlx::Error> {
    let query = "INSERT INTO medical_charts (patient_id, heart_ailment_or_disease, \
                 hospital_admission, self_medication, allergies, operations, tumors_or_growth, \
                 pregnant, family_history_on_any, diabetes, sinusitis, bleeding_gums, \
                 hypertension, stomach_disease, blood_disease, headache, liver_disease, cold, \
                 kidney) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                 $17, $18, $19) \
                 ON CONFLICT (patient_id) DO UPDATE SET \
                 heart_ailment_or_disease = EXCLUDED.heart_ailment_or_disease, \
                 hospital_admission = EXCLUDED.hospital_admission, \
                 self_medication = EXCLUDED.self_medication, allergies = EXCLUDED.allergies, \
                 operations = EXCLUDED.operations, tumors_or_growth = EXCLUDED.tumors_or_growth, \
                 pregnant = EXCLUDED.pregnant, \
                 family_history_on_any = EXCLUDED.family_history_on_any, \
                 diabetes = EXCLUDED.diabetes, sinusitis = EXCLUDED.sinusitis, \
                 bleeding_gums = EXCLUDED.bleeding_gums, hypertension = EXCLUDED.hypertension, \
                 stomach_disease = EXCLUDED.stomach_disease, \
                 blood_disease = EXCLUDED.blood_disease, headache = EXCLUDED.headache, \
                 liver_disease = EXCLUDED.liver_disease, cold = EXCLUDED.cold, \
                 kidney = EXCLUDED.kidney";
    sqlx::query(query)
        .bind(patient_id)
        .bind(&chart.heart_ailment_or_disease)
        .bind(&chart.hospital_admission)
        .bind(&chart.self_medication)
        .bind(&chart.allergies)
        .bind(&chart.operations)
        .bind(&chart.tumors_or_growth)
        .bind(&chart.pregnant)
        .bind(&chart.family_history_on_any)
        .bind(chart.diabetes)
        .bind(chart.sinusitis)
        .bind(chart.bleeding_gums)
        .bind(chart.hypertension)
        .bind(chart.stomach_disease)
        .bind(chart.blood_disease)
        .bind(chart.headache)
        .bind(chart.liver_disease)
        .bind(chart.cold)
        .bind(chart.kidney)
        .execute(&mut **tx)
        .instrument(query_span(operation, query))
        .await?;
    Ok(())
}
