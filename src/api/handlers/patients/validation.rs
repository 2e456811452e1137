use chrono::{Datelike, NaiveDate};

use super::types::PatientRequest;
use crate::api::handlers::{MAX_TEXT_CHARS, RecordError, parse_date, valid_email};

fn too_long(value: &str) -> bool {
    value.chars().count() > MAX_TEXT_CHARS
}

fn check_len(field: &str, value: &str) -> Result<(), RecordError> {
    if too_long(value) {
        return Err(RecordError::BadRequest(format!(
            "{field}: up to {MAX_TEXT_CHARS} characters only"
        )));
    }
    Ok(())
}

/// Validate a create or replace body and return the parsed birth date.
pub(super) fn validate_patient(
    request: &PatientRequest,
    today: NaiveDate,
) -> Result<NaiveDate, RecordError> {
    if request.full_name.trim().is_empty() {
        return Err(RecordError::BadRequest(
            "full_name: cannot be empty".to_string(),
        ));
    }
    check_len("full_name", &request.full_name)?;

    let birth_date = parse_date(&request.birth_date)
        .ok_or_else(|| RecordError::BadRequest("birth_date: invalid date".to_string()))?;
    if birth_date > today {
        return Err(RecordError::BadRequest(
            "birth_date: cannot be in the future".to_string(),
        ));
    }

    check_len("email", &request.email)?;
    if !valid_email(request.email.trim()) {
        return Err(RecordError::BadRequest("email: invalid email".to_string()));
    }
    check_len("mobile_number", &request.mobile_number)?;
    check_len("telephone_number", &request.telephone_number)?;

    check_len(
        "dental_history.past_dental_care_or_treatments",
        &request.dental_history.past_dental_care_or_treatments,
    )?;

    let chart = &request.medical_chart;
    for (field, value) in [
        ("heart_ailment_or_disease", &chart.heart_ailment_or_disease),
        ("hospital_admission", &chart.hospital_admission),
        ("self_medication", &chart.self_medication),
        ("allergies", &chart.allergies),
        ("operations", &chart.operations),
        ("tumors_or_growth", &chart.tumors_or_growth),
        ("pregnant", &chart.pregnant),
        ("family_history_on_any", &chart.family_history_on_any),
    ] {
        check_len(&format!("medical_chart.{field}"), value)?;
    }

    Ok(birth_date)
}

/// Completed years between `birth_date` and `today`; zero before the first birthday.
pub(crate) fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    years.max(0)
}
