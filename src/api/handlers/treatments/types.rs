use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TreatmentRequest {
    pub service: String,
    /// `YYYY-MM-DD`
    pub service_date: String,
    pub procedure: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TreatmentResponse {
    pub id: String,
    pub patient_id: String,
    pub service: String,
    pub service_date: NaiveDate,
    pub procedure: String,
    pub created_at: DateTime<Utc>,
}
