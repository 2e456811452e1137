//! Request/response types for patient endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }
}

impl FromStr for Gender {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            "OTHER" => Ok(Self::Other),
            other => Err(UnknownVariant {
                kind: "gender",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    Single,
    Married,
    Widowed,
    Separated,
}

impl MaritalStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Married => "MARRIED",
            Self::Widowed => "WIDOWED",
            Self::Separated => "SEPARATED",
        }
    }
}

impl FromStr for MaritalStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SINGLE" => Ok(Self::Single),
            "MARRIED" => Ok(Self::Married),
            "WIDOWED" => Ok(Self::Widowed),
            "SEPARATED" => Ok(Self::Separated),
            other => Err(UnknownVariant {
                kind: "marital status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
/// Unset flags read as `false`, unset text as empty.
#[serde(default, deny_unknown_fields)]
pub struct DentalHistory {
    pub palate: bool,
    pub bad_breath: bool,
    pub bleeding_in_mouth: bool,
    pub gums_color_change: bool,
    pub lumps_in_mouth: bool,
    pub teeth_color_change: bool,
    pub sensitive_teeth: bool,
    pub clicking_sound: bool,
    pub past_dental_care_or_treatments: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct MedicalChart {
    pub heart_ailment_or_disease: String,
    pub hospital_admission: String,
    pub self_medication: String,
    pub allergies: String,
    pub operations: String,
    pub tumors_or_growth: String,
    pub pregnant: String,
    pub family_history_on_any: String,
    pub diabetes: bool,
    pub sinusitis: bool,
    pub bleeding_gums: bool,
    pub hypertension: bool,
    pub stomach_disease: bool,
    pub blood_disease: bool,
    pub headache: bool,
    pub liver_disease: bool,
    pub cold: bool,
    pub kidney: bool,
}

/// Body of create and replace requests.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PatientRequest {
    pub full_name: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub gender: Gender,
    pub marital_status: MaritalStatus,
    pub email: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub telephone_number: String,
    #[serde(default)]
    pub dental_history: DentalHistory,
    #[serde(default)]
    pub medical_chart: MedicalChart,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PatientSummary {
    pub id: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    /// Whole years at the time of the request.
    pub age: i32,
    pub gender: Gender,
    pub marital_status: MaritalStatus,
    pub email: String,
    pub mobile_number: String,
    pub telephone_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: PatientSummary,
    pub dental_history: DentalHistory,
    pub medical_chart: MedicalChart,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PatientPage {
    pub items: Vec<PatientSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientListQuery {
    /// Case-insensitive substring of the full name.
    pub name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
