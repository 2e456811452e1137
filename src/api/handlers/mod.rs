//! API handlers and shared request validation.

pub mod auth;
pub mod health;
pub mod patients;
mod records;
pub mod root;
pub mod treatments;

use chrono::NaiveDate;
use regex::Regex;
use uuid::Uuid;

pub(crate) use records::RecordError;

pub const MAX_TEXT_CHARS: usize = 191;

/// Lightweight email sanity check.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Strict `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let shape = Regex::new(r"^\d{4}-\d{2}-\d{2}$").is_ok_and(|re| re.is_match(value));
    if !shape {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub(crate) fn parse_id(value: &str) -> Result<Uuid, RecordError> {
    Uuid::parse_str(value).map_err(|_| RecordError::BadRequest("Invalid id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@clinic.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("spaces in@example.com"));
    }

    #[test]
    fn parse_date_requires_iso_shape() {
        assert_eq!(parse_date("1990-02-28"), NaiveDate::from_ymd_opt(1990, 2, 28));
        assert_eq!(parse_date("1990-2-28"), None);
        assert_eq!(parse_date("28/02/1990"), None);
        assert_eq!(parse_date("1990-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        assert!(parse_id("0191e0e6-8a4b-7cc2-9d4e-3f2a1b0c9d8e").is_ok());
    }
}
