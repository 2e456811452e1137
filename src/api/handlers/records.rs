//! Error mapping and pagination shared by the record endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use super::auth::types::MessageResponse;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug)]
pub(crate) enum RecordError {
    BadRequest(String),
    NotFound(&'static str),
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RecordError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl IntoResponse for RecordError {
    /// Database errors are logged server-side and surfaced as `500` without detail.
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(MessageResponse::new(message))).into_response()
            }
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(MessageResponse::new(message))).into_response()
            }
            Self::Database(err) => {
                error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(MessageResponse::new("Internal error")),
                )
                    .into_response()
            }
        }
    }
}

/// Resolved `limit`/`offset` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// `limit` is clamped to `1..=MAX_PAGE_LIMIT`; a negative `offset` is rejected.
    pub(crate) fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, RecordError> {
        let limit = limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(RecordError::BadRequest(
                "offset must not be negative".to_string(),
            ));
        }
        Ok(Self { limit, offset })
    }
}
