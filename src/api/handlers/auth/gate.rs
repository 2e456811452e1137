//! Authorization gate for protected routes.
//!
//! Installed with `route_layer(middleware::from_fn(require_session))`. The
//! token comes from the bearer header or the session cookie. Every rejection
//! is logged with its cause and answered with the same `401`.

use axum::{
    Json,
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    session::extract_session_token,
    state::AuthState,
    token::TokenError,
    types::MessageResponse,
};
use crate::credentials::Role;

/// Authenticated caller, available to handlers as `Extension<Principal>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: String,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum GateRejection {
    #[error("missing session token")]
    Missing,
    #[error("expired session token")]
    Expired,
    #[error("invalid session token: {0}")]
    Invalid(TokenError),
}

impl From<TokenError> for GateRejection {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::Expired,
            other => Self::Invalid(other),
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match &self {
            Self::Missing => debug!("Rejected request: {self}"),
            Self::Expired | Self::Invalid(_) => warn!("Rejected request: {self}"),
        }
        (
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse::new("Unauthorized")),
        )
            .into_response()
    }
}

/// Resolve the caller from request headers.
///
/// # Errors
/// Returns the rejection cause when no valid session is presented.
pub fn authorize(
    headers: &axum::http::HeaderMap,
    auth_state: &AuthState,
    now_unix_seconds: i64,
) -> Result<Principal, GateRejection> {
    let token = extract_session_token(headers).ok_or(GateRejection::Missing)?;
    let claims = auth_state.issuer().verify(&token, now_unix_seconds)?;
    Ok(Principal {
        subject_id: claims.sub,
        role: claims.role,
    })
}

pub async fn require_session(
    Extension(auth_state): Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authorize(request.headers(), &auth_state, chrono::Utc::now().timestamp()) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
