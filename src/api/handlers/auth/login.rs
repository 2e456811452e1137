use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, instrument};

use super::{
    session::session_cookie,
    state::AuthState,
    types::{CredentialsRequest, LoginResponse, MessageResponse},
};
use crate::credentials::VerificationFailure;

impl IntoResponse for VerificationFailure {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidInput(message) => (StatusCode::BAD_REQUEST, message),
            // Unknown user and wrong password look the same from outside.
            Self::NoSuchUser | Self::InvalidCredentials => {
                debug!("Login failed: {self}");
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            Self::InternalFault(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = LoginResponse),
        (status = 400, description = "Missing or invalid fields", body = MessageResponse),
        (status = 401, description = "Invalid username or password", body = MessageResponse),
        (status = 500, description = "Internal error", body = MessageResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, payload))]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected login payload: {rejection}");
            return (
                StatusCode::BAD_REQUEST,
                Json(MessageResponse::new("Invalid payload")),
            )
                .into_response();
        }
    };

    let identity = match auth_state
        .verifier()
        .verify(request.username.trim(), &request.password)
        .await
    {
        Ok(identity) => identity,
        Err(err) => return err.into_response(),
    };

    let issued = match auth_state
        .issuer()
        .issue(&identity, chrono::Utc::now().timestamp())
    {
        Ok(issued) => issued,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return VerificationFailure::InternalFault(err.to_string()).into_response();
        }
    };

    let mut headers = HeaderMap::new();
    match session_cookie(auth_state.config(), &issued.token) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return VerificationFailure::InternalFault(err.to_string()).into_response();
        }
    }

    let response = LoginResponse {
        ok: true,
        subject_id: issued.claims.sub,
        role: issued.claims.role,
        token: issued.token,
        expires_at: issued.claims.exp,
    };
    (StatusCode::OK, headers, Json(response)).into_response()
}
