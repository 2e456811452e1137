use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    state::AuthState,
    types::{CredentialsRequest, MessageResponse},
};
use crate::credentials::RegistrationFailure;

impl IntoResponse for RegistrationFailure {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidInput(message) => (StatusCode::BAD_REQUEST, message),
            Self::AlreadyExists => (StatusCode::CONFLICT, "User already exists"),
            // Detail already logged by the verifier.
            Self::InternalFault(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Operator registered", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields", body = MessageResponse),
        (status = 403, description = "Registration is disabled", body = MessageResponse),
        (status = 409, description = "Username already exists", body = MessageResponse),
        (status = 500, description = "Internal error", body = MessageResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(auth_state, payload))]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    if !auth_state.config().allow_registration() {
        return (
            StatusCode::FORBIDDEN,
            Json(MessageResponse::new("Registration is disabled")),
        )
            .into_response();
    }

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected register payload: {rejection}");
            return (
                StatusCode::BAD_REQUEST,
                Json(MessageResponse::new("Invalid payload")),
            )
                .into_response();
        }
    };

    let username = request.username.trim();
    match auth_state
        .verifier()
        .register(username, &request.password)
        .await
    {
        Ok(()) => (
            StatusCode::CREATED,
            Json(MessageResponse::new("User created")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
