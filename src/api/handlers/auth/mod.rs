//! Auth handlers and supporting modules.
//!
//! Operators register and sign in with a username and password. A successful
//! login returns a stateless HMAC-signed session token, both in the body and
//! as the `clinic_session` cookie.
//!
//! ## Authorization Gate
//!
//! Every patient and treatment route runs behind [`gate::require_session`].
//! Missing, expired, and invalid tokens are logged as distinct causes but all
//! answer `401 Unauthorized` with the same body.
//!
//! ## Account Enumeration
//!
//! Login answers `401` with one message whether the username is unknown or
//! the password is wrong. Unknown usernames still cost one key derivation.

pub(crate) mod gate;
pub(crate) mod login;
pub(crate) mod register;
pub(crate) mod session;
mod state;
pub(crate) mod token;
pub(crate) mod types;

pub use gate::Principal;
pub use state::{
    AuthConfig, AuthState, DEFAULT_SESSION_TTL_SECONDS, MAX_SESSION_TTL_SECONDS,
    MIN_SESSION_SECRET_BYTES,
};

#[cfg(test)]
pub(crate) mod test_support {
    use super::{AuthConfig, AuthState};
    use crate::credentials::{CredentialVerifier, MemoryCredentialStore, hasher::test_hasher};
    use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION, header::InvalidHeaderValue};
    use secrecy::SecretString;
    use std::sync::Arc;

    pub(crate) const TEST_SECRET: &str = "test-session-secret-0123456789abcdef";

    pub(crate) fn auth_config() -> AuthConfig {
        AuthConfig::new(
            "http://localhost:3000".to_string(),
            SecretString::from(TEST_SECRET.to_string()),
        )
    }

    pub(crate) fn auth_state() -> AuthState {
        auth_state_with(auth_config())
    }

    pub(crate) fn auth_state_with(config: AuthConfig) -> AuthState {
        let store = Arc::new(MemoryCredentialStore::new());
        AuthState::new(config, CredentialVerifier::new(store, test_hasher()))
    }

    pub(crate) fn bearer(token: &str) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
        Ok(headers)
    }
}
