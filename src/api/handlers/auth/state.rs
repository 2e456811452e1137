//! Auth configuration and shared state.

use secrecy::SecretString;

use super::token::SessionIssuer;
use crate::credentials::CredentialVerifier;

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;
pub const MAX_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
pub const MIN_SESSION_SECRET_BYTES: usize = 32;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_secret: SecretString,
    session_ttl_seconds: i64,
    allow_registration: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, session_secret: SecretString) -> Self {
        Self {
            frontend_base_url,
            session_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            allow_registration: true,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_allow_registration(mut self, allow: bool) -> Self {
        self.allow_registration = allow;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn allow_registration(&self) -> bool {
        self.allow_registration
    }

    pub(super) fn session_secret(&self) -> &SecretString {
        &self.session_secret
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    verifier: CredentialVerifier,
    issuer: SessionIssuer,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, verifier: CredentialVerifier) -> Self {
        let issuer = SessionIssuer::new(
            config.session_secret().clone(),
            config.session_ttl_seconds(),
        );
        Self {
            config,
            verifier,
            issuer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    #[must_use]
    pub fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let secret = SecretString::from("x".repeat(MIN_SESSION_SECRET_BYTES));
        let config = AuthConfig::new("http://localhost:3000".to_string(), secret);

        assert_eq!(config.frontend_base_url(), "http://localhost:3000");
        assert_eq!(config.session_ttl_seconds(), DEFAULT_SESSION_TTL_SECONDS);
        assert!(config.allow_registration());
        assert!(!config.session_cookie_secure());

        let config = config
            .with_session_ttl_seconds(60)
            .with_allow_registration(false);
        assert_eq!(config.session_ttl_seconds(), 60);
        assert!(!config.allow_registration());
    }

    #[test]
    fn secure_cookie_follows_https_frontend() {
        let secret = SecretString::from("x".repeat(MIN_SESSION_SECRET_BYTES));
        let config = AuthConfig::new("https://clinic.example".to_string(), secret);
        assert!(config.session_cookie_secure());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let secret = SecretString::from("super-secret-value-that-is-long-enough".to_string());
        let config = AuthConfig::new("http://localhost:3000".to_string(), secret);
        assert!(!format!("{config:?}").contains("super-secret-value"));
    }
}
