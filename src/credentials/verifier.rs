//! Credential verification and registration.
//!
//! Flow Overview:
//! - `register`: validate input, pre-check existence, hash, insert. The store's
//!   duplicate signal wins over the pre-check.
//! - `verify`: look up, parse the stored hash, derive on the blocking pool,
//!   compare in constant time. Unknown users still pay for one derivation.

use super::{
    error::{RegistrationFailure, VerificationFailure},
    hasher::{PasswordHash, PasswordHasher},
    store::{CredentialRecord, CredentialStore, Role, StoreError},
};
use std::sync::Arc;
use tracing::{debug, error};

pub const MAX_IDENTIFIER_CHARS: usize = 191;
pub const MAX_PASSWORD_BYTES: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub subject_id: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    #[must_use]
    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    /// Check a login attempt against the stored record.
    ///
    /// # Errors
    /// `InvalidInput` for empty fields, `NoSuchUser` and `InvalidCredentials`
    /// for authentication failures, `InternalFault` for store or hash faults.
    pub async fn verify(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, VerificationFailure> {
        if identifier.is_empty() {
            return Err(VerificationFailure::InvalidInput("username is required"));
        }
        if password.is_empty() {
            return Err(VerificationFailure::InvalidInput("password is required"));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(VerificationFailure::InvalidInput("password is too long"));
        }

        let record = self
            .store
            .find_by_identifier(identifier)
            .await
            .map_err(|err| {
                error!("Failed to look up credential record: {err}");
                VerificationFailure::InternalFault(err.to_string())
            })?;

        let Some(record) = record else {
            let hasher = self.hasher;
            let password = password.to_string();
            run_blocking(move || hasher.burn(&password))
                .await
                .map_err(VerificationFailure::InternalFault)?;
            debug!("Login attempt for unknown identifier");
            return Err(VerificationFailure::NoSuchUser);
        };

        // A corrupt hash must never fall through to a match.
        let stored = PasswordHash::parse(&record.password_hash).map_err(|err| {
            error!("Malformed password hash for {}: {err}", record.identifier);
            VerificationFailure::InternalFault(err.to_string())
        })?;

        let hasher = self.hasher;
        let password = password.to_string();
        let matched = run_blocking(move || hasher.matches(&password, &stored))
            .await
            .map_err(VerificationFailure::InternalFault)?
            .map_err(|err| {
                error!("Password derivation failed: {err}");
                VerificationFailure::InternalFault(err.to_string())
            })?;

        if matched {
            Ok(AuthenticatedIdentity {
                subject_id: record.identifier,
                role: record.role,
            })
        } else {
            debug!("Password mismatch for {}", record.identifier);
            Err(VerificationFailure::InvalidCredentials)
        }
    }

    /// Create a new operator credential.
    ///
    /// # Errors
    /// `InvalidInput` for empty or oversized fields, `AlreadyExists` when the
    /// identifier is taken, `InternalFault` for store or hash faults.
    pub async fn register(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(), RegistrationFailure> {
        if identifier.is_empty() {
            return Err(RegistrationFailure::InvalidInput("username is required"));
        }
        if identifier.chars().count() > MAX_IDENTIFIER_CHARS {
            return Err(RegistrationFailure::InvalidInput("username is too long"));
        }
        if password.is_empty() {
            return Err(RegistrationFailure::InvalidInput("password is required"));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(RegistrationFailure::InvalidInput("password is too long"));
        }

        let existing = self
            .store
            .find_by_identifier(identifier)
            .await
            .map_err(|err| {
                error!("Failed to look up credential record: {err}");
                RegistrationFailure::InternalFault(err.to_string())
            })?;
        if existing.is_some() {
            return Err(RegistrationFailure::AlreadyExists);
        }

        let hasher = self.hasher;
        let password = password.to_string();
        let hash = run_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(RegistrationFailure::InternalFault)?
            .map_err(|err| {
                error!("Failed to hash password: {err}");
                RegistrationFailure::InternalFault(err.to_string())
            })?;

        let record = CredentialRecord {
            identifier: identifier.to_string(),
            password_hash: hash.to_string(),
            role: Role::Operator,
        };

        match self.store.insert(&record).await {
            Ok(()) => Ok(()),
            Err(StoreError::Duplicate) => Err(RegistrationFailure::AlreadyExists),
            Err(err) => {
                error!("Failed to insert credential record: {err}");
                Err(RegistrationFailure::InternalFault(err.to_string()))
            }
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|err| {
        error!("Blocking task failed: {err}");
        err.to_string()
    })
}
