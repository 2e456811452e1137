//! Operator credentials: hashing, persistence, and verification.

mod error;
pub mod hasher;
pub mod store;
mod verifier;

pub use error::{RegistrationFailure, VerificationFailure};
pub use hasher::{KdfParams, PasswordHash, PasswordHasher};
pub use store::{
    CredentialRecord, CredentialStore, MemoryCredentialStore, PgCredentialStore, Role, StoreError,
};
pub use verifier::{AuthenticatedIdentity, CredentialVerifier, MAX_IDENTIFIER_CHARS};
