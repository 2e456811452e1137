use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationFailure {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("no such user")]
    NoSuchUser,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("internal fault: {0}")]
    InternalFault(String),
}

#[derive(Debug, Error)]
pub enum RegistrationFailure {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("identifier already exists")]
    AlreadyExists,
    #[error("internal fault: {0}")]
    InternalFault(String),
}
