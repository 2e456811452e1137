use crate::{
    api::{self, AuthConfig},
    cli::telemetry,
    credentials::KdfParams,
};
use anyhow::Result;
use secrecy::SecretString;
use std::fmt;
use tracing::debug;

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub allow_registration: bool,
    pub kdf: KdfParams,
}

// The DSN may carry a password.
impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &"***")
            .field("frontend_base_url", &self.frontend_base_url)
            .field("session_secret", &self.session_secret)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("allow_registration", &self.allow_registration)
            .field("kdf", &self.kdf)
            .finish()
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let auth_config = AuthConfig::new(args.frontend_base_url, args.session_secret)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_allow_registration(args.allow_registration);

    let result = api::new(args.port, args.dsn, auth_config, args.kdf).await;

    telemetry::shutdown_tracer();

    result
}
