//! Session, registration and password hashing arguments.

use crate::{
    api::handlers::auth::{
        DEFAULT_SESSION_TTL_SECONDS, MAX_SESSION_TTL_SECONDS, MIN_SESSION_SECRET_BYTES,
    },
    credentials::KdfParams,
};
use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_ALLOW_REGISTRATION: &str = "allow-registration";
pub const ARG_KDF_MEMORY_KIB: &str = "kdf-memory-kib";
pub const ARG_KDF_ITERATIONS: &str = "kdf-iterations";
pub const ARG_KDF_PARALLELISM: &str = "kdf-parallelism";

#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub allow_registration: bool,
    pub kdf: KdfParams,
}

impl Options {
    /// # Errors
    /// Returns an error if a value is missing, the session secret is too short,
    /// or the session TTL is out of range.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .context("missing required argument: --frontend-base-url")?;

        let session_secret = matches
            .get_one::<String>(ARG_SESSION_SECRET)
            .context("missing required argument: --session-secret")?;
        if session_secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(anyhow!(
                "--session-secret must be at least {MIN_SESSION_SECRET_BYTES} bytes"
            ));
        }

        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS);
        if !(1..=MAX_SESSION_TTL_SECONDS).contains(&session_ttl_seconds) {
            return Err(anyhow!(
                "--session-ttl-seconds must be between 1 and {MAX_SESSION_TTL_SECONDS}"
            ));
        }

        let allow_registration = matches
            .get_one::<bool>(ARG_ALLOW_REGISTRATION)
            .copied()
            .unwrap_or(true);

        let defaults = KdfParams::default();
        let kdf = KdfParams::new(
            matches
                .get_one::<u32>(ARG_KDF_MEMORY_KIB)
                .copied()
                .unwrap_or(defaults.memory_kib()),
            matches
                .get_one::<u32>(ARG_KDF_ITERATIONS)
                .copied()
                .unwrap_or(defaults.iterations()),
            matches
                .get_one::<u32>(ARG_KDF_PARALLELISM)
                .copied()
                .unwrap_or(defaults.parallelism()),
        );

        Ok(Self {
            frontend_base_url,
            session_secret: SecretString::from(session_secret.clone()),
            session_ttl_seconds,
            allow_registration,
            kdf,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_kdf_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL, used as the CORS origin")
                .long_help(
                    "Frontend base URL. Its origin is the only one allowed by CORS, and an https URL marks the session cookie Secure.",
                )
                .env("CLINIC_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("HMAC key for session tokens (at least 32 bytes)")
                .env("CLINIC_SESSION_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("CLINIC_SESSION_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_ALLOW_REGISTRATION)
                .long(ARG_ALLOW_REGISTRATION)
                .help("Allow operators to self-register")
                .env("CLINIC_ALLOW_REGISTRATION")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
}

fn with_kdf_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_KDF_MEMORY_KIB)
                .long(ARG_KDF_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .env("CLINIC_KDF_MEMORY_KIB")
                .default_value("19456")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_KDF_ITERATIONS)
                .long(ARG_KDF_ITERATIONS)
                .help("Argon2id iterations")
                .env("CLINIC_KDF_ITERATIONS")
                .default_value("2")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_KDF_PARALLELISM)
                .long(ARG_KDF_PARALLELISM)
                .help("Argon2id lanes")
                .env("CLINIC_KDF_PARALLELISM")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
}
