//! # Clinic (patient records service)
//!
//! `clinic` is a small HTTP service for a dental clinic. Operators sign in
//! with a username and password and then manage patient records, each with a
//! dental history, a medical chart and a treatment history.
//!
//! ## Credentials
//!
//! Passwords are stored as `Argon2id` keys, hex encoded with their salt and
//! the cost parameters they were derived with.
//! Verification compares keys in constant time, and an unknown username costs
//! the same derivation as a wrong password.
//!
//! ## Sessions
//!
//! A successful login returns an HMAC-signed session token in the body and in
//! an `HttpOnly` cookie. Tokens are stateless: they are checked on every
//! protected request and expire on their own.
//!
//! ## Records
//!
//! Patients, their dental history, medical chart and treatments live in
//! `PostgreSQL` (see `sql/schema.sql`). Deleting a patient deletes everything
//! attached to it.

pub mod api;
pub mod cli;
pub mod credentials;
mod db;
#[cfg(test)]
mod test_db;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
