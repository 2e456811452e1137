//! Credential persistence.
//!
//! The store only needs two operations: lookup by identifier and insert. The
//! unique index on `users.username` is the source of truth for uniqueness; a
//! concurrent duplicate insert surfaces as [`StoreError::Duplicate`].

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::{collections::HashMap, fmt, future::Future, pin::Pin, str::FromStr};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::Instrument;
use utoipa::ToSchema;

use crate::db::{is_unique_violation, query_span};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential record already exists")]
    Duplicate,
    #[error("credential store failure: {0}")]
    Backend(String),
}

/// Role tag bound into every session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Operator,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "operator" => Ok(Self::Operator),
            other => Err(StoreError::Backend(format!("unknown role: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialRecord {
    pub identifier: String,
    pub password_hash: String,
    pub role: Role,
}

pub trait CredentialStore: Send + Sync {
    fn find_by_identifier<'a>(
        &'a self,
        identifier: &'a str,
    ) -> StoreFuture<'a, Option<CredentialRecord>>;

    fn insert<'a>(&'a self, record: &'a CredentialRecord) -> StoreFuture<'a, ()>;
}

/// `users` table backed store.
#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CredentialStore for PgCredentialStore {
    fn find_by_identifier<'a>(
        &'a self,
        identifier: &'a str,
    ) -> StoreFuture<'a, Option<CredentialRecord>> {
        Box::pin(async move {
            let query = "SELECT username, password_hash, role FROM users WHERE username = $1";
            let span = query_span("SELECT", query);
            let row = sqlx::query(query)
                .bind(identifier)
                .fetch_optional(&self.pool)
                .instrument(span)
                .await
                .map_err(|err| StoreError::Backend(err.to_string()))?;

            row.map(|row| -> Result<CredentialRecord, StoreError> {
                let backend = |err: sqlx::Error| StoreError::Backend(err.to_string());
                let role: String = row.try_get("role").map_err(backend)?;
                Ok(CredentialRecord {
                    identifier: row.try_get("username").map_err(backend)?,
                    password_hash: row.try_get("password_hash").map_err(backend)?,
                    role: role.parse()?,
                })
            })
            .transpose()
        })
    }

    fn insert<'a>(&'a self, record: &'a CredentialRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let query = "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3)";
            let span = query_span("INSERT", query);
            sqlx::query(query)
                .bind(&record.identifier)
                .bind(&record.password_hash)
                .bind(record.role.as_str())
                .execute(&self.pool)
                .instrument(span)
                .await
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        StoreError::Duplicate
                    } else {
                        StoreError::Backend(err.to_string())
                    }
                })?;
            Ok(())
        })
    }
}

/// In-process store keyed by identifier.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<String, CredentialRecord>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn find_by_identifier<'a>(
        &'a self,
        identifier: &'a str,
    ) -> StoreFuture<'a, Option<CredentialRecord>> {
        Box::pin(async move { Ok(self.records.lock().await.get(identifier).cloned()) })
    }

    fn insert<'a>(&'a self, record: &'a CredentialRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut records = self.records.lock().await;
            if records.contains_key(&record.identifier) {
                return Err(StoreError::Duplicate);
            }
            records.insert(record.identifier.clone(), record.clone());
            Ok(())
        })
    }
}
