//! Salted password hashing.
//!
//! Stored hashes use the `m=<kib>,t=<iterations>,p=<lanes>$salt:key` layout:
//! the Argon2id cost parameters the record was created with, a 16-byte random
//! salt and a 64-byte derived key, both hex encoded. A bare `salt:key` record
//! carries no parameters and is checked with the hasher's own.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::{RngCore, rngs::OsRng};
use std::fmt;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 64;
const DELIMITER: char = ':';
const PARAMS_DELIMITER: char = '$';

/// Salt used to burn one derivation when a login names an unknown user.
const DUMMY_SALT: [u8; SALT_LEN] = [0x5a; SALT_LEN];

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid key derivation parameters: {0}")]
    Params(argon2::Error),
    #[error("key derivation failed: {0}")]
    Derive(argon2::Error),
    #[error("failed to read OS randomness")]
    Random,
    #[error("stored hash is missing the delimiter")]
    MissingDelimiter,
    #[error("stored hash is not valid hex")]
    Hex,
    #[error("stored hash has an invalid salt length")]
    SaltLength,
    #[error("stored hash has an invalid key length")]
    KeyLength,
    #[error("stored hash has malformed cost parameters")]
    ParamsFormat,
}

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl KdfParams {
    #[must_use]
    pub const fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    #[must_use]
    pub const fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    #[must_use]
    pub const fn parallelism(&self) -> u32 {
        self.parallelism
    }
}

impl KdfParams {
    /// Parse the `m=<kib>,t=<iterations>,p=<lanes>` prefix of a stored hash.
    fn parse(encoded: &str) -> Result<Self, HashError> {
        let mut fields = encoded.split(',').map(|field| field.split_once('='));
        let mut next = |name: &str| -> Result<u32, HashError> {
            match fields.next() {
                Some(Some((key, value))) if key == name => {
                    value.parse().map_err(|_| HashError::ParamsFormat)
                }
                _ => Err(HashError::ParamsFormat),
            }
        };
        let params = Self::new(next("m")?, next("t")?, next("p")?);
        if fields.next().is_some() {
            return Err(HashError::ParamsFormat);
        }
        Ok(params)
    }
}

impl fmt::Display for KdfParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m={},t={},p={}",
            self.memory_kib, self.iterations, self.parallelism
        )
    }
}

impl Default for KdfParams {
    /// 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        Self::new(19_456, 2, 1)
    }
}

/// Decoded form of a stored password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    params: Option<KdfParams>,
    salt: [u8; SALT_LEN],
    key: [u8; KEY_LEN],
}

impl PasswordHash {
    /// Parse the stored encoding, with or without the parameter prefix.
    ///
    /// # Errors
    /// Returns an error when the delimiter is missing, the parameters are
    /// malformed, a part is not hex, or a part has the wrong length.
    pub fn parse(encoded: &str) -> Result<Self, HashError> {
        let (params, rest) = match encoded.split_once(PARAMS_DELIMITER) {
            Some((params, rest)) => (Some(KdfParams::parse(params)?), rest),
            None => (None, encoded),
        };
        let (salt_hex, key_hex) = rest
            .split_once(DELIMITER)
            .ok_or(HashError::MissingDelimiter)?;

        let salt = hex::decode(salt_hex).map_err(|_| HashError::Hex)?;
        let key = hex::decode(key_hex).map_err(|_| HashError::Hex)?;

        Ok(Self {
            params,
            salt: salt.try_into().map_err(|_| HashError::SaltLength)?,
            key: key.try_into().map_err(|_| HashError::KeyLength)?,
        })
    }

    /// Cost parameters recorded with the hash, if any.
    #[must_use]
    pub const fn params(&self) -> Option<KdfParams> {
        self.params
    }

    #[must_use]
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    #[must_use]
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(params) = self.params {
            write!(f, "{params}{PARAMS_DELIMITER}")?;
        }
        write!(
            f,
            "{}{DELIMITER}{}",
            hex::encode(self.salt),
            hex::encode(self.key)
        )
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHash")
            .field("params", &self.params)
            .field("salt", &hex::encode(self.salt))
            .field("key", &"***")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordHasher {
    params: KdfParams,
}

impl PasswordHasher {
    #[must_use]
    pub const fn new(params: KdfParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub const fn params(&self) -> KdfParams {
        self.params
    }

    /// Check the parameters once at startup so bad config fails early.
    ///
    /// # Errors
    /// Returns an error if Argon2 rejects the parameters.
    pub fn validate(&self) -> Result<(), HashError> {
        build_argon2(self.params).map(|_| ())
    }

    /// Derive a fixed-length key from `password` and `salt`.
    ///
    /// # Errors
    /// Returns an error if the parameters or the salt are rejected by Argon2.
    pub fn derive(&self, password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], HashError> {
        derive_with(self.params, password, salt)
    }

    /// Generate a new random salt.
    ///
    /// # Errors
    /// Returns an error if the OS randomness source fails.
    pub fn new_salt() -> Result<[u8; SALT_LEN], HashError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|_| HashError::Random)?;
        Ok(salt)
    }

    /// Salt and hash a plaintext password for storage.
    ///
    /// # Errors
    /// Returns an error if salt generation or derivation fails.
    pub fn hash_password(&self, password: &str) -> Result<PasswordHash, HashError> {
        let salt = Self::new_salt()?;
        let key = self.derive(password, &salt)?;
        Ok(PasswordHash {
            params: Some(self.params),
            salt,
            key,
        })
    }

    /// Derive `password` against the stored salt, with the parameters stored
    /// alongside it, and compare in constant time.
    ///
    /// # Errors
    /// Returns an error if derivation fails.
    pub fn matches(&self, password: &str, stored: &PasswordHash) -> Result<bool, HashError> {
        let params = stored.params.unwrap_or(self.params);
        let candidate = derive_with(params, password, &stored.salt)?;
        Ok(keys_match(&stored.key, &candidate))
    }

    /// Spend one derivation without a stored record.
    pub fn burn(&self, password: &str) {
        let _ = self.derive(password, &DUMMY_SALT);
    }
}

fn build_argon2(params: KdfParams) -> Result<Argon2<'static>, HashError> {
    let params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(HashError::Params)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn derive_with(
    params: KdfParams,
    password: &str,
    salt: &[u8],
) -> Result<[u8; KEY_LEN], HashError> {
    let mut key = [0u8; KEY_LEN];
    build_argon2(params)?
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(HashError::Derive)?;
    Ok(key)
}

/// Constant-time key comparison. Length is public; content is not.
#[must_use]
pub fn keys_match(stored: &[u8], candidate: &[u8]) -> bool {
    stored.ct_eq(candidate).into()
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(KdfParams::new(64, 1, 1))
}
