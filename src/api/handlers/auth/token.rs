//! Stateless session tokens.
//!
//! `base64url(header).base64url(claims).base64url(HMAC-SHA256)` keyed with the
//! configured session secret. Nothing is stored server-side; a token is valid
//! until `exp` and sign-out is handled by the client dropping it.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use ulid::Ulid;

use crate::credentials::{AuthenticatedIdentity, Role};

pub const TOKEN_VERSION: u8 = 1;
const TOKEN_ALG: &str = "HS256";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid token version")]
    InvalidVersion,
    #[error("token expired")]
    Expired,
    #[error("token expiry out of range")]
    ExpiryOverflow,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: TOKEN_ALG.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub v: u8,
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

#[derive(Clone, Debug)]
pub struct SessionIssuer {
    secret: SecretString,
    ttl_seconds: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

impl SessionIssuer {
    #[must_use]
    pub fn new(secret: SecretString, ttl_seconds: i64) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }

    /// Mint a token for a verified identity.
    ///
    /// # Errors
    /// Returns an error if `exp` does not fit in an `i64` or the header or
    /// claims cannot be encoded.
    pub fn issue(
        &self,
        identity: &AuthenticatedIdentity,
        now_unix_seconds: i64,
    ) -> Result<IssuedSession, TokenError> {
        let exp = now_unix_seconds
            .checked_add(self.ttl_seconds)
            .ok_or(TokenError::ExpiryOverflow)?;
        let claims = SessionClaims {
            v: TOKEN_VERSION,
            sub: identity.subject_id.clone(),
            role: identity.role,
            iat: now_unix_seconds,
            exp,
            jti: Ulid::new().to_string(),
        };

        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(IssuedSession {
            token: format!("{signing_input}.{signature_b64}"),
            claims,
        })
    }

    /// Check the signature, then the claims.
    ///
    /// # Errors
    /// Returns an error if the token is malformed, the signature does not
    /// match, the version is unknown, or `exp` has passed.
    pub fn verify(&self, token: &str, now_unix_seconds: i64) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        if parts.next().is_some() {
            return Err(TokenError::TokenFormat);
        }

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != TOKEN_ALG {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac()?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.v != TOKEN_VERSION {
            return Err(TokenError::InvalidVersion);
        }
        if claims.exp <= now_unix_seconds {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn issuer(secret: &str) -> SessionIssuer {
        SessionIssuer::new(SecretString::from(secret.to_string()), 3600)
    }

    fn admin() -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            subject_id: "admin".to_string(),
            role: Role::Operator,
        }
    }

    fn swap_part(token: &str, index: usize, replacement: &str) -> String {
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[index] = replacement;
        parts.join(".")
    }

    #[test]
    fn issue_and_verify() -> Result<(), TokenError> {
        let issuer = issuer("0123456789abcdef0123456789abcdef");
        let issued = issuer.issue(&admin(), NOW)?;

        assert_eq!(issued.claims.exp, NOW + 3600);
        assert_eq!(issued.token.split('.').count(), 3);

        let claims = issuer.verify(&issued.token, NOW + 1)?;
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role, Role::Operator);
        assert_eq!(claims.v, TOKEN_VERSION);
        assert_eq!(claims, issued.claims);
        Ok(())
    }

    #[test]
    fn jti_is_unique_per_issue() -> Result<(), TokenError> {
        let issuer = issuer("0123456789abcdef0123456789abcdef");
        let first = issuer.issue(&admin(), NOW)?;
        let second = issuer.issue(&admin(), NOW)?;
        assert_ne!(first.claims.jti, second.claims.jti);
        Ok(())
    }

    #[test]
    fn rejects_expired() -> Result<(), TokenError> {
        let issuer = issuer("0123456789abcdef0123456789abcdef");
        let issued = issuer.issue(&admin(), NOW)?;
        assert!(matches!(
            issuer.verify(&issued.token, NOW + 3600),
            Err(TokenError::Expired)
        ));
        Ok(())
    }

    #[test]
    fn oversized_ttl_fails_to_issue() {
        let issuer = SessionIssuer::new(
            SecretString::from("0123456789abcdef0123456789abcdef".to_string()),
            i64::MAX,
        );
        assert!(matches!(
            issuer.issue(&admin(), NOW),
            Err(TokenError::ExpiryOverflow)
        ));
    }

    #[test]
    fn rejects_tampered_claims() -> Result<(), TokenError> {
        let issuer = issuer("0123456789abcdef0123456789abcdef");
        let issued = issuer.issue(&admin(), NOW)?;

        let mut forged = issued.claims.clone();
        forged.sub = "mallory".to_string();
        let forged_b64 = b64e_json(&forged)?;
        let tampered = swap_part(&issued.token, 1, &forged_b64);

        assert!(matches!(
            issuer.verify(&tampered, NOW),
            Err(TokenError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn rejects_tampered_signature() -> Result<(), TokenError> {
        let issuer = issuer("0123456789abcdef0123456789abcdef");
        let issued = issuer.issue(&admin(), NOW)?;
        let bogus = Base64UrlUnpadded::encode_string(&[0u8; 32]);
        let tampered = swap_part(&issued.token, 2, &bogus);

        assert!(matches!(
            issuer.verify(&tampered, NOW),
            Err(TokenError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn rejects_wrong_secret() -> Result<(), TokenError> {
        let issued = issuer("0123456789abcdef0123456789abcdef").issue(&admin(), NOW)?;
        let other = issuer("fedcba9876543210fedcba9876543210");
        assert!(matches!(
            other.verify(&issued.token, NOW),
            Err(TokenError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn rejects_malformed_tokens() {
        let issuer = issuer("0123456789abcdef0123456789abcdef");
        assert!(matches!(
            issuer.verify("only.two", NOW),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            issuer.verify("a.b.c.d", NOW),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            issuer.verify("!!.??.**", NOW),
            Err(TokenError::Base64)
        ));
    }

    #[test]
    fn rejects_other_algorithms() -> Result<(), TokenError> {
        let issuer = issuer("0123456789abcdef0123456789abcdef");
        let issued = issuer.issue(&admin(), NOW)?;
        let none_header = b64e_json(&TokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })?;
        let tampered = swap_part(&issued.token, 0, &none_header);
        assert!(matches!(
            issuer.verify(&tampered, NOW),
            Err(TokenError::UnsupportedAlg(alg)) if alg == "none"
        ));
        Ok(())
    }
}
