use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token claims model (transport-agnostic).
///
/// The complete payload castellan encodes into a token: the subject it was
/// issued to and its validity window. Timestamps are seconds since the Unix
/// epoch, as the JWT NumericDate convention expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username the token was issued to.
    pub sub: String,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiry timestamp.
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: impl Into<String>, issued_at: DateTime<Utc>, ttl_secs: i64) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: subject.into(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token subject is empty")]
    EmptySubject,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate claims against a supplied clock.
///
/// Note: this validates the *claims* only. Signature verification / decoding
/// is intentionally outside this function.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.sub.is_empty() {
        return Err(TokenValidationError::EmptySubject);
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now.timestamp() >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
