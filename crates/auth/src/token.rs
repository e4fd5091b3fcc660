use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::claims::{Claims, validate_claims};

/// Default lifetime of an access token (1 hour).
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3_600;

/// Default lifetime of a refresh token (1 day).
pub const REFRESH_TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token subject must not be empty")]
    EmptySubject,

    #[error("token ttl must be positive (got {0})")]
    NonPositiveTtl(i64),

    #[error("token encoding failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    /// Signature, format, or payload failure. Deliberately carries no detail
    /// about which check failed.
    #[error("invalid token")]
    Invalid,
}

/// An access/refresh token pair as handed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates self-contained HS256 bearer tokens.
///
/// The signing secret is injected once at construction and never changes
/// afterwards; issue/validate are pure functions of their inputs, the clock,
/// and that secret. Validation is stateless — there is no revocation table,
/// so a token stays acceptable until its expiry.
///
/// Access and refresh tokens share this structure and differ only in TTL.
pub struct TokenEngine {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
}

impl TokenEngine {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `validate_at`; the
        // decoder's own wall-clock check stays off.
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            header: Header::new(Algorithm::HS256),
            validation,
        }
    }

    /// Issue a signed token for `subject`, valid for `ttl_secs` from now.
    pub fn issue(&self, subject: &str, ttl_secs: i64) -> Result<String, TokenError> {
        self.issue_at(subject, ttl_secs, Utc::now())
    }

    /// Issue against an explicit clock. Prefer this in tests.
    pub fn issue_at(
        &self,
        subject: &str,
        ttl_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if subject.is_empty() {
            return Err(TokenError::EmptySubject);
        }
        if ttl_secs <= 0 {
            return Err(TokenError::NonPositiveTtl(ttl_secs));
        }

        let claims = Claims::new(subject, now, ttl_secs);
        encode(&self.header, &claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    /// True iff the signature verifies, the payload is well-formed, and the
    /// token has not expired.
    ///
    /// Never panics. Malformed, tampered, and expired tokens are
    /// indistinguishable to callers: all yield `false`.
    pub fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now())
    }

    /// Validate against an explicit clock.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        let claims = match self.decode(token) {
            Ok(claims) => claims,
            Err(_) => return false,
        };

        match validate_claims(&claims, now) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "token rejected");
                false
            }
        }
    }

    /// Subject embedded at issuance.
    ///
    /// Callers must `validate` first; a token whose signature or format does
    /// not check out yields `TokenError::Invalid`. Expiry is not re-checked
    /// here.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.decode(token)?.sub)
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}
