use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use castellan_core::{DomainError, DomainResult, UserId};

/// A registered account.
///
/// # Invariants
/// - `username` and `email` are each globally unique (enforced by the
///   stores' indexes and re-checked before registration).
/// - Only the password digest is ever held; the plaintext is hashed at the
///   registration/login boundary and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_digest: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    /// Unset until the first successful login.
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Build a new active account at registration time.
    pub fn register(
        username: impl Into<String>,
        email: impl Into<String>,
        password_digest: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let username = username.into();
        let email = email.into();

        if username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if email.trim().is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        Ok(Self {
            id: UserId::new(),
            username,
            email,
            password_digest: password_digest.into(),
            active: true,
            created_at: now,
            last_login: None,
        })
    }

    /// Stamp a successful login.
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login = Some(now);
    }
}
