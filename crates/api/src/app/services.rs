//! Account/role orchestration over the stores.
//!
//! Handlers stay thin: they deserialize, call one of these operations, and
//! translate the `Result` into a response.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use castellan_auth::{PasswordHasher, PermissionName, Role, TokenEngine, TokenPair, User};
use castellan_infra::StoreError;

use crate::app::Stores;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username already exists")]
    UsernameTaken,

    #[error("email already exists")]
    EmailTaken,

    #[error("{0}")]
    InvalidRegistration(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum RoleError {
    #[error("role already exists")]
    RoleExists,

    #[error("role not found")]
    RoleNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("permission not found")]
    PermissionNotFound,

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            // Uniqueness races lost against a concurrent registration.
            StoreError::Duplicate("username") => Self::UsernameTaken,
            StoreError::Duplicate("email") => Self::EmailTaken,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for RoleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate("role name") => Self::RoleExists,
            StoreError::NotFound => Self::RoleNotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

pub struct AppServices {
    stores: Stores,
    hasher: PasswordHasher,
    tokens: Arc<TokenEngine>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl AppServices {
    pub fn new(
        stores: Stores,
        hasher: PasswordHasher,
        tokens: Arc<TokenEngine>,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            stores,
            hasher,
            tokens,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Register a new account: uniqueness checks, then hash, then persist.
    ///
    /// "Already exists" is checked before any mutation; username is checked
    /// before email.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AccountError> {
        if self.stores.users.find_by_username(username).await?.is_some() {
            return Err(AccountError::UsernameTaken);
        }
        if self.stores.users.find_by_email(email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let digest = self
            .hasher
            .hash(password)
            .map_err(|e| AccountError::InvalidRegistration(e.to_string()))?;
        let user = User::register(username, email, digest, Utc::now())
            .map_err(|e| AccountError::InvalidRegistration(e.to_string()))?;

        self.stores.users.upsert(user).await?;
        Ok(())
    }

    /// Verify credentials and issue an access+refresh pair.
    ///
    /// A missing account, a wrong password, and a deactivated account are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AccountError> {
        let Some(mut user) = self.stores.users.find_by_email(email).await? else {
            return Err(AccountError::InvalidCredentials);
        };

        let verified = self
            .hasher
            .verify(password, &user.password_digest)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "stored digest could not be verified");
                false
            });
        if !verified || !user.active {
            return Err(AccountError::InvalidCredentials);
        }

        let pair = self.issue_pair(&user.username)?;

        user.record_login(Utc::now());
        self.stores.users.upsert(user).await?;

        Ok(pair)
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// The refresh token itself is echoed back unchanged; rotation is not
    /// performed, so a refresh token stays usable until its own expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AccountError> {
        if !self.tokens.validate(refresh_token) {
            return Err(AccountError::InvalidRefreshToken);
        }
        let subject = self
            .tokens
            .extract_subject(refresh_token)
            .map_err(|_| AccountError::InvalidRefreshToken)?;

        let access_token = self
            .tokens
            .issue(&subject, self.access_ttl_secs)
            .map_err(|e| AccountError::Internal(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    fn issue_pair(&self, subject: &str) -> Result<TokenPair, AccountError> {
        let access_token = self
            .tokens
            .issue(subject, self.access_ttl_secs)
            .map_err(|e| AccountError::Internal(e.to_string()))?;
        let refresh_token = self
            .tokens
            .issue(subject, self.refresh_ttl_secs)
            .map_err(|e| AccountError::Internal(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Create a role with an empty permission set. Name matching is
    /// case-sensitive.
    pub async fn add_role(&self, name: &str) -> Result<(), RoleError> {
        if self.stores.roles.find_by_name(name).await?.is_some() {
            return Err(RoleError::RoleExists);
        }
        self.stores.roles.insert(Role::new(name.to_string())).await?;
        Ok(())
    }

    /// Delete a role and its permission associations; the permissions
    /// themselves survive.
    pub async fn delete_role(&self, name: &str) -> Result<(), RoleError> {
        if !self.stores.roles.delete_by_name(name).await? {
            return Err(RoleError::RoleNotFound);
        }
        Ok(())
    }

    /// Attach a permission to a role.
    ///
    /// Lookup order is fixed — acting user, then role, then permission — and
    /// the first miss decides the error. Granting an already-granted
    /// permission succeeds without duplicating the association.
    pub async fn assign_permission(
        &self,
        username: &str,
        role_name: &str,
        permission_name: &str,
    ) -> Result<(), RoleError> {
        self.resolve_assignment(username, role_name, permission_name)
            .await?;

        let permission = PermissionName::new(permission_name.to_string());
        self.stores
            .roles
            .grant_permission(role_name, &permission)
            .await?;
        Ok(())
    }

    /// Detach a permission from a role. Removing an absent association is a
    /// no-op success.
    pub async fn remove_permission(
        &self,
        username: &str,
        role_name: &str,
        permission_name: &str,
    ) -> Result<(), RoleError> {
        self.resolve_assignment(username, role_name, permission_name)
            .await?;

        let permission = PermissionName::new(permission_name.to_string());
        self.stores
            .roles
            .revoke_permission(role_name, &permission)
            .await?;
        Ok(())
    }

    async fn resolve_assignment(
        &self,
        username: &str,
        role_name: &str,
        permission_name: &str,
    ) -> Result<(), RoleError> {
        if self.stores.users.find_by_username(username).await?.is_none() {
            return Err(RoleError::UserNotFound);
        }
        if self.stores.roles.find_by_name(role_name).await?.is_none() {
            return Err(RoleError::RoleNotFound);
        }
        if self
            .stores
            .permissions
            .find_by_name(permission_name)
            .await?
            .is_none()
        {
            return Err(RoleError::PermissionNotFound);
        }
        Ok(())
    }
}
