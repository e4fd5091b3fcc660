use async_trait::async_trait;
use thiserror::Error;

use castellan_auth::{Permission, PermissionName, Role, User};
use castellan_core::UserId;

/// Store operation error.
///
/// Infrastructure failures and constraint violations. Plain misses are
/// modeled by the operations themselves (`Option` results, `bool` no-ops);
/// `NotFound` here means a *mutation* targeted a row that does not exist.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated; the payload names the field.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// The row targeted by a mutation does not exist.
    #[error("not found")]
    NotFound,

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Credential store: persists user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert or update by id. Fails with `Duplicate` when the username or
    /// email is already held by a different user.
    async fn upsert(&self, user: User) -> Result<(), StoreError>;

    /// Returns `true` when a record was removed.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

/// Role store: owns the role ↔ permission association.
///
/// `grant_permission`/`revoke_permission` are atomic read-modify-writes
/// inside the store (one write lock in memory, one transaction in Postgres),
/// so concurrent mutations of the same role cannot lose updates while
/// mutations of different roles proceed independently.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;

    /// Fails with `Duplicate` when a role with the same name exists.
    async fn insert(&self, role: Role) -> Result<(), StoreError>;

    /// Removes the role and its permission associations; the permissions
    /// themselves are untouched. Returns `true` when a role was removed.
    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError>;

    /// Add `permission` to the role's set. Returns `true` when the
    /// association is new, `false` when it was already present. Fails with
    /// `NotFound` when the role (or, in Postgres, the permission row) is
    /// missing.
    async fn grant_permission(
        &self,
        role_name: &str,
        permission: &PermissionName,
    ) -> Result<bool, StoreError>;

    /// Remove `permission` from the role's set. Removing an absent
    /// association returns `false`. Fails with `NotFound` when the role is
    /// missing.
    async fn revoke_permission(
        &self,
        role_name: &str,
        permission: &PermissionName,
    ) -> Result<bool, StoreError>;
}

/// Permission store: lookup and seeding. Permission creation is not exposed
/// over HTTP; rows arrive through seeding or operator tooling.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, StoreError>;

    /// Fails with `Duplicate` when a permission with the same name exists.
    async fn insert(&self, permission: Permission) -> Result<(), StoreError>;

    /// Returns `true` when a record was removed.
    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError>;
}
