use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use castellan_auth::{Permission, PermissionName, Role, User};
use castellan_core::UserId;

use super::r#trait::{PermissionStore, RoleStore, StoreError, UserStore};

/// In-memory store backing all three store traits.
///
/// Intended for tests/dev. Each mutation holds the relevant write lock for
/// its whole read-modify-write, so updates to one entity cannot interleave.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    roles: RwLock<HashMap<String, Role>>,
    permissions: RwLock<HashMap<String, Permission>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn upsert(&self, user: User) -> Result<(), StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        if users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(StoreError::Duplicate("username"));
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Duplicate("email"));
        }

        users.insert(user.id, user);
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(users.remove(&id).is_some())
    }
}

#[async_trait]
impl RoleStore for InMemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let roles = self
            .roles
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(roles.get(name).cloned())
    }

    async fn insert(&self, role: Role) -> Result<(), StoreError> {
        let mut roles = self
            .roles
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        if roles.contains_key(role.name.as_str()) {
            return Err(StoreError::Duplicate("role name"));
        }

        roles.insert(role.name.as_str().to_string(), role);
        Ok(())
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let mut roles = self
            .roles
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(roles.remove(name).is_some())
    }

    async fn grant_permission(
        &self,
        role_name: &str,
        permission: &PermissionName,
    ) -> Result<bool, StoreError> {
        let mut roles = self
            .roles
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let role = roles.get_mut(role_name).ok_or(StoreError::NotFound)?;
        Ok(role.grant(permission.clone()))
    }

    async fn revoke_permission(
        &self,
        role_name: &str,
        permission: &PermissionName,
    ) -> Result<bool, StoreError> {
        let mut roles = self
            .roles
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        let role = roles.get_mut(role_name).ok_or(StoreError::NotFound)?;
        Ok(role.revoke(permission))
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, StoreError> {
        let permissions = self
            .permissions
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(permissions.get(name).cloned())
    }

    async fn insert(&self, permission: Permission) -> Result<(), StoreError> {
        let mut permissions = self
            .permissions
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;

        if permissions.contains_key(permission.name.as_str()) {
            return Err(StoreError::Duplicate("permission name"));
        }

        permissions.insert(permission.name.as_str().to_string(), permission);
        Ok(())
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let mut permissions = self
            .permissions
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(permissions.remove(name).is_some())
    }
}
