use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use castellan_core::RoleId;

use crate::permissions::PermissionName;

/// Role name. Matching is case-sensitive and exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named authorization group and the permission set it grants.
///
/// # Invariants
/// - The permission set never holds duplicates (set semantics).
/// - The role is the exclusive mutator of the association; deleting a role
///   drops the associations, never the permissions themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub permissions: BTreeSet<PermissionName>,
}

impl Role {
    /// Create a role with an empty permission set.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: RoleId::new(),
            name: RoleName::new(name),
            permissions: BTreeSet::new(),
        }
    }

    /// Grant a permission to this role.
    ///
    /// Returns `false` when the permission was already granted; granting
    /// twice leaves exactly one association.
    pub fn grant(&mut self, permission: PermissionName) -> bool {
        self.permissions.insert(permission)
    }

    /// Revoke a permission from this role.
    ///
    /// Revoking an absent association is a no-op and returns `false`.
    pub fn revoke(&mut self, permission: &PermissionName) -> bool {
        self.permissions.remove(permission)
    }

    /// Membership test over the role's permission set.
    pub fn has_permission(&self, permission: &PermissionName) -> bool {
        self.permissions.contains(permission)
    }
}
