use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use castellan_core::PermissionId;

/// Permission name (e.g. "read:budget").
///
/// Permission names are opaque strings at this layer; what a permission
/// means is decided by the resource servers that consult it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(Cow<'static, str>);

impl PermissionName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named, atomic capability that can be granted via roles.
///
/// Permissions are created and deleted independently of roles; roles hold
/// the association, permissions hold no back-reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: PermissionName,
}

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: PermissionId::new(),
            name: PermissionName::new(name),
        }
    }
}
