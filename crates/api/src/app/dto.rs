use serde::Deserialize;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub role: String,
}

/// Body for assign-permission / remove-permission.
///
/// The inherited wire shape names the target role with the `permission`
/// field. `role` is accepted as an explicit override and falls back to
/// `permission` when absent, so the two lookups only coincide for legacy
/// clients.
#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub username: String,
    pub permission: String,
    pub role: Option<String>,
}

impl PermissionRequest {
    /// Name used for the role lookup.
    pub fn role_name(&self) -> &str {
        self.role.as_deref().unwrap_or(&self.permission)
    }
}
