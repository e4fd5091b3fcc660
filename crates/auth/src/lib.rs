//! `castellan-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod token;
pub mod user;

pub use claims::{Claims, TokenValidationError, validate_claims};
pub use password::{PasswordError, PasswordHasher};
pub use permissions::{Permission, PermissionName};
pub use roles::{Role, RoleName};
pub use token::{
    ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenEngine, TokenError, TokenPair,
};
pub use user::User;
