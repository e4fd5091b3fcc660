//! HTTP application wiring (Axum router + service wiring).
//!
//! This folder is structured like:
//! - `services.rs`: account/role orchestration over the stores
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use castellan_auth::{PasswordHasher, TokenEngine};
use castellan_infra::{PermissionStore, RoleStore, UserStore};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Store handles shared by the service layer.
///
/// All three may point at the same backing store object.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub permissions: Arc<dyn PermissionStore>,
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(config: &ApiConfig, stores: Stores) -> Router {
    let tokens = Arc::new(TokenEngine::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState {
        tokens: Arc::clone(&tokens),
    };

    let services = Arc::new(services::AppServices::new(
        stores,
        PasswordHasher::new(),
        tokens,
        config.access_ttl_secs,
        config.refresh_ttl_secs,
    ));

    // Role management sits behind bearer auth; /roles/add is pulled into the
    // open set when the open-role-create flag is on.
    let (open_roles, protected_roles) = routes::roles::routers(config.open_role_create);

    let protected_roles = protected_roles.layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth::router())
        .nest("/roles", open_roles.merge(protected_roles))
        .layer(Extension(services))
}
