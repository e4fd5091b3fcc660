use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    routing::{delete, post},
};

use crate::app::{dto, errors, services::AppServices};
use crate::context::CurrentUser;

/// Split the role-management routes into the set served without a bearer
/// token and the set behind it. `open_role_create` decides where
/// `POST /add` lands.
pub fn routers(open_role_create: bool) -> (Router, Router) {
    let mut open = Router::new();
    let mut protected = Router::new()
        .route("/delete/:role_name", delete(delete_role))
        .route("/assign-permission", post(assign_permission))
        .route("/remove-permission", post(remove_permission));

    if open_role_create {
        open = open.route("/add", post(add_role));
    } else {
        protected = protected.route("/add", post(add_role));
    }

    (open, protected)
}

pub async fn add_role(
    Extension(services): Extension<Arc<AppServices>>,
    actor: Option<Extension<CurrentUser>>,
    Json(body): Json<dto::CreateRoleRequest>,
) -> axum::response::Response {
    match services.add_role(&body.role).await {
        Ok(()) => {
            let actor = actor
                .as_ref()
                .map(|Extension(a)| a.username())
                .unwrap_or("anonymous");
            tracing::info!(actor, role = %body.role, "role added");
            errors::message_response(StatusCode::OK, "Role added successfully")
        }
        Err(e) => errors::role_error_to_response(e),
    }
}

pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentUser>,
    Path(role_name): Path<String>,
) -> axum::response::Response {
    match services.delete_role(&role_name).await {
        Ok(()) => {
            tracing::info!(actor = actor.username(), role = %role_name, "role deleted");
            errors::message_response(StatusCode::OK, "Role deleted successfully")
        }
        Err(e) => errors::role_error_to_response(e),
    }
}

pub async fn assign_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentUser>,
    Json(body): Json<dto::PermissionRequest>,
) -> axum::response::Response {
    match services
        .assign_permission(&body.username, body.role_name(), &body.permission)
        .await
    {
        Ok(()) => {
            tracing::info!(
                actor = actor.username(),
                username = %body.username,
                role = body.role_name(),
                permission = %body.permission,
                "permission assigned"
            );
            errors::message_response(StatusCode::OK, "Permission assigned to role")
        }
        Err(e) => errors::role_error_to_response(e),
    }
}

pub async fn remove_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<CurrentUser>,
    Json(body): Json<dto::PermissionRequest>,
) -> axum::response::Response {
    match services
        .remove_permission(&body.username, body.role_name(), &body.permission)
        .await
    {
        Ok(()) => {
            tracing::info!(
                actor = actor.username(),
                username = %body.username,
                role = body.role_name(),
                permission = %body.permission,
                "permission removed"
            );
            errors::message_response(StatusCode::OK, "Permission removed from role")
        }
        Err(e) => errors::role_error_to_response(e),
    }
}
