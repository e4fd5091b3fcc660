use std::sync::Arc;

use axum::{Extension, Json, Router, http::StatusCode, response::IntoResponse, routing::post};

use castellan_auth::TokenPair;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    match services
        .register(&body.username, &body.email, &body.password)
        .await
    {
        Ok(()) => {
            tracing::info!(username = %body.username, "user registered");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "message": "User registered successfully" })),
            )
                .into_response()
        }
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    match services.login(&body.email, &body.password).await {
        Ok(pair) => tokens_response(pair),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn refresh_token(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RefreshTokenRequest>,
) -> axum::response::Response {
    match services.refresh(&body.refresh_token).await {
        Ok(pair) => tokens_response(pair),
        Err(e) => errors::account_error_to_response(e),
    }
}

fn tokens_response(pair: TokenPair) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "accessToken": pair.access_token,
            "refreshToken": pair.refresh_token,
        })),
    )
        .into_response()
}
