use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use castellan_api::app::{self, Stores};
use castellan_api::config::ApiConfig;
use castellan_auth::Permission;
use castellan_infra::{InMemoryStore, PermissionStore, RoleStore};

struct TestServer {
    base_url: String,
    store: Arc<InMemoryStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(ApiConfig::default()).await
    }

    async fn spawn_with(config: ApiConfig) -> Self {
        // Build the app (same router as prod) over a fresh in-memory store,
        // bound to an ephemeral port. The store handle stays available for
        // seeding permissions, which have no HTTP surface.
        let store = Arc::new(InMemoryStore::new());
        let stores = Stores {
            users: store.clone(),
            roles: store.clone(),
            permissions: store.clone(),
        };
        let app = app::build_app(&config, stores);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    async fn seed_permission(&self, name: &str) {
        PermissionStore::insert(self.store.as_ref(), Permission::new(name.to_string()))
            .await
            .unwrap();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn register(client: &reqwest::Client, base_url: &str, username: &str, email: &str) {
    let res = client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({ "username": username, "email": email, "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

async fn login(client: &reqwest::Client, base_url: &str, email: &str) -> (String, String) {
    let res = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "email": email, "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn register_login_refresh_round_trip() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Register
    let res = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({ "username": "alice", "email": "alice@x.com", "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully");

    // Login
    let (access, refresh) = login(&client, &srv.base_url, "alice@x.com").await;
    assert!(!access.is_empty());
    assert!(!refresh.is_empty());

    // Refresh after the issued-at second has rolled over, so the new access
    // token cannot be byte-identical to the old one.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let res = client
        .post(format!("{}/auth/refresh-token", srv.base_url))
        .json(&json!({ "refreshToken": refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_ne!(body["accessToken"].as_str().unwrap(), access);
    assert_eq!(body["refreshToken"].as_str().unwrap(), refresh);
}

#[tokio::test]
async fn duplicate_username_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "alice", "alice@x.com").await;

    let res = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({ "username": "alice", "email": "other@x.com", "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["code"], 400);
    assert_eq!(body["message"], "Bad Request");
    assert!(body["details"].as_str().unwrap().contains("already exists"));
    assert_eq!(body["details"], "User already exists");
}

#[tokio::test]
async fn duplicate_email_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "alice", "alice@x.com").await;

    let res = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({ "username": "bob", "email": "alice@x.com", "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["details"], "Email already exists");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "alice", "alice@x.com").await;

    // Unknown email.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "ghost@x.com", "password": "pw123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let unknown_email: serde_json::Value = res.json().await.unwrap();

    // Known email, wrong password.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "alice@x.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let wrong_password: serde_json::Value = res.json().await.unwrap();

    // No user-existence leakage: identical bodies.
    assert_eq!(unknown_email, wrong_password);
    assert_eq!(unknown_email["details"], "Invalid email or password");
}

#[tokio::test]
async fn refresh_rejects_garbage_and_expired_tokens() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for bad in ["not-a-token", "a.b.c"] {
        let res = client
            .post(format!("{}/auth/refresh-token", srv.base_url))
            .json(&json!({ "refreshToken": bad }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["details"], "Invalid refresh token");
    }

    // A structurally valid but long-expired token, minted with the same
    // dev-default secret the server runs on.
    let engine = castellan_auth::TokenEngine::new(b"dev-secret");
    let expired = engine
        .issue_at("alice", 60, chrono::Utc::now() - chrono::Duration::hours(2))
        .unwrap();

    let res = client
        .post(format!("{}/auth/refresh-token", srv.base_url))
        .json(&json!({ "refreshToken": expired }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .delete(format!("{}/roles/delete/ghost", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/roles/assign-permission", srv.base_url))
        .json(&json!({ "username": "alice", "permission": "read:budget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "alice", "alice@x.com").await;
    let (access, _) = login(&client, &srv.base_url, "alice@x.com").await;

    // /roles/add is open in the default configuration.
    let res = client
        .post(format!("{}/roles/add", srv.base_url))
        .json(&json!({ "role": "editor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Role added successfully");

    // Duplicate role.
    let res = client
        .post(format!("{}/roles/add", srv.base_url))
        .json(&json!({ "role": "editor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Role already exists");

    // Delete needs the bearer token.
    let res = client
        .delete(format!("{}/roles/delete/editor", srv.base_url))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Deleting a missing role is a 404.
    let res = client
        .delete(format!("{}/roles/delete/ghost", srv.base_url))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Role not found");
}

#[tokio::test]
async fn assign_and_remove_permission_round_trip() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.seed_permission("read:budget").await;
    register(&client, &srv.base_url, "bob", "bob@x.com").await;
    let (access, _) = login(&client, &srv.base_url, "bob@x.com").await;

    // Legacy wire shape: the `permission` field also names the role, so the
    // role must carry the permission's name.
    let res = client
        .post(format!("{}/roles/add", srv.base_url))
        .json(&json!({ "role": "read:budget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let assign = json!({ "username": "bob", "permission": "read:budget" });

    let res = client
        .post(format!("{}/roles/assign-permission", srv.base_url))
        .bearer_auth(&access)
        .json(&assign)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Permission assigned to role");

    // Assigning twice leaves exactly one association.
    let res = client
        .post(format!("{}/roles/assign-permission", srv.base_url))
        .bearer_auth(&access)
        .json(&assign)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let role = RoleStore::find_by_name(srv.store.as_ref(), "read:budget")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(role.permissions.len(), 1);

    // Remove, then remove again (no-op success); the set ends empty.
    for _ in 0..2 {
        let res = client
            .post(format!("{}/roles/remove-permission", srv.base_url))
            .bearer_auth(&access)
            .json(&assign)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Permission removed from role");
    }

    let role = RoleStore::find_by_name(srv.store.as_ref(), "read:budget")
        .await
        .unwrap()
        .unwrap();
    assert!(role.permissions.is_empty());
}

#[tokio::test]
async fn assign_permission_with_distinct_role_field() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    srv.seed_permission("read:budget").await;
    register(&client, &srv.base_url, "bob", "bob@x.com").await;
    let (access, _) = login(&client, &srv.base_url, "bob@x.com").await;

    let res = client
        .post(format!("{}/roles/add", srv.base_url))
        .json(&json!({ "role": "editors" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/roles/assign-permission", srv.base_url))
        .bearer_auth(&access)
        .json(&json!({ "username": "bob", "permission": "read:budget", "role": "editors" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let role = RoleStore::find_by_name(srv.store.as_ref(), "editors")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(role.permissions.len(), 1);
}

#[tokio::test]
async fn assign_permission_reports_first_missing_entity() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv.base_url, "bob", "bob@x.com").await;
    let (access, _) = login(&client, &srv.base_url, "bob@x.com").await;

    // Unknown acting user is reported first.
    let res = client
        .post(format!("{}/roles/assign-permission", srv.base_url))
        .bearer_auth(&access)
        .json(&json!({ "username": "ghost", "permission": "read:budget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User not found");

    // Known user, unknown role.
    let res = client
        .post(format!("{}/roles/assign-permission", srv.base_url))
        .bearer_auth(&access)
        .json(&json!({ "username": "bob", "permission": "read:budget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Role not found");

    // Role exists, permission row does not.
    let res = client
        .post(format!("{}/roles/add", srv.base_url))
        .json(&json!({ "role": "read:budget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/roles/assign-permission", srv.base_url))
        .bearer_auth(&access)
        .json(&json!({ "username": "bob", "permission": "read:budget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Permission not found");
}

#[tokio::test]
async fn closed_role_create_requires_token() {
    let config = ApiConfig {
        open_role_create: false,
        ..ApiConfig::default()
    };
    let srv = TestServer::spawn_with(config).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/roles/add", srv.base_url))
        .json(&json!({ "role": "editor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    register(&client, &srv.base_url, "alice", "alice@x.com").await;
    let (access, _) = login(&client, &srv.base_url, "alice@x.com").await;

    let res = client
        .post(format!("{}/roles/add", srv.base_url))
        .bearer_auth(&access)
        .json(&json!({ "role": "editor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_is_open() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
