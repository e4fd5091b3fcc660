//! Process configuration, read from the environment once at startup.

use std::env;

use castellan_auth::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,

    /// Signing secret for the token engine. Established once at startup and
    /// injected into the engine at construction.
    pub jwt_secret: String,

    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,

    /// When `true` (the inherited default), `POST /roles/add` is reachable
    /// without a bearer token. `CASTELLAN_OPEN_ROLE_CREATE=false` moves it
    /// behind authentication.
    pub open_role_create: bool,

    /// When set, the Postgres store is used; otherwise state is in-memory.
    pub database_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            jwt_secret: "dev-secret".to_string(),
            access_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_TTL_SECS,
            open_role_create: true,
            database_url: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            defaults.jwt_secret.clone()
        });

        Self {
            bind_addr: env::var("CASTELLAN_BIND").unwrap_or(defaults.bind_addr),
            jwt_secret,
            access_ttl_secs: parse_i64(
                "CASTELLAN_ACCESS_TTL_SECS",
                env::var("CASTELLAN_ACCESS_TTL_SECS").ok(),
                defaults.access_ttl_secs,
            ),
            refresh_ttl_secs: parse_i64(
                "CASTELLAN_REFRESH_TTL_SECS",
                env::var("CASTELLAN_REFRESH_TTL_SECS").ok(),
                defaults.refresh_ttl_secs,
            ),
            open_role_create: parse_bool(
                "CASTELLAN_OPEN_ROLE_CREATE",
                env::var("CASTELLAN_OPEN_ROLE_CREATE").ok(),
                defaults.open_role_create,
            ),
            database_url: env::var("DATABASE_URL").ok(),
        }
    }
}

fn parse_i64(key: &str, value: Option<String>, default: i64) -> i64 {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable integer");
            default
        }),
        None => default,
    }
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> bool {
    match value.as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        Some(raw) => {
            tracing::warn!(key, value = raw, "ignoring unparsable boolean");
            default
        }
        None => default,
    }
}
