use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use uuid::Uuid;

use castellan_auth::{Permission, PermissionName, Role, RoleName, User};
use castellan_core::{PermissionId, RoleId, UserId};

use super::r#trait::{PermissionStore, RoleStore, StoreError, UserStore};

/// Bootstrap DDL, applied idempotently at connect time.
///
/// Uniqueness lives in the schema; `role_permissions` is the association
/// table, keyed so a (role, permission) pair can exist at most once and
/// removed together with its role.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id UUID PRIMARY KEY,
    username TEXT NOT NULL,
    email TEXT NOT NULL,
    password_digest TEXT NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL,
    last_login TIMESTAMPTZ,
    CONSTRAINT users_username_key UNIQUE (username),
    CONSTRAINT users_email_key UNIQUE (email)
);

CREATE TABLE IF NOT EXISTS roles (
    role_id UUID PRIMARY KEY,
    role_name TEXT NOT NULL,
    CONSTRAINT roles_role_name_key UNIQUE (role_name)
);

CREATE TABLE IF NOT EXISTS permissions (
    permission_id UUID PRIMARY KEY,
    permission_name TEXT NOT NULL,
    CONSTRAINT permissions_permission_name_key UNIQUE (permission_name)
);

CREATE TABLE IF NOT EXISTS role_permissions (
    role_id UUID NOT NULL REFERENCES roles (role_id) ON DELETE CASCADE,
    permission_id UUID NOT NULL REFERENCES permissions (permission_id),
    PRIMARY KEY (role_id, permission_id)
);
"#;

/// Postgres-backed store.
///
/// Queries are bound at runtime; grant/revoke run inside one transaction per
/// call so the association mutation is atomic per role.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and make sure the schema exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(db_err)?;

        let store = Self { pool };
        store.ensure_schema().await?;
        tracing::info!("postgres store ready");
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn load_role_permissions(
        &self,
        role_id: Uuid,
    ) -> Result<BTreeSet<PermissionName>, StoreError> {
        let rows = sqlx::query(
            "SELECT p.permission_name
             FROM permissions p
             JOIN role_permissions rp ON rp.permission_id = p.permission_id
             WHERE rp.role_id = $1",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut permissions = BTreeSet::new();
        for row in rows {
            let name: String = row.try_get("permission_name").map_err(db_err)?;
            permissions.insert(PermissionName::new(name));
        }
        Ok(permissions)
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::backend(e.to_string())
}

/// Map unique-index violations onto `Duplicate`; everything else is a
/// backend failure.
fn constraint_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        match db.constraint() {
            Some("users_username_key") => return StoreError::Duplicate("username"),
            Some("users_email_key") => return StoreError::Duplicate("email"),
            Some("roles_role_name_key") => return StoreError::Duplicate("role name"),
            Some("permissions_permission_name_key") => {
                return StoreError::Duplicate("permission name");
            }
            _ => {}
        }
    }
    db_err(e)
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId::from_uuid(row.try_get("user_id").map_err(db_err)?),
        username: row.try_get("username").map_err(db_err)?,
        email: row.try_get("email").map_err(db_err)?,
        password_digest: row.try_get("password_digest").map_err(db_err)?,
        active: row.try_get("active").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        last_login: row.try_get("last_login").map_err(db_err)?,
    })
}

const SELECT_USER: &str =
    "SELECT user_id, username, email, password_digest, active, created_at, last_login FROM users";

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE user_id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn upsert(&self, user: User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (user_id, username, email, password_digest, active, created_at, last_login)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (user_id) DO UPDATE SET
                 username = EXCLUDED.username,
                 email = EXCLUDED.email,
                 password_digest = EXCLUDED.password_digest,
                 active = EXCLUDED.active,
                 last_login = EXCLUDED.last_login",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_digest)
        .bind(user.active)
        .bind(user.created_at)
        .bind(user.last_login)
        .execute(&self.pool)
        .await
        .map_err(constraint_err)?;
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RoleStore for PostgresStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query("SELECT role_id, role_name FROM roles WHERE role_name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role_id: Uuid = row.try_get("role_id").map_err(db_err)?;
        let role_name: String = row.try_get("role_name").map_err(db_err)?;

        Ok(Some(Role {
            id: RoleId::from_uuid(role_id),
            name: RoleName::new(role_name),
            permissions: self.load_role_permissions(role_id).await?,
        }))
    }

    async fn insert(&self, role: Role) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("INSERT INTO roles (role_id, role_name) VALUES ($1, $2)")
            .bind(*role.id.as_uuid())
            .bind(role.name.as_str())
            .execute(&mut *tx)
            .await
            .map_err(constraint_err)?;

        for permission in &role.permissions {
            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission_id)
                 SELECT $1, permission_id FROM permissions WHERE permission_name = $2",
            )
            .bind(*role.id.as_uuid())
            .bind(permission.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        // Association rows go with the role via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM roles WHERE role_name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn grant_permission(
        &self,
        role_name: &str,
        permission: &PermissionName,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let role_id: Option<Uuid> =
            sqlx::query_scalar("SELECT role_id FROM roles WHERE role_name = $1")
                .bind(role_name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        let Some(role_id) = role_id else {
            return Err(StoreError::NotFound);
        };

        let permission_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT permission_id FROM permissions WHERE permission_name = $1",
        )
        .bind(permission.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        let Some(permission_id) = permission_id else {
            return Err(StoreError::NotFound);
        };

        let result = sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_permission(
        &self,
        role_name: &str,
        permission: &PermissionName,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let role_id: Option<Uuid> =
            sqlx::query_scalar("SELECT role_id FROM roles WHERE role_name = $1")
                .bind(role_name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        let Some(role_id) = role_id else {
            return Err(StoreError::NotFound);
        };

        let result = sqlx::query(
            "DELETE FROM role_permissions rp
             USING permissions p
             WHERE rp.role_id = $1
               AND rp.permission_id = p.permission_id
               AND p.permission_name = $2",
        )
        .bind(role_id)
        .bind(permission.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PermissionStore for PostgresStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, StoreError> {
        let row = sqlx::query(
            "SELECT permission_id, permission_name FROM permissions WHERE permission_name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Permission {
            id: PermissionId::from_uuid(row.try_get("permission_id").map_err(db_err)?),
            name: PermissionName::new(row.try_get::<String, _>("permission_name").map_err(db_err)?),
        }))
    }

    async fn insert(&self, permission: Permission) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO permissions (permission_id, permission_name) VALUES ($1, $2)")
            .bind(*permission.id.as_uuid())
            .bind(permission.name.as_str())
            .execute(&self.pool)
            .await
            .map_err(constraint_err)?;
        Ok(())
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM permissions WHERE permission_name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
