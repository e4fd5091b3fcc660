//! Infrastructure layer: account/role/permission persistence.

pub mod store;

pub use store::{InMemoryStore, PermissionStore, PostgresStore, RoleStore, StoreError, UserStore};
