//! Store traits plus the in-memory (tests/dev) and Postgres backends.

mod in_memory;
mod postgres;
mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{PermissionStore, RoleStore, StoreError, UserStore};
