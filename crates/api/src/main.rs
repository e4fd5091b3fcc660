use std::sync::Arc;

use castellan_api::app::{self, Stores};
use castellan_api::config::ApiConfig;
use castellan_infra::{InMemoryStore, PostgresStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    castellan_observability::init();

    let config = ApiConfig::from_env();

    let stores = match &config.database_url {
        Some(url) => {
            let store = Arc::new(PostgresStore::connect(url).await?);
            Stores {
                users: store.clone(),
                roles: store.clone(),
                permissions: store,
            }
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (state is lost on restart)");
            let store = Arc::new(InMemoryStore::new());
            Stores {
                users: store.clone(),
                roles: store.clone(),
                permissions: store,
            }
        }
    };

    let app = app::build_app(&config, stores);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
