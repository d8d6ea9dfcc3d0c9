use std::sync::Arc;

use crate::clients::{
    DevIdentityProvider, IdentityProvider, PostgrestStore, SupabaseIdentityProvider,
};
use crate::config::{AppConfig, IdentityBackend, StoreBackend};
use crate::database::{MemoryStore, PgStore, RowStore, StoreError};
use crate::repository::{BusinessRepository, UserRepository};

/// Shared per-process services, built once at startup and handed to every worker
#[derive(Clone)]
pub struct AppState {
    pub businesses: BusinessRepository,
    pub users: UserRepository,
    pub identity: Arc<dyn IdentityProvider>,
    pub backend: &'static str,
}

impl AppState {
    pub fn new(store: Arc<dyn RowStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            backend: store.backend(),
            businesses: BusinessRepository::new(store.clone()),
            users: UserRepository::new(store),
            identity,
        }
    }

    /// Seeded in-memory store with the development identity provider
    pub fn in_memory(store: MemoryStore) -> Self {
        Self::new(Arc::new(store), Arc::new(DevIdentityProvider))
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn RowStore> = match config.store_backend {
            StoreBackend::Memory => {
                log::info!(
                    "Using in-memory store with {}ms simulated latency",
                    config.mock_latency.as_millis()
                );
                Arc::new(MemoryStore::seeded(config.mock_latency))
            }
            StoreBackend::Postgres => {
                let url = config.database_url.as_deref().unwrap_or_default();
                Arc::new(PgStore::connect(url, config.db_max_connections).await?)
            }
            StoreBackend::Rest => {
                log::info!("Using hosted table API");
                Arc::new(PostgrestStore::new(
                    config.supabase_url.as_deref().unwrap_or_default(),
                    config.supabase_anon_key.as_deref().unwrap_or_default(),
                    config.http_timeout,
                )?)
            }
        };

        let identity: Arc<dyn IdentityProvider> = match config.identity_backend {
            IdentityBackend::Dev => {
                log::warn!("Development identity provider enabled: bearer tokens are profile ids");
                Arc::new(DevIdentityProvider)
            }
            IdentityBackend::Supabase => Arc::new(SupabaseIdentityProvider::new(
                config.supabase_url.as_deref().unwrap_or_default(),
                config.supabase_anon_key.as_deref().unwrap_or_default(),
                config.http_timeout,
            )?),
        };

        Ok(Self::new(store, identity))
    }
}
