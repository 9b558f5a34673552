//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{InstanceCatalog, SaveTokenSigner};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    instances: InstanceCatalog,
    save_tokens: SaveTokenSigner,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration (save token key and cache TTL)
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: &ServerConfig, pool: PgPool) -> Self {
        let instances = InstanceCatalog::new(pool.clone(), config.instance_cache_ttl);
        let save_tokens =
            SaveTokenSigner::new(config.save_token_secret.clone(), config.save_token_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                pool,
                instances,
                save_tokens,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the cached shipping method instance catalog.
    #[must_use]
    pub fn instances(&self) -> &InstanceCatalog {
        &self.inner.instances
    }

    /// Get the save token signer.
    #[must_use]
    pub fn save_tokens(&self) -> &SaveTokenSigner {
        &self.inner.save_tokens
    }
}
