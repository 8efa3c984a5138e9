//! Shared service state
//!
//! One `AppState` is built at startup and cloned into every handler; all
//! members are cheap handles (pools, connection managers, `Arc`s).

use std::sync::Arc;

use tracing::info;

use mnemo_core::config::Settings;
use mnemo_core::embedding::{provider_from_settings, EmbeddingProvider};
use mnemo_core::error::Result;
use mnemo_storage::{BlobStore, MemoryCache, PostgresStore};

/// Handles shared by every request handler, hook, and job
#[derive(Clone)]
pub struct AppState {
    pub pg: PostgresStore,
    pub cache: MemoryCache,
    pub blob: Arc<BlobStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Connect every backend and apply schema migrations
    ///
    /// # Errors
    ///
    /// Returns the first backend error; the process should not start without
    /// its stores.
    pub async fn initialize(settings: Settings) -> Result<Self> {
        let pg = PostgresStore::connect(&settings).await?;
        pg.run_migrations(&settings.migrations_dir).await?;

        let cache = MemoryCache::connect(&settings).await?;
        let blob = BlobStore::from_settings(&settings).await?;
        let embedder = provider_from_settings(&settings);

        info!("memory service state ready");
        Ok(Self {
            pg,
            cache,
            blob: Arc::new(blob),
            embedder,
            settings: Arc::new(settings),
        })
    }
}
