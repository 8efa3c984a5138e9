//! Embedding providers: `text -> unit-norm vector of fixed dimension`
//!
//! Two implementations ship with the service:
//! - [`StubEmbedding`]: deterministic hash-based vectors for dev/test
//! - [`OpenAiEmbedding`]: remote embeddings with a bounded request timeout
//!
//! The provider is selected once at startup from [`Settings::embed_provider`]
//! and shared as an `Arc<dyn EmbeddingProvider>` across all handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Settings;
use crate::error::Result;

mod openai;
mod stub;

pub use openai::OpenAiEmbedding;
pub use stub::StubEmbedding;

/// Pluggable embedding generation
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Fixed output dimension D
    fn dimensions(&self) -> usize;

    /// Generate a unit-norm embedding for the given text
    ///
    /// # Errors
    ///
    /// Returns `Embedding` if generation fails or the provider is unreachable
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Build the configured provider
///
/// Any value of `EMBED_PROVIDER` other than `openai` selects the stub, so a
/// misconfigured environment degrades to deterministic vectors instead of
/// failing startup.
#[must_use]
pub fn provider_from_settings(settings: &Settings) -> Arc<dyn EmbeddingProvider> {
    let provider: Arc<dyn EmbeddingProvider> = if settings.embed_provider == "openai" {
        Arc::new(OpenAiEmbedding::new(
            settings.openai_api_key.clone(),
            settings.openai_embed_model.clone(),
            settings.embed_dim,
        ))
    } else {
        Arc::new(StubEmbedding::new(settings.embed_dim))
    };

    info!(
        provider = provider.name(),
        dimensions = provider.dimensions(),
        "embedding provider ready"
    );
    provider
}
