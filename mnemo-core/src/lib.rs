//! # Core domain model for the mnemo memory service
//!
//! This crate holds everything the storage and service layers share:
//! - **Types**: memory entries, scopes, links, attachments (`types`)
//! - **Identity**: deterministic id derivation and content hashing (`identity`)
//! - **Embeddings**: pluggable `text -> unit-norm vector` providers (`embedding`)
//! - **Errors**: the service-wide error taxonomy (`error`)
//! - **Settings**: the frozen process configuration (`config`)
//!
//! Identity is content-addressed: an entry's id is derived from the hash of
//! its normalized content, so writing the same knowledge twice converges on
//! the same row. See [`identity`] for the exact derivations.

pub mod config;
pub mod embedding;
pub mod error;
pub mod identity;
pub mod types;

// Re-exports for convenience
pub use config::Settings;
pub use embedding::{provider_from_settings, EmbeddingProvider, OpenAiEmbedding, StubEmbedding};
pub use error::{MemoryError, Result};
pub use types::{
    AttachmentRecord, LinkRecord, LinkRelation, MemoryKind, MemoryRecord, PromotionCandidate,
    ScopeKey, ScoredMemory, SummaryMode,
};
