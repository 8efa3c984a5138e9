//! Write path: normalize -> hash -> embed -> store -> cache update
//!
//! The transactional store write is the only fatal step. Working-set pushes,
//! cache invalidation, and counters are best-effort: a cache outage degrades
//! freshness, never durability.

use tracing::{debug, warn};

use mnemo_core::error::Result;
use mnemo_core::identity::{content_hash, normalize_content};
use mnemo_core::types::{MemoryKind, MemoryRecord, ScopeKey};
use mnemo_storage::NewMemory;

use crate::state::AppState;

/// A request to persist one memory entry
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub tenant_id: String,
    pub scope: ScopeKey,
    pub kind: MemoryKind,
    pub title: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub author_agent_id: Option<String>,
    pub tool_name: Option<String>,
}

/// Outcome of a write: the canonical row plus dedupe information
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub record: MemoryRecord,
    pub scope_id: String,
    /// True when the write matched an existing entry (only `updated_at`
    /// moved)
    pub deduped: bool,
}

/// Persist a memory entry with its embedding
///
/// Identity is content-addressed: re-issuing the same write converges on the
/// same row and id.
///
/// # Errors
///
/// Returns `Storage` if the transactional write fails and `Embedding` if the
/// provider does; both abort the write. Cache failures do not.
pub async fn write_memory(state: &AppState, request: &WriteRequest) -> Result<WriteOutcome> {
    state.pg.ensure_tenant(&request.tenant_id).await?;
    let scope_id = state
        .pg
        .get_or_create_scope(&request.tenant_id, &request.scope)
        .await?;

    // Hash input and stored content share one normalization pass; diverging
    // here would break dedup.
    let normalized = normalize_content(&request.content);
    let hash = content_hash(request.kind, request.title.as_deref(), &request.content);

    let embed_input = format!(
        "{} {}",
        request.title.as_deref().unwrap_or(""),
        request.content
    );
    let embedding = state.embedder.embed(&embed_input).await?;

    let tags = dedup_tags(&request.tags);
    let record = state
        .pg
        .write_memory(&NewMemory {
            tenant_id: &request.tenant_id,
            scope_id: &scope_id,
            kind: request.kind,
            title: request.title.as_deref(),
            content: &normalized,
            tags: &tags,
            source: request.source.as_deref(),
            author_agent_id: request.author_agent_id.as_deref(),
            tool_name: request.tool_name.as_deref(),
            content_hash: &hash,
            embedding: &embedding,
        })
        .await?;

    let deduped = record.was_rewritten();
    debug!(
        memory_id = %record.id,
        tenant = %request.tenant_id,
        scope = %scope_id,
        deduped,
        "memory write committed"
    );

    if let Err(e) = state
        .cache
        .push_to_working_set(&request.tenant_id, &scope_id, &record.id)
        .await
    {
        warn!(error = %e, "working-set push failed after write");
    }
    if let Err(e) = state
        .cache
        .invalidate_scope_cache(&request.tenant_id, &scope_id)
        .await
    {
        warn!(error = %e, "search-cache invalidation failed after write");
    }
    if let Err(e) = state.cache.record_write(&request.tenant_id).await {
        warn!(error = %e, "write counter failed");
    }
    if deduped {
        if let Err(e) = state.cache.record_dedupe_hit(&request.tenant_id).await {
            warn!(error = %e, "dedupe counter failed");
        }
    }

    Ok(WriteOutcome {
        record,
        scope_id,
        deduped,
    })
}

/// Drop duplicate tags, preserving first-seen order
fn dedup_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}
