//! Search path: cache probe -> embed -> hybrid query -> cache fill
//!
//! A warm cache answers without touching the embedding provider or the
//! database; entries written after the cache filled stay invisible for up to
//! one `SEARCH_CACHE_TTL` window. Cache failures degrade to a plain database
//! query.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use mnemo_core::error::Result;
use mnemo_core::types::{MemoryKind, ScopeKey, ScoredMemory};
use mnemo_storage::SearchFilters;

use crate::state::AppState;

/// A hybrid retrieval request
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub tenant_id: String,
    pub scope: ScopeKey,
    pub query: String,
    pub top_k: i64,
    pub tags: Vec<String>,
    pub kinds: Vec<MemoryKind>,
    pub time_range_start: Option<DateTime<Utc>>,
    pub time_range_end: Option<DateTime<Utc>>,
}

/// Run a hybrid search, memoizing the result set
///
/// # Errors
///
/// Returns `Embedding` if the query cannot be embedded and `Storage` if the
/// hybrid query fails.
pub async fn search_memory(state: &AppState, request: &SearchRequest) -> Result<Vec<ScoredMemory>> {
    state.pg.ensure_tenant(&request.tenant_id).await?;
    let scope_id = state
        .pg
        .get_or_create_scope(&request.tenant_id, &request.scope)
        .await?;

    let kind_strs: Vec<String> = request
        .kinds
        .iter()
        .map(|k| k.as_str().to_string())
        .collect();

    match state
        .cache
        .get_cached_search(
            &request.tenant_id,
            &scope_id,
            &request.query,
            &request.tags,
            &kind_strs,
            request.top_k,
        )
        .await
    {
        Ok(Some(rows)) => {
            debug!(tenant = %request.tenant_id, scope = %scope_id, "serving search from cache");
            return Ok(rows);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "search-cache probe failed, querying store"),
    }

    let query_embedding = state.embedder.embed(&request.query).await?;

    let filters = SearchFilters {
        kinds: (!kind_strs.is_empty()).then(|| kind_strs.clone()),
        tags: (!request.tags.is_empty()).then(|| request.tags.clone()),
        time_range_start: request.time_range_start,
        time_range_end: request.time_range_end,
    };
    let rows = state
        .pg
        .search_memory(
            &request.tenant_id,
            &scope_id,
            &query_embedding,
            &request.query,
            request.top_k,
            &filters,
        )
        .await?;

    if let Err(e) = state
        .cache
        .set_cached_search(
            &request.tenant_id,
            &scope_id,
            &request.query,
            &request.tags,
            &kind_strs,
            request.top_k,
            &rows,
        )
        .await
    {
        warn!(error = %e, "search-cache fill failed");
    }
    if let Err(e) = state.cache.record_search(&request.tenant_id).await {
        warn!(error = %e, "search counter failed");
    }

    Ok(rows)
}
