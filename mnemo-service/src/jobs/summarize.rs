//! Scheduled job: scope summarization
//!
//! Creates durable summary entries for scopes with recent activity, linking
//! each summary to its source entries. Run daily or weekly depending on
//! traffic.

use tracing::{error, info, warn};

use mnemo_core::error::Result;
use mnemo_core::types::{MemoryKind, SummaryMode};

use crate::state::AppState;
use crate::summarize::{link_sources, render_weekly_summary, write_summary_entry};

/// Summarize every active scope of a tenant
///
/// A scope is active when any non-summary entry landed in the last 7 days.
/// Returns the ids of the created summary entries.
///
/// # Errors
///
/// Returns `Storage` only if the scope enumeration itself fails; per-scope
/// failures are logged and skipped.
pub async fn summarize_active_scopes(
    state: &AppState,
    tenant_id: &str,
    max_entries_per_scope: i64,
    mode: SummaryMode,
) -> Result<Vec<String>> {
    let scopes = state.pg.scopes_with_recent_activity(tenant_id).await?;

    let mut created = Vec::new();
    for scope_id in &scopes {
        match summarize_one(state, tenant_id, scope_id, max_entries_per_scope, mode).await {
            Ok(Some(summary_id)) => created.push(summary_id),
            Ok(None) => {}
            Err(e) => error!(
                tenant = tenant_id,
                scope = %scope_id,
                error = %e,
                "failed to summarize scope"
            ),
        }
    }

    info!(
        tenant = tenant_id,
        scopes = scopes.len(),
        summaries = created.len(),
        "summarization job complete"
    );
    Ok(created)
}

async fn summarize_one(
    state: &AppState,
    tenant_id: &str,
    scope_id: &str,
    max_entries: i64,
    mode: SummaryMode,
) -> Result<Option<String>> {
    let entries = state
        .pg
        .scope_entries(tenant_id, scope_id, max_entries, &[MemoryKind::Summary])
        .await?;
    if entries.is_empty() {
        return Ok(None);
    }

    let content = render_weekly_summary(&entries, mode);
    let record = write_summary_entry(
        state,
        tenant_id,
        scope_id,
        "weekly_summary",
        &content,
        &[
            "auto_summary".to_string(),
            "scheduled".to_string(),
            mode.as_str().to_string(),
        ],
    )
    .await?;

    link_sources(state, tenant_id, &record.id, &entries).await;

    if let Err(e) = state.cache.invalidate_scope_cache(tenant_id, scope_id).await {
        warn!(error = %e, "search-cache invalidation failed after summary");
    }

    info!(summary = %record.id, scope = %scope_id, "created summary");
    Ok(Some(record.id))
}
