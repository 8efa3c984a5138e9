//! Scope summarization
//!
//! A summary is an ordinary memory entry (`kind = summary`) derived from the
//! most recent non-summary entries of a scope and linked `derived_from` to
//! each source. Link creation is best-effort: a summary without full link
//! coverage is legal, and re-running summarization cannot duplicate links
//! (unique constraint).

use tracing::warn;

use mnemo_core::error::{MemoryError, Result};
use mnemo_core::identity::{content_hash, normalize_content};
use mnemo_core::types::{LinkRelation, MemoryKind, MemoryRecord, ScopeKey, SummaryMode};
use mnemo_storage::NewMemory;

use crate::state::AppState;

/// Entries shown by a brief summary
const BRIEF_ENTRY_LIMIT: usize = 20;

/// Per-entry content preview length in brief mode, in characters
const BRIEF_PREVIEW_CHARS: usize = 200;

/// A freshly written scope summary
#[derive(Debug)]
pub struct ScopeSummary {
    pub record: MemoryRecord,
    /// Entries the summary was built from
    pub source_count: usize,
    /// `derived_from` links that were actually created
    pub linked: usize,
}

/// Summarize a scope on demand (tool-endpoint semantics)
///
/// The summary entry carries title `scope_summary` and tags
/// `[auto_summary, <mode>]`.
///
/// # Errors
///
/// Returns `NotFound` when the scope holds no summarizable entries
pub async fn summarize_scope(
    state: &AppState,
    tenant_id: &str,
    scope: &ScopeKey,
    mode: SummaryMode,
    max_entries: i64,
) -> Result<ScopeSummary> {
    state.pg.ensure_tenant(tenant_id).await?;
    let scope_id = state.pg.get_or_create_scope(tenant_id, scope).await?;

    let entries = state
        .pg
        .scope_entries(tenant_id, &scope_id, max_entries, &[MemoryKind::Summary])
        .await?;
    if entries.is_empty() {
        return Err(MemoryError::NotFound("no entries to summarize".to_string()));
    }

    let content = render_scope_summary(&entries, mode);
    let record = write_summary_entry(
        state,
        tenant_id,
        &scope_id,
        "scope_summary",
        &content,
        &["auto_summary".to_string(), mode.as_str().to_string()],
    )
    .await?;

    let linked = link_sources(state, tenant_id, &record.id, &entries).await;

    if let Err(e) = state.cache.invalidate_scope_cache(tenant_id, &scope_id).await {
        warn!(error = %e, "search-cache invalidation failed after summary");
    }

    Ok(ScopeSummary {
        record,
        source_count: entries.len(),
        linked,
    })
}

/// Persist a summary entry (embedding included, source `system`)
///
/// # Errors
///
/// Returns `Embedding` or `Storage` when the respective step fails
pub(crate) async fn write_summary_entry(
    state: &AppState,
    tenant_id: &str,
    scope_id: &str,
    title: &str,
    content: &str,
    tags: &[String],
) -> Result<MemoryRecord> {
    let hash = content_hash(MemoryKind::Summary, Some(title), content);
    let embedding = state.embedder.embed(content).await?;
    let normalized = normalize_content(content);

    state
        .pg
        .write_memory(&NewMemory {
            tenant_id,
            scope_id,
            kind: MemoryKind::Summary,
            title: Some(title),
            content: &normalized,
            tags,
            source: Some("system"),
            author_agent_id: None,
            tool_name: None,
            content_hash: &hash,
            embedding: &embedding,
        })
        .await
}

/// Link a summary `derived_from` each source entry, tolerating failures
///
/// Returns the number of links created.
pub(crate) async fn link_sources(
    state: &AppState,
    tenant_id: &str,
    summary_id: &str,
    sources: &[MemoryRecord],
) -> usize {
    let mut linked = 0;
    for entry in sources {
        match state
            .pg
            .create_link(tenant_id, summary_id, &entry.id, LinkRelation::DerivedFrom)
            .await
        {
            Ok(_) => linked += 1,
            Err(e) => warn!(
                summary = %summary_id,
                source = %entry.id,
                error = %e,
                "failed to link summary to source"
            ),
        }
    }
    linked
}

/// Render the on-demand summary body
#[must_use]
pub fn render_scope_summary(entries: &[MemoryRecord], mode: SummaryMode) -> String {
    match mode {
        SummaryMode::Brief => {
            let shown = entries.len().min(BRIEF_ENTRY_LIMIT);
            let lines: Vec<String> = entries
                .iter()
                .take(BRIEF_ENTRY_LIMIT)
                .map(|e| summary_line(e, Some(BRIEF_PREVIEW_CHARS)))
                .collect();
            format!(
                "Scope summary ({} entries, showing top {shown}):\n{}",
                entries.len(),
                lines.join("\n")
            )
        }
        SummaryMode::Full => {
            let lines: Vec<String> = entries.iter().map(|e| summary_line(e, None)).collect();
            format!(
                "Full scope summary ({} entries):\n{}",
                entries.len(),
                lines.join("\n---\n")
            )
        }
    }
}

/// Render the scheduled-job summary body
#[must_use]
pub fn render_weekly_summary(entries: &[MemoryRecord], mode: SummaryMode) -> String {
    match mode {
        SummaryMode::Brief => {
            let lines: Vec<String> = entries
                .iter()
                .take(BRIEF_ENTRY_LIMIT)
                .map(|e| summary_line(e, Some(BRIEF_PREVIEW_CHARS)))
                .collect();
            format!(
                "Weekly summary ({} entries):\n{}",
                entries.len(),
                lines.join("\n")
            )
        }
        SummaryMode::Full => {
            let lines: Vec<String> = entries.iter().map(|e| summary_line(e, None)).collect();
            format!(
                "Full summary ({} entries):\n{}",
                entries.len(),
                lines.join("\n---\n")
            )
        }
    }
}

fn summary_line(entry: &MemoryRecord, truncate_chars: Option<usize>) -> String {
    let title_part = entry
        .title
        .as_ref()
        .map(|t| format!(" {t}"))
        .unwrap_or_default();
    let content: String = match truncate_chars {
        Some(n) => entry.content.chars().take(n).collect(),
        None => entry.content.clone(),
    };
    format!("[{}]{title_part}: {content}", entry.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(kind: MemoryKind, title: Option<&str>, content: &str) -> MemoryRecord {
        MemoryRecord {
            id: format!("mem_{}", content.len()),
            kind,
            title: title.map(ToString::to_string),
            content: content.to_string(),
            tags: vec![],
            source: None,
            author_agent_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn brief_summary_truncates_and_counts() {
        let long_content = "x".repeat(500);
        let entries = vec![
            entry(MemoryKind::TaskOutcome, Some("t1"), &long_content),
            entry(MemoryKind::Decision, None, "short decision"),
        ];
        let rendered = render_scope_summary(&entries, SummaryMode::Brief);

        assert!(rendered.starts_with("Scope summary (2 entries, showing top 2):\n"));
        assert!(rendered.contains("[task_outcome] t1: "));
        assert!(rendered.contains("[decision]: short decision"));
        // 200-char preview, not the full 500
        assert!(!rendered.contains(&"x".repeat(201)));
        assert!(rendered.contains(&"x".repeat(200)));
    }

    #[test]
    fn brief_summary_caps_at_twenty_entries() {
        let entries: Vec<MemoryRecord> = (0..30)
            .map(|i| entry(MemoryKind::ChatTurn, None, &format!("turn number {i}")))
            .collect();
        let rendered = render_scope_summary(&entries, SummaryMode::Brief);
        assert!(rendered.starts_with("Scope summary (30 entries, showing top 20):\n"));
        assert!(rendered.contains("turn number 19"));
        assert!(!rendered.contains("turn number 20"));
    }

    #[test]
    fn full_summary_keeps_content_and_separators() {
        let entries = vec![
            entry(MemoryKind::TaskOutcome, Some("a"), &"y".repeat(300)),
            entry(MemoryKind::Runbook, Some("b"), "runbook body"),
        ];
        let rendered = render_scope_summary(&entries, SummaryMode::Full);
        assert!(rendered.starts_with("Full scope summary (2 entries):\n"));
        assert!(rendered.contains(&"y".repeat(300)));
        assert!(rendered.contains("\n---\n"));
    }

    #[test]
    fn weekly_header_differs_from_on_demand_header() {
        let entries = vec![entry(MemoryKind::TaskOutcome, Some("t"), "body")];
        assert!(render_weekly_summary(&entries, SummaryMode::Brief)
            .starts_with("Weekly summary (1 entries):\n"));
        assert!(render_weekly_summary(&entries, SummaryMode::Full)
            .starts_with("Full summary (1 entries):\n"));
    }
}
