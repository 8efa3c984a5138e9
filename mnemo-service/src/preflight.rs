//! Preflight context assembly
//!
//! Before a node executes a task, it asks for prior context: a kind-filtered
//! hybrid search over the scope, the working-set ids, and a formatted
//! "Known Context" block ready for prompt injection.

use tracing::{info, warn};

use mnemo_core::error::Result;
use mnemo_core::types::{ScopeKey, ScoredMemory};
use mnemo_storage::SearchFilters;

use crate::state::AppState;

/// Content preview length inside the context block, in characters
const CONTEXT_PREVIEW_CHARS: usize = 500;

/// Kinds worth surfacing before a task runs
const PREFLIGHT_KINDS: [&str; 4] = ["task_outcome", "decision", "runbook", "summary"];

/// Prior context assembled for a task
#[derive(Debug)]
pub struct PreflightReport {
    /// Relevant prior entries, ranked
    pub memories: Vec<ScoredMemory>,
    /// Recent memory ids from the working set (may be empty)
    pub working_set_ids: Vec<String>,
    /// Formatted block for agent prompt injection (empty when nothing found)
    pub known_context: String,
    pub scope_id: String,
}

/// Assembles prior context for a node before task execution
#[derive(Clone)]
pub struct PreflightContext {
    state: AppState,
}

impl PreflightContext {
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Retrieve relevant prior context for a task
    ///
    /// Bypasses the search cache: preflight queries are one-off per task and
    /// would only churn it.
    ///
    /// # Errors
    ///
    /// Returns `Embedding` or `Storage` when retrieval fails; working-set and
    /// counter failures are swallowed.
    pub async fn get_context(
        &self,
        tenant_id: &str,
        scope: &ScopeKey,
        task_title: &str,
        task_description: Option<&str>,
        top_k: i64,
        include_working_set: bool,
    ) -> Result<PreflightReport> {
        self.state.pg.ensure_tenant(tenant_id).await?;
        let scope_id = self.state.pg.get_or_create_scope(tenant_id, scope).await?;

        let query = task_description.map_or_else(
            || task_title.to_string(),
            |description| format!("{task_title} {description}"),
        );
        let query_embedding = self.state.embedder.embed(&query).await?;

        let filters = SearchFilters {
            kinds: Some(PREFLIGHT_KINDS.iter().map(ToString::to_string).collect()),
            ..SearchFilters::default()
        };
        let memories = self
            .state
            .pg
            .search_memory(tenant_id, &scope_id, &query_embedding, &query, top_k, &filters)
            .await?;

        let working_set_ids = if include_working_set {
            match self.state.cache.get_working_set(tenant_id, &scope_id).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(error = %e, "working-set read failed during preflight");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let known_context = format_known_context(&memories);

        if let Err(e) = self.state.cache.record_search(tenant_id).await {
            warn!(error = %e, "search counter failed during preflight");
        }

        info!(
            tenant = tenant_id,
            scope = %scope_id,
            task = task_title,
            found = memories.len(),
            working_set = working_set_ids.len(),
            "preflight context assembled"
        );

        Ok(PreflightReport {
            memories,
            working_set_ids,
            known_context,
            scope_id,
        })
    }
}

/// Format retrieved memories as a context block for agent prompts
#[must_use]
pub fn format_known_context(memories: &[ScoredMemory]) -> String {
    if memories.is_empty() {
        return String::new();
    }

    let mut lines = vec!["## Known Context (from prior tasks)\n".to_string()];
    for (i, memory) in memories.iter().enumerate() {
        let entry = &memory.entry;
        let title = entry.title.as_deref().unwrap_or("untitled");

        let mut content = entry.content.clone();
        if content.chars().count() > CONTEXT_PREVIEW_CHARS {
            content = content.chars().take(CONTEXT_PREVIEW_CHARS).collect();
            content.push_str("...");
        }

        let score_part = if memory.score == 0.0 {
            String::new()
        } else {
            format!(" (relevance: {:.2})", memory.score)
        };
        let tag_part = if entry.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", entry.tags.join(", "))
        };

        lines.push(format!(
            "### {}. [{}] {title}{score_part}{tag_part}\n{content}\n",
            i + 1,
            entry.kind
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mnemo_core::types::{MemoryKind, MemoryRecord};

    fn scored(title: Option<&str>, content: &str, tags: &[&str], score: f64) -> ScoredMemory {
        ScoredMemory {
            entry: MemoryRecord {
                id: "mem_test".to_string(),
                kind: MemoryKind::TaskOutcome,
                title: title.map(ToString::to_string),
                content: content.to_string(),
                tags: tags.iter().map(ToString::to_string).collect(),
                source: None,
                author_agent_id: None,
                created_at: Utc::now(),
                updated_at: None,
            },
            score,
        }
    }

    #[test]
    fn empty_results_render_empty_block() {
        assert_eq!(format_known_context(&[]), "");
    }

    #[test]
    fn block_numbers_entries_and_shows_metadata() {
        let memories = vec![
            scored(Some("docker push fix"), "Increased timeout.", &["docker"], 0.91),
            scored(None, "untitled body", &[], 0.0),
        ];
        let block = format_known_context(&memories);

        assert!(block.starts_with("## Known Context (from prior tasks)\n"));
        assert!(block.contains("### 1. [task_outcome] docker push fix (relevance: 0.91) [docker]"));
        assert!(block.contains("### 2. [task_outcome] untitled\n"));
        assert!(!block.contains("relevance: 0.00"));
    }

    #[test]
    fn long_content_is_truncated_with_ellipsis() {
        let long = "z".repeat(600);
        let block = format_known_context(&[scored(Some("big"), &long, &[], 0.5)]);
        assert!(block.contains(&format!("{}...", "z".repeat(500))));
        assert!(!block.contains(&"z".repeat(501)));
    }
}
