//! Gateway hooks: fire-and-report memory writes from event sites
//!
//! The gateway's event pipeline calls these at message/task/tool boundaries.
//! They must never block or fail the pipeline: every error (provider,
//! database, cache, cancellation) is caught, logged, and turned into `None`.

use tracing::{error, info, warn};

use mnemo_core::error::Result;
use mnemo_core::types::{LinkRelation, MemoryKind, ScopeKey};

use crate::state::AppState;
use crate::write::{write_memory, WriteRequest};

/// Hooks the gateway calls to automatically persist memory
#[derive(Clone)]
pub struct GatewayHooks {
    state: AppState,
}

impl GatewayHooks {
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Write a `chat_turn` entry for an incoming message
    ///
    /// Returns the memory id if written, `None` when skipped (empty content)
    /// or on any failure.
    pub async fn on_message_received(
        &self,
        tenant_id: &str,
        scope: &ScopeKey,
        content: &str,
        author_agent_id: Option<&str>,
        tags: Option<&[String]>,
    ) -> Option<String> {
        if content.trim().is_empty() {
            return None;
        }

        let request = WriteRequest {
            tenant_id: tenant_id.to_string(),
            scope: scope.clone(),
            kind: MemoryKind::ChatTurn,
            title: None,
            content: content.to_string(),
            tags: tags.map(<[String]>::to_vec).unwrap_or_default(),
            source: Some("gateway".to_string()),
            author_agent_id: author_agent_id.map(ToString::to_string),
            tool_name: None,
        };

        match write_memory(&self.state, &request).await {
            Ok(outcome) => {
                info!(
                    memory = %outcome.record.id,
                    scope = %outcome.scope_id,
                    "on_message_received: wrote chat_turn"
                );
                Some(outcome.record.id)
            }
            Err(e) => {
                error!(error = %e, "on_message_received failed (non-blocking)");
                None
            }
        }
    }

    /// Write a `task_outcome` entry on task completion
    ///
    /// `tool_name` is appended to the tags when absent; each artifact id gets
    /// a best-effort `related` link. Returns the memory id, or `None` when
    /// skipped or on any failure.
    #[allow(clippy::too_many_arguments)]
    pub async fn on_task_completed(
        &self,
        tenant_id: &str,
        scope: &ScopeKey,
        title: &str,
        content: &str,
        tags: Option<&[String]>,
        author_agent_id: Option<&str>,
        tool_name: Option<&str>,
        artifact_memory_ids: Option<&[String]>,
    ) -> Option<String> {
        if content.trim().is_empty() {
            return None;
        }

        match self
            .write_task_outcome(
                tenant_id,
                scope,
                title,
                content,
                tags,
                author_agent_id,
                tool_name,
                artifact_memory_ids,
            )
            .await
        {
            Ok(memory_id) => Some(memory_id),
            Err(e) => {
                error!(error = %e, "on_task_completed failed (non-blocking)");
                None
            }
        }
    }

    /// Write a tool completion as a `task_outcome`
    pub async fn on_tool_completed(
        &self,
        tenant_id: &str,
        scope: &ScopeKey,
        tool_name: &str,
        result_summary: &str,
        author_agent_id: Option<&str>,
        tags: Option<&[String]>,
    ) -> Option<String> {
        self.on_task_completed(
            tenant_id,
            scope,
            &format!("Tool result: {tool_name}"),
            result_summary,
            tags,
            author_agent_id,
            Some(tool_name),
            None,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_task_outcome(
        &self,
        tenant_id: &str,
        scope: &ScopeKey,
        title: &str,
        content: &str,
        tags: Option<&[String]>,
        author_agent_id: Option<&str>,
        tool_name: Option<&str>,
        artifact_memory_ids: Option<&[String]>,
    ) -> Result<String> {
        let mut all_tags = tags.map(<[String]>::to_vec).unwrap_or_default();
        if let Some(tool) = tool_name {
            if !all_tags.iter().any(|t| t == tool) {
                all_tags.push(tool.to_string());
            }
        }

        let request = WriteRequest {
            tenant_id: tenant_id.to_string(),
            scope: scope.clone(),
            kind: MemoryKind::TaskOutcome,
            title: Some(title.to_string()),
            content: content.to_string(),
            tags: all_tags,
            source: Some("gateway".to_string()),
            author_agent_id: author_agent_id.map(ToString::to_string),
            tool_name: tool_name.map(ToString::to_string),
        };
        let outcome = write_memory(&self.state, &request).await?;
        let memory_id = outcome.record.id;

        if let Some(artifacts) = artifact_memory_ids {
            for artifact_id in artifacts {
                if let Err(e) = self
                    .state
                    .pg
                    .create_link(tenant_id, &memory_id, artifact_id, LinkRelation::Related)
                    .await
                {
                    warn!(
                        task_outcome = %memory_id,
                        artifact = %artifact_id,
                        error = %e,
                        "failed to link task_outcome to artifact"
                    );
                }
            }
        }

        info!(
            memory = %memory_id,
            title,
            scope = %outcome.scope_id,
            "on_task_completed: wrote task_outcome"
        );
        Ok(memory_id)
    }
}
