//! Core types for the memory service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};

/// Kind of knowledge a memory entry carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A single conversation turn
    ChatTurn,
    /// Durable result of a completed task
    TaskOutcome,
    /// A recorded decision
    Decision,
    /// Operational runbook
    Runbook,
    /// Chunk of an ingested document
    DocChunk,
    /// Generated scope summary
    Summary,
}

impl MemoryKind {
    /// Wire/database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChatTurn => "chat_turn",
            Self::TaskOutcome => "task_outcome",
            Self::Decision => "decision",
            Self::Runbook => "runbook",
            Self::DocChunk => "doc_chunk",
            Self::Summary => "summary",
        }
    }

    /// Parse from the wire/database representation
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown kind string
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "chat_turn" => Ok(Self::ChatTurn),
            "task_outcome" => Ok(Self::TaskOutcome),
            "decision" => Ok(Self::Decision),
            "runbook" => Ok(Self::Runbook),
            "doc_chunk" => Ok(Self::DocChunk),
            "summary" => Ok(Self::Summary),
            other => Err(MemoryError::InvalidInput(format!(
                "unknown memory kind: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation carried by a directed link between two entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRelation {
    Supports,
    DerivedFrom,
    Duplicates,
    Supersedes,
    Related,
}

impl LinkRelation {
    /// Wire/database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Supports => "supports",
            Self::DerivedFrom => "derived_from",
            Self::Duplicates => "duplicates",
            Self::Supersedes => "supersedes",
            Self::Related => "related",
        }
    }

    /// Parse from the wire/database representation
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown relation string
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "supports" => Ok(Self::Supports),
            "derived_from" => Ok(Self::DerivedFrom),
            "duplicates" => Ok(Self::Duplicates),
            "supersedes" => Ok(Self::Supersedes),
            "related" => Ok(Self::Related),
            other => Err(MemoryError::InvalidInput(format!(
                "unknown link relation: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for LinkRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMode {
    /// Top 20 entries, content truncated to 200 chars each
    Brief,
    /// All entries, full content, `---` separators
    Full,
}

impl SummaryMode {
    /// Wire representation (also used as a summary tag)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brief => "brief",
            Self::Full => "full",
        }
    }

    /// Parse from the wire representation
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown mode string
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "brief" => Ok(Self::Brief),
            "full" => Ok(Self::Full),
            other => Err(MemoryError::InvalidInput(format!(
                "unknown summary mode: {other}"
            ))),
        }
    }
}

/// Hierarchical scope isolating memory between agent contexts
///
/// All four dimensions are optional; the empty scope is itself a valid scope.
/// Identity is derived from the tenant plus the four dimensions, see
/// [`crate::identity::scope_id`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
}

impl ScopeKey {
    /// Scope with only a channel dimension
    #[must_use]
    pub fn channel(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: Some(channel_id.into()),
            ..Self::default()
        }
    }
}

/// A stored memory entry, as read back from the durable store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Deterministic id: `mem_` + first 24 hex chars of the content hash
    pub id: String,
    pub kind: MemoryKind,
    pub title: Option<String>,
    /// Normalized content (outer whitespace trimmed, inner runs collapsed)
    pub content: String,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub author_agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    /// True when this row was touched by a duplicate write after creation
    #[must_use]
    pub fn was_rewritten(&self) -> bool {
        self.updated_at.is_some_and(|u| u > self.created_at)
    }
}

/// A search result row: entry plus its fused hybrid score
///
/// The score is an opaque comparable scalar (`0.75 * vec + 0.25 * kw`), not a
/// probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMemory {
    #[serde(flatten)]
    pub entry: MemoryRecord,
    pub score: f64,
}

/// Directed typed edge between two entries of the same tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: i64,
    pub from_memory_id: String,
    pub to_memory_id: String,
    pub relation: LinkRelation,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a blob attached to an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Deterministic id: `att_` + first 24 hex chars of sha256(bytes)
    pub id: String,
    pub memory_id: String,
    pub blob_key: String,
    pub filename: String,
    pub mime_type: String,
    pub bytes: i64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// A promotion candidate with its inbound reference count
#[derive(Debug, Clone)]
pub struct PromotionCandidate {
    pub id: String,
    pub title: Option<String>,
    pub ref_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_wire_form() {
        for kind in [
            MemoryKind::ChatTurn,
            MemoryKind::TaskOutcome,
            MemoryKind::Decision,
            MemoryKind::Runbook,
            MemoryKind::DocChunk,
            MemoryKind::Summary,
        ] {
            assert_eq!(MemoryKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(MemoryKind::parse("journal").is_err());
    }

    #[test]
    fn kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&MemoryKind::TaskOutcome).unwrap();
        assert_eq!(json, "\"task_outcome\"");
        let back: MemoryKind = serde_json::from_str("\"doc_chunk\"").unwrap();
        assert_eq!(back, MemoryKind::DocChunk);
    }

    #[test]
    fn relation_round_trips_through_wire_form() {
        for rel in [
            LinkRelation::Supports,
            LinkRelation::DerivedFrom,
            LinkRelation::Duplicates,
            LinkRelation::Supersedes,
            LinkRelation::Related,
        ] {
            assert_eq!(LinkRelation::parse(rel.as_str()).unwrap(), rel);
        }
    }

    #[test]
    fn scope_key_deserializes_with_missing_dimensions() {
        let scope: ScopeKey = serde_json::from_str(r#"{"channel_id": "c1"}"#).unwrap();
        assert_eq!(scope.channel_id.as_deref(), Some("c1"));
        assert!(scope.conversation_id.is_none());
        assert!(scope.project_id.is_none());
        assert!(scope.task_id.is_none());
    }

    #[test]
    fn scored_memory_flattens_entry_fields() {
        let record = MemoryRecord {
            id: "mem_abc".into(),
            kind: MemoryKind::Decision,
            title: None,
            content: "use pgvector".into(),
            tags: vec!["architecture".into()],
            source: Some("gateway".into()),
            author_agent_id: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        let scored = ScoredMemory {
            entry: record,
            score: 0.8125,
        };
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["id"], "mem_abc");
        assert_eq!(value["score"], 0.8125);

        let back: ScoredMemory = serde_json::from_value(value).unwrap();
        assert_eq!(back.entry.id, "mem_abc");
    }

    #[test]
    fn rewrite_detection_compares_timestamps() {
        let created = Utc::now();
        let mut record = MemoryRecord {
            id: "mem_x".into(),
            kind: MemoryKind::ChatTurn,
            title: None,
            content: "hi".into(),
            tags: vec![],
            source: None,
            author_agent_id: None,
            created_at: created,
            updated_at: Some(created),
        };
        assert!(!record.was_rewritten());
        record.updated_at = Some(created + chrono::Duration::seconds(5));
        assert!(record.was_rewritten());
    }
}
