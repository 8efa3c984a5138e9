//! Wire models for the tool endpoints
//!
//! Request/response contracts are normative: field names and shapes match
//! the gateway's expectations, timestamps are ISO-8601 UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mnemo_core::types::{
    AttachmentRecord, LinkRecord, LinkRelation, MemoryKind, MemoryRecord, ScopeKey, ScoredMemory,
    SummaryMode,
};

// memory.write

#[derive(Debug, Deserialize)]
pub struct MemoryWriteIn {
    pub tenant_id: String,
    pub scope: ScopeKey,
    pub kind: MemoryKind,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_source")]
    pub source: Option<String>,
    #[serde(default)]
    pub author_agent_id: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
}

fn default_source() -> Option<String> {
    Some("gateway".to_string())
}

/// Standard memory entry output
#[derive(Debug, Serialize)]
pub struct MemoryOut {
    pub id: String,
    pub kind: MemoryKind,
    pub title: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub author_agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
}

impl From<MemoryRecord> for MemoryOut {
    fn from(record: MemoryRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            title: record.title,
            content: record.content,
            tags: record.tags,
            source: record.source,
            author_agent_id: record.author_agent_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            score: None,
        }
    }
}

impl From<ScoredMemory> for MemoryOut {
    fn from(scored: ScoredMemory) -> Self {
        let mut out = Self::from(scored.entry);
        out.score = Some(scored.score);
        out
    }
}

// memory.search

#[derive(Debug, Deserialize)]
pub struct MemorySearchIn {
    pub tenant_id: String,
    pub scope_filter: ScopeKey,
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub kinds: Vec<MemoryKind>,
    #[serde(default)]
    pub time_range_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_range_end: Option<DateTime<Utc>>,
}

const fn default_top_k() -> i64 {
    10
}

// memory.get

#[derive(Debug, Deserialize)]
pub struct MemoryGetIn {
    pub tenant_id: String,
    pub memory_id: String,
}

/// Full memory entry with attachments and links
#[derive(Debug, Serialize)]
pub struct MemoryGetOut {
    pub entry: MemoryOut,
    pub attachments: Vec<AttachmentOut>,
    pub linked_from: Vec<LinkOut>,
    pub linked_to: Vec<LinkOut>,
}

// memory.link

#[derive(Debug, Deserialize)]
pub struct MemoryLinkIn {
    pub tenant_id: String,
    pub from_memory_id: String,
    pub to_memory_id: String,
    pub relation: LinkRelation,
}

#[derive(Debug, Serialize)]
pub struct LinkOut {
    pub id: i64,
    pub from_memory_id: String,
    pub to_memory_id: String,
    pub relation: LinkRelation,
    pub created_at: DateTime<Utc>,
}

impl From<LinkRecord> for LinkOut {
    fn from(link: LinkRecord) -> Self {
        Self {
            id: link.id,
            from_memory_id: link.from_memory_id,
            to_memory_id: link.to_memory_id,
            relation: link.relation,
            created_at: link.created_at,
        }
    }
}

// memory.summarize_scope

#[derive(Debug, Deserialize)]
pub struct SummarizeScopeIn {
    pub tenant_id: String,
    pub scope: ScopeKey,
    #[serde(default = "default_mode")]
    pub mode: SummaryMode,
    #[serde(default = "default_max_entries")]
    pub max_entries: i64,
}

const fn default_mode() -> SummaryMode {
    SummaryMode::Brief
}

const fn default_max_entries() -> i64 {
    50
}

// memory.attach_blob / fetch_blob

#[derive(Debug, Deserialize)]
pub struct AttachBlobIn {
    pub tenant_id: String,
    pub memory_id: String,
    pub filename: String,
    pub mime_type: String,
    pub data_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct FetchBlobIn {
    pub tenant_id: String,
    pub attachment_id: String,
}

#[derive(Debug, Serialize)]
pub struct AttachmentOut {
    pub id: String,
    pub memory_id: String,
    pub blob_key: String,
    pub filename: String,
    pub mime_type: String,
    pub bytes: i64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
    pub download_url: Option<String>,
}

impl From<AttachmentRecord> for AttachmentOut {
    fn from(attachment: AttachmentRecord) -> Self {
        Self {
            id: attachment.id,
            memory_id: attachment.memory_id,
            blob_key: attachment.blob_key,
            filename: attachment.filename,
            mime_type: attachment.mime_type,
            bytes: attachment.bytes,
            sha256: attachment.sha256,
            created_at: attachment.created_at,
            download_url: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FetchBlobOut {
    pub attachment: AttachmentOut,
    pub data_base64: Option<String>,
}
