//! Tool endpoint handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;

use mnemo_core::identity::{attachment_id, sha256_hex};
use mnemo_storage::BlobStore;

use crate::search::{search_memory, SearchRequest};
use crate::state::AppState;
use crate::summarize::summarize_scope;
use crate::write::{write_memory, WriteRequest};

use super::models::{
    AttachBlobIn, AttachmentOut, FetchBlobIn, FetchBlobOut, LinkOut, MemoryGetIn, MemoryGetOut,
    MemoryLinkIn, MemoryOut, MemorySearchIn, MemoryWriteIn, SummarizeScopeIn,
};
use super::ApiError;

/// Presigned download URL validity
const BLOB_URL_TTL: std::time::Duration = std::time::Duration::from_secs(3600);

/// Persist a memory entry with embedding; idempotent via content-hash dedupe
pub async fn memory_write(
    State(state): State<AppState>,
    Json(payload): Json<MemoryWriteIn>,
) -> Result<Json<MemoryOut>, ApiError> {
    let request = WriteRequest {
        tenant_id: payload.tenant_id,
        scope: payload.scope,
        kind: payload.kind,
        title: payload.title,
        content: payload.content,
        tags: payload.tags,
        source: payload.source,
        author_agent_id: payload.author_agent_id,
        tool_name: payload.tool_name,
    };
    let outcome = write_memory(&state, &request).await?;
    Ok(Json(MemoryOut::from(outcome.record)))
}

/// Hybrid retrieval: vector + trigram similarity under metadata filters
pub async fn memory_search(
    State(state): State<AppState>,
    Json(payload): Json<MemorySearchIn>,
) -> Result<Json<Vec<MemoryOut>>, ApiError> {
    if !(1..=100).contains(&payload.top_k) {
        return Err(ApiError::bad_request("top_k must be between 1 and 100"));
    }

    let request = SearchRequest {
        tenant_id: payload.tenant_id,
        scope: payload.scope_filter,
        query: payload.query,
        top_k: payload.top_k,
        tags: payload.tags,
        kinds: payload.kinds,
        time_range_start: payload.time_range_start,
        time_range_end: payload.time_range_end,
    };
    let results = search_memory(&state, &request).await?;
    Ok(Json(results.into_iter().map(MemoryOut::from).collect()))
}

/// Fetch a full entry with attachments and links
pub async fn memory_get(
    State(state): State<AppState>,
    Json(payload): Json<MemoryGetIn>,
) -> Result<Json<MemoryGetOut>, ApiError> {
    let record = state
        .pg
        .get_memory(&payload.tenant_id, &payload.memory_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Memory entry not found"))?;

    let attachments = state
        .pg
        .get_attachments(&payload.tenant_id, &payload.memory_id)
        .await?;
    let linked_from = state
        .pg
        .links_from(&payload.tenant_id, &payload.memory_id)
        .await?;
    let linked_to = state
        .pg
        .links_to(&payload.tenant_id, &payload.memory_id)
        .await?;

    Ok(Json(MemoryGetOut {
        entry: MemoryOut::from(record),
        attachments: attachments.into_iter().map(AttachmentOut::from).collect(),
        linked_from: linked_from.into_iter().map(LinkOut::from).collect(),
        linked_to: linked_to.into_iter().map(LinkOut::from).collect(),
    }))
}

/// Create a relationship between two entries of the tenant
pub async fn memory_link(
    State(state): State<AppState>,
    Json(payload): Json<MemoryLinkIn>,
) -> Result<Json<LinkOut>, ApiError> {
    if state
        .pg
        .get_memory(&payload.tenant_id, &payload.from_memory_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(format!(
            "Source memory entry not found: {}",
            payload.from_memory_id
        )));
    }
    if state
        .pg
        .get_memory(&payload.tenant_id, &payload.to_memory_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(format!(
            "Target memory entry not found: {}",
            payload.to_memory_id
        )));
    }

    let link = state
        .pg
        .create_link(
            &payload.tenant_id,
            &payload.from_memory_id,
            &payload.to_memory_id,
            payload.relation,
        )
        .await?;
    Ok(Json(LinkOut::from(link)))
}

/// Summarize recent entries of a scope into a new `summary` entry
pub async fn memory_summarize_scope(
    State(state): State<AppState>,
    Json(payload): Json<SummarizeScopeIn>,
) -> Result<Json<MemoryOut>, ApiError> {
    if !(1..=500).contains(&payload.max_entries) {
        return Err(ApiError::bad_request("max_entries must be between 1 and 500"));
    }

    let summary = summarize_scope(
        &state,
        &payload.tenant_id,
        &payload.scope,
        payload.mode,
        payload.max_entries,
    )
    .await?;
    Ok(Json(MemoryOut::from(summary.record)))
}

/// Upload an attachment and record its metadata
pub async fn memory_attach_blob(
    State(state): State<AppState>,
    Json(payload): Json<AttachBlobIn>,
) -> Result<Json<AttachmentOut>, ApiError> {
    if state
        .pg
        .get_memory(&payload.tenant_id, &payload.memory_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Memory entry not found"));
    }

    let data = BASE64
        .decode(&payload.data_base64)
        .map_err(|_| ApiError::bad_request("Invalid base64 data"))?;

    let blob_key = BlobStore::blob_key(&payload.tenant_id, &payload.memory_id, &payload.filename);
    state
        .blob
        .put(&blob_key, data.clone(), &payload.mime_type)
        .await?;

    let sha256 = sha256_hex(&data);
    let attachment = state
        .pg
        .write_attachment(
            &attachment_id(&data),
            &payload.tenant_id,
            &payload.memory_id,
            &blob_key,
            &payload.filename,
            &payload.mime_type,
            data.len() as i64,
            &sha256,
        )
        .await?;
    Ok(Json(AttachmentOut::from(attachment)))
}

/// Retrieve an attachment: presigned URL when available, inline base64 otherwise
pub async fn memory_fetch_blob(
    State(state): State<AppState>,
    Json(payload): Json<FetchBlobIn>,
) -> Result<Json<FetchBlobOut>, ApiError> {
    let attachment = state
        .pg
        .get_attachment(&payload.tenant_id, &payload.attachment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Attachment not found"))?;

    if let Some(url) = state.blob.presign(&attachment.blob_key, BLOB_URL_TTL).await {
        let mut out = AttachmentOut::from(attachment);
        out.download_url = Some(url);
        return Ok(Json(FetchBlobOut {
            attachment: out,
            data_base64: None,
        }));
    }

    let data_base64 = state
        .blob
        .get(&attachment.blob_key)
        .await
        .map(|data| BASE64.encode(data));
    Ok(Json(FetchBlobOut {
        attachment: AttachmentOut::from(attachment),
        data_base64,
    }))
}

/// Health check: both backends must answer
pub async fn health(State(state): State<AppState>) -> Response {
    match tokio::try_join!(state.pg.ping(), state.cache.ping()) {
        Ok(_) => Json(json!({ "status": "ok", "postgres": "ok", "redis": "ok" })).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Observability counters for a tenant
pub async fn stats(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Response, ApiError> {
    let stats = state.cache.get_stats(&tenant_id).await?;
    Ok(Json(stats).into_response())
}
