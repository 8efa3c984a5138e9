//! PostgreSQL durable store
//!
//! All durable persistence lives here: tenants, scopes, memory entries with
//! their embeddings, links, and attachment metadata. The hybrid search query
//! materializes both candidate sets (vector and trigram) in a single
//! statement so retrieval costs one round-trip.
//!
//! Every query predicate includes `tenant_id`; rows from another tenant are
//! unreachable regardless of the id a caller guesses.

use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use pgvector::Vector;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info, warn};

use mnemo_core::config::Settings;
use mnemo_core::error::{MemoryError, Result};
use mnemo_core::identity;
use mnemo_core::types::{
    AttachmentRecord, LinkRecord, LinkRelation, MemoryKind, MemoryRecord, PromotionCandidate,
    ScopeKey, ScoredMemory,
};

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Per-query candidate pool size for each side of the hybrid search
const HYBRID_CANDIDATES: i64 = 50;

/// Weight of the vector score in the fused ranking
const VECTOR_WEIGHT: f64 = 0.75;

/// Weight of the trigram score in the fused ranking
const KEYWORD_WEIGHT: f64 = 0.25;

const ENTRY_COLUMNS: &str =
    "id, kind, title, content, tags, source, author_agent_id, created_at, updated_at";

/// A memory entry to persist, with its embedding
///
/// `content` must already be normalized (the caller hashes and stores the
/// same bytes) and `content_hash` must be the hash of exactly that content.
#[derive(Debug)]
pub struct NewMemory<'a> {
    pub tenant_id: &'a str,
    pub scope_id: &'a str,
    pub kind: MemoryKind,
    pub title: Option<&'a str>,
    pub content: &'a str,
    pub tags: &'a [String],
    pub source: Option<&'a str>,
    pub author_agent_id: Option<&'a str>,
    pub tool_name: Option<&'a str>,
    pub content_hash: &'a str,
    pub embedding: &'a [f32],
}

/// Filters applied to a hybrid search
#[derive(Debug, Default)]
pub struct SearchFilters {
    pub kinds: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub time_range_start: Option<DateTime<Utc>>,
    pub time_range_end: Option<DateTime<Utc>>,
}

/// Async PostgreSQL operations for the memory service
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Connect a pool per the settings and verify connectivity
    ///
    /// The pool is capped at `pg_max_pool`; `pg_min_pool` connections are
    /// opened eagerly so the first requests do not pay connection setup.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the DSN is invalid or the database is unreachable
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let pg_config: tokio_postgres::Config = settings
            .pg_dsn
            .parse()
            .map_err(|e| MemoryError::Storage(format!("invalid PG_DSN: {e}")))?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(settings.pg_max_pool)
            .build()
            .map_err(|e| MemoryError::Storage(format!("failed to build pool: {e}")))?;

        let store = Self { pool };

        // Warm the pool up to the configured minimum; doubles as a
        // connectivity check.
        let mut warm = Vec::with_capacity(settings.pg_min_pool);
        for _ in 0..settings.pg_min_pool {
            warm.push(store.client().await?);
        }
        drop(warm);

        info!(
            max_pool = settings.pg_max_pool,
            min_pool = settings.pg_min_pool,
            "postgres pool ready"
        );
        Ok(store)
    }

    /// Apply schema migrations
    ///
    /// Uses SQL files from `migrations_dir` when the directory exists,
    /// otherwise the migrations embedded at compile time.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if a migration fails to apply
    pub async fn run_migrations(&self, migrations_dir: &str) -> Result<()> {
        let mut client = self.client().await?;

        let runner = if !migrations_dir.is_empty() && std::path::Path::new(migrations_dir).is_dir()
        {
            info!(dir = migrations_dir, "loading migrations from disk");
            let migrations = refinery::load_sql_migrations(migrations_dir)
                .map_err(|e| MemoryError::Storage(format!("failed to load migrations: {e}")))?;
            refinery::Runner::new(&migrations)
        } else {
            embedded::migrations::runner()
        };

        let report = runner
            .run_async(&mut **client)
            .await
            .map_err(|e| MemoryError::Storage(format!("migration failed: {e}")))?;

        info!(
            applied = report.applied_migrations().len(),
            "migrations complete"
        );
        Ok(())
    }

    async fn client(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| MemoryError::Storage(format!("failed to acquire connection: {e}")))
    }

    /// Connectivity probe for the health endpoint
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the database does not answer
    pub async fn ping(&self) -> Result<()> {
        let client = self.client().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| MemoryError::Storage(format!("ping failed: {e}")))?;
        Ok(())
    }

    // Tenants & scopes

    /// Upsert-on-write tenant creation
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn ensure_tenant(&self, tenant_id: &str) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "INSERT INTO tenants (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
                &[&tenant_id, &tenant_id],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("ensure_tenant failed: {e}")))?;
        Ok(())
    }

    /// Resolve (upserting) the derived scope row, returning its id
    ///
    /// Scopes are immutable after creation; a second upsert with the same
    /// dimensions is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn get_or_create_scope(&self, tenant_id: &str, scope: &ScopeKey) -> Result<String> {
        let scope_id = identity::scope_id(tenant_id, scope);
        let client = self.client().await?;
        client
            .execute(
                "INSERT INTO scopes (id, tenant_id, channel_id, conversation_id, project_id, task_id)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (id) DO NOTHING",
                &[
                    &scope_id,
                    &tenant_id,
                    &scope.channel_id,
                    &scope.conversation_id,
                    &scope.project_id,
                    &scope.task_id,
                ],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("get_or_create_scope failed: {e}")))?;
        Ok(scope_id)
    }

    /// All scope ids belonging to a tenant
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn tenant_scopes(&self, tenant_id: &str) -> Result<Vec<String>> {
        let client = self.client().await?;
        let rows = client
            .query("SELECT id FROM scopes WHERE tenant_id = $1", &[&tenant_id])
            .await
            .map_err(|e| MemoryError::Storage(format!("tenant_scopes failed: {e}")))?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    /// Scope ids with any non-summary entry created in the last 7 days
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn scopes_with_recent_activity(&self, tenant_id: &str) -> Result<Vec<String>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT DISTINCT s.id
                 FROM scopes s
                 JOIN memory_entries me ON me.scope_id = s.id
                 WHERE s.tenant_id = $1
                   AND me.created_at >= now() - interval '7 days'
                   AND me.kind != 'summary'",
                &[&tenant_id],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("scope activity query failed: {e}")))?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    // Memory write

    /// Upsert a memory entry with its embedding in one transaction
    ///
    /// Keyed by `(tenant_id, scope_id, kind, content_hash)`; a duplicate
    /// write only touches `updated_at`. The embedding row is overwritten in
    /// lockstep so the entry/embedding pair never diverges (any failure rolls
    /// both back).
    ///
    /// # Errors
    ///
    /// Returns `Storage` on any database failure
    pub async fn write_memory(&self, new: &NewMemory<'_>) -> Result<MemoryRecord> {
        let mem_id = identity::memory_id(new.content_hash);
        let kind = new.kind.as_str();
        let tags = new.tags.to_vec();

        let mut client = self.client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| MemoryError::Storage(format!("failed to open transaction: {e}")))?;

        tx.execute(
            "INSERT INTO memory_entries
                 (id, tenant_id, scope_id, kind, title, content, tags,
                  source, author_agent_id, tool_name, content_hash)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (tenant_id, scope_id, kind, content_hash)
             DO UPDATE SET updated_at = now()",
            &[
                &mem_id,
                &new.tenant_id,
                &new.scope_id,
                &kind,
                &new.title,
                &new.content,
                &tags,
                &new.source,
                &new.author_agent_id,
                &new.tool_name,
                &new.content_hash,
            ],
        )
        .await
        .map_err(|e| MemoryError::Storage(format!("entry upsert failed: {e}")))?;

        tx.execute(
            "INSERT INTO memory_embeddings (memory_id, embedding)
             VALUES ($1, $2)
             ON CONFLICT (memory_id) DO UPDATE SET embedding = EXCLUDED.embedding",
            &[&mem_id, &Vector::from(new.embedding.to_vec())],
        )
        .await
        .map_err(|e| MemoryError::Storage(format!("embedding upsert failed: {e}")))?;

        let readback =
            format!("SELECT {ENTRY_COLUMNS} FROM memory_entries WHERE id = $1 AND tenant_id = $2");
        let row = tx
            .query_one(readback.as_str(), &[&mem_id, &new.tenant_id])
            .await
            .map_err(|e| MemoryError::Storage(format!("entry readback failed: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| MemoryError::Storage(format!("commit failed: {e}")))?;

        debug!(memory_id = %mem_id, tenant = new.tenant_id, "memory written");
        record_from_row(&row)
    }

    // Hybrid search

    /// Hybrid retrieval: vector similarity fused with trigram similarity
    ///
    /// Both candidate sets (top 50 by cosine distance, top 50 by trigram
    /// similarity over content/title) materialize in one statement; the final
    /// score is `0.75 * vec + 0.25 * kw`, ties broken by recency.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn search_memory(
        &self,
        tenant_id: &str,
        scope_id: &str,
        query_embedding: &[f32],
        query_text: &str,
        top_k: i64,
        filters: &SearchFilters,
    ) -> Result<Vec<ScoredMemory>> {
        let vector = Vector::from(query_embedding.to_vec());
        let client = self.client().await?;

        let sql = format!(
            "WITH candidates AS (
                 SELECT me.id, me.kind, me.title, me.content, me.tags,
                        me.source, me.author_agent_id, me.created_at, me.updated_at,
                        1 - (mb.embedding <=> $1) AS vec_score
                 FROM memory_entries me
                 JOIN memory_embeddings mb ON mb.memory_id = me.id
                 WHERE me.tenant_id = $2
                   AND me.scope_id = $3
                   AND ($4::text[] IS NULL OR me.kind = ANY($4::text[]))
                   AND ($5::text[] IS NULL OR me.tags && $5::text[])
                   AND ($7::timestamptz IS NULL OR me.created_at >= $7)
                   AND ($8::timestamptz IS NULL OR me.created_at <= $8)
                 ORDER BY mb.embedding <=> $1
                 LIMIT {HYBRID_CANDIDATES}
             ),
             keyword AS (
                 SELECT me.id,
                        GREATEST(
                            similarity(me.content, $6),
                            similarity(COALESCE(me.title, ''), $6)
                        ) AS kw_score
                 FROM memory_entries me
                 WHERE me.tenant_id = $2
                   AND me.scope_id = $3
                   AND ($4::text[] IS NULL OR me.kind = ANY($4::text[]))
                   AND ($5::text[] IS NULL OR me.tags && $5::text[])
                   AND ($7::timestamptz IS NULL OR me.created_at >= $7)
                   AND ($8::timestamptz IS NULL OR me.created_at <= $8)
                 ORDER BY kw_score DESC
                 LIMIT {HYBRID_CANDIDATES}
             )
             SELECT c.id, c.kind, c.title, c.content, c.tags,
                    c.source, c.author_agent_id, c.created_at, c.updated_at,
                    (c.vec_score * {VECTOR_WEIGHT} + COALESCE(k.kw_score, 0) * {KEYWORD_WEIGHT})::float8 AS score
             FROM candidates c
             LEFT JOIN keyword k ON k.id = c.id
             ORDER BY score DESC, c.created_at DESC
             LIMIT $9"
        );

        let rows = client
            .query(
                sql.as_str(),
                &[
                    &vector,
                    &tenant_id,
                    &scope_id,
                    &filters.kinds,
                    &filters.tags,
                    &query_text,
                    &filters.time_range_start,
                    &filters.time_range_end,
                    &top_k,
                ],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("hybrid search failed: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(ScoredMemory {
                    entry: record_from_row(row)?,
                    score: row.get("score"),
                })
            })
            .collect()
    }

    // Memory read

    /// Fetch a single entry under the tenant, if present
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn get_memory(&self, tenant_id: &str, memory_id: &str) -> Result<Option<MemoryRecord>> {
        let client = self.client().await?;
        let sql =
            format!("SELECT {ENTRY_COLUMNS} FROM memory_entries WHERE id = $1 AND tenant_id = $2");
        let row = client
            .query_opt(sql.as_str(), &[&memory_id, &tenant_id])
            .await
            .map_err(|e| MemoryError::Storage(format!("get_memory failed: {e}")))?;
        row.as_ref().map(record_from_row).transpose()
    }

    /// Most recent entries in a scope, optionally excluding kinds
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn scope_entries(
        &self,
        tenant_id: &str,
        scope_id: &str,
        max_entries: i64,
        exclude_kinds: &[MemoryKind],
    ) -> Result<Vec<MemoryRecord>> {
        let exclude: Vec<String> = exclude_kinds.iter().map(|k| k.as_str().to_string()).collect();
        let client = self.client().await?;
        let sql = format!(
            "SELECT {ENTRY_COLUMNS}
             FROM memory_entries
             WHERE tenant_id = $1 AND scope_id = $2
               AND ($3::text[] = '{{}}' OR kind != ALL($3::text[]))
             ORDER BY created_at DESC
             LIMIT $4"
        );
        let rows = client
            .query(sql.as_str(), &[&tenant_id, &scope_id, &exclude, &max_entries])
            .await
            .map_err(|e| MemoryError::Storage(format!("scope_entries failed: {e}")))?;
        rows.iter().map(record_from_row).collect()
    }

    // Links

    /// Create a link, idempotently
    ///
    /// On conflict the existing row is returned unchanged. Callers are
    /// responsible for verifying both endpoints exist under the tenant.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn create_link(
        &self,
        tenant_id: &str,
        from_memory_id: &str,
        to_memory_id: &str,
        relation: LinkRelation,
    ) -> Result<LinkRecord> {
        let relation_str = relation.as_str();
        let client = self.client().await?;
        let inserted = client
            .query_opt(
                "INSERT INTO memory_links (tenant_id, from_memory_id, to_memory_id, relation)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (from_memory_id, to_memory_id, relation) DO NOTHING
                 RETURNING id, from_memory_id, to_memory_id, relation, created_at",
                &[&tenant_id, &from_memory_id, &to_memory_id, &relation_str],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("link insert failed: {e}")))?;

        let row = match inserted {
            Some(row) => row,
            None => client
                .query_one(
                    "SELECT id, from_memory_id, to_memory_id, relation, created_at
                     FROM memory_links
                     WHERE tenant_id = $1 AND from_memory_id = $2
                       AND to_memory_id = $3 AND relation = $4",
                    &[&tenant_id, &from_memory_id, &to_memory_id, &relation_str],
                )
                .await
                .map_err(|e| MemoryError::Storage(format!("link readback failed: {e}")))?,
        };
        link_from_row(&row)
    }

    /// Links whose `from` endpoint is the given entry
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn links_from(&self, tenant_id: &str, memory_id: &str) -> Result<Vec<LinkRecord>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT id, from_memory_id, to_memory_id, relation, created_at
                 FROM memory_links
                 WHERE tenant_id = $1 AND from_memory_id = $2",
                &[&tenant_id, &memory_id],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("links_from failed: {e}")))?;
        rows.iter().map(link_from_row).collect()
    }

    /// Links whose `to` endpoint is the given entry
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn links_to(&self, tenant_id: &str, memory_id: &str) -> Result<Vec<LinkRecord>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT id, from_memory_id, to_memory_id, relation, created_at
                 FROM memory_links
                 WHERE tenant_id = $1 AND to_memory_id = $2",
                &[&tenant_id, &memory_id],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("links_to failed: {e}")))?;
        rows.iter().map(link_from_row).collect()
    }

    // Attachments

    /// Persist attachment metadata, idempotently by content-derived id
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    #[allow(clippy::too_many_arguments)]
    pub async fn write_attachment(
        &self,
        attachment_id: &str,
        tenant_id: &str,
        memory_id: &str,
        blob_key: &str,
        filename: &str,
        mime_type: &str,
        byte_count: i64,
        sha256: &str,
    ) -> Result<AttachmentRecord> {
        let client = self.client().await?;
        let inserted = client
            .query_opt(
                "INSERT INTO memory_attachments
                     (id, tenant_id, memory_id, blob_key, filename, mime_type, bytes, sha256)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (id) DO NOTHING
                 RETURNING id, memory_id, blob_key, filename, mime_type, bytes, sha256, created_at",
                &[
                    &attachment_id,
                    &tenant_id,
                    &memory_id,
                    &blob_key,
                    &filename,
                    &mime_type,
                    &byte_count,
                    &sha256,
                ],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("attachment insert failed: {e}")))?;

        let row = match inserted {
            Some(row) => row,
            None => client
                .query_one(
                    "SELECT id, memory_id, blob_key, filename, mime_type, bytes, sha256, created_at
                     FROM memory_attachments
                     WHERE id = $1 AND tenant_id = $2",
                    &[&attachment_id, &tenant_id],
                )
                .await
                .map_err(|e| MemoryError::Storage(format!("attachment readback failed: {e}")))?,
        };
        attachment_from_row(&row)
    }

    /// Attachment metadata by id, under the tenant
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn get_attachment(
        &self,
        tenant_id: &str,
        attachment_id: &str,
    ) -> Result<Option<AttachmentRecord>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "SELECT id, memory_id, blob_key, filename, mime_type, bytes, sha256, created_at
                 FROM memory_attachments
                 WHERE id = $1 AND tenant_id = $2",
                &[&attachment_id, &tenant_id],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("get_attachment failed: {e}")))?;
        row.as_ref().map(attachment_from_row).transpose()
    }

    /// All attachments of a memory entry
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn get_attachments(
        &self,
        tenant_id: &str,
        memory_id: &str,
    ) -> Result<Vec<AttachmentRecord>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT id, memory_id, blob_key, filename, mime_type, bytes, sha256, created_at
                 FROM memory_attachments
                 WHERE memory_id = $1 AND tenant_id = $2",
                &[&memory_id, &tenant_id],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("get_attachments failed: {e}")))?;
        rows.iter().map(attachment_from_row).collect()
    }

    // Lifecycle job queries

    /// Task outcomes referenced at least `min_references` times in the window
    ///
    /// Candidates already carrying the `promoted` tag are excluded, so the
    /// promotion job is idempotent.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn promotion_candidates(
        &self,
        tenant_id: &str,
        min_references: i64,
        lookback_days: i32,
    ) -> Result<Vec<PromotionCandidate>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT me.id, me.title, COUNT(ml.id) AS ref_count
                 FROM memory_entries me
                 JOIN memory_links ml ON ml.to_memory_id = me.id
                 WHERE me.tenant_id = $1
                   AND me.kind = 'task_outcome'
                   AND me.created_at >= now() - ($3 * interval '1 day')
                   AND NOT ('promoted' = ANY(me.tags))
                 GROUP BY me.id
                 HAVING COUNT(ml.id) >= $2",
                &[&tenant_id, &min_references, &lookback_days],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("promotion query failed: {e}")))?;

        Ok(rows
            .iter()
            .map(|row| PromotionCandidate {
                id: row.get("id"),
                title: row.get("title"),
                ref_count: row.get("ref_count"),
            })
            .collect())
    }

    /// Append a tag unless already present; touches `updated_at`
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn append_tag(&self, tenant_id: &str, memory_id: &str, tag: &str) -> Result<()> {
        let client = self.client().await?;
        client
            .execute(
                "UPDATE memory_entries
                 SET tags = array_append(tags, $3), updated_at = now()
                 WHERE id = $1 AND tenant_id = $2 AND NOT ($3 = ANY(tags))",
                &[&memory_id, &tenant_id, &tag],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("append_tag failed: {e}")))?;
        Ok(())
    }

    /// Delete non-promoted chat turns older than the threshold
    ///
    /// Returns the number of deleted rows.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on database failure
    pub async fn delete_old_chat_turns(
        &self,
        tenant_id: &str,
        scope_id: &str,
        older_than_days: i32,
    ) -> Result<u64> {
        let client = self.client().await?;
        let deleted = client
            .execute(
                "DELETE FROM memory_entries
                 WHERE tenant_id = $1
                   AND scope_id = $2
                   AND kind = 'chat_turn'
                   AND created_at < now() - ($3 * interval '1 day')
                   AND NOT ('promoted' = ANY(tags))",
                &[&tenant_id, &scope_id, &older_than_days],
            )
            .await
            .map_err(|e| MemoryError::Storage(format!("prune delete failed: {e}")))?;
        if deleted > 0 {
            warn!(tenant = tenant_id, scope = scope_id, deleted, "pruned chat turns");
        }
        Ok(deleted)
    }
}

fn record_from_row(row: &Row) -> Result<MemoryRecord> {
    let kind: String = row.get("kind");
    Ok(MemoryRecord {
        id: row.get("id"),
        kind: MemoryKind::parse(&kind)
            .map_err(|_| MemoryError::Storage(format!("unexpected kind in row: {kind}")))?,
        title: row.get("title"),
        content: row.get("content"),
        tags: row.get("tags"),
        source: row.get("source"),
        author_agent_id: row.get("author_agent_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn link_from_row(row: &Row) -> Result<LinkRecord> {
    let relation: String = row.get("relation");
    Ok(LinkRecord {
        id: row.get("id"),
        from_memory_id: row.get("from_memory_id"),
        to_memory_id: row.get("to_memory_id"),
        relation: LinkRelation::parse(&relation)
            .map_err(|_| MemoryError::Storage(format!("unexpected relation in row: {relation}")))?,
        created_at: row.get("created_at"),
    })
}

fn attachment_from_row(row: &Row) -> Result<AttachmentRecord> {
    Ok(AttachmentRecord {
        id: row.get("id"),
        memory_id: row.get("memory_id"),
        blob_key: row.get("blob_key"),
        filename: row.get("filename"),
        mime_type: row.get("mime_type"),
        bytes: row.get("bytes"),
        sha256: row.get("sha256"),
        created_at: row.get("created_at"),
    })
}
