//! Redis caching layer
//!
//! Implements:
//! - Working-set lists: last N memory ids per (tenant, scope)
//! - Search-result cache keyed by query fingerprint
//! - Observability counters (24h TTL)
//!
//! Everything here is advisory. The durable store is authoritative; callers
//! treat any cache failure as a miss and keep going.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use tracing::{debug, info};

use mnemo_core::config::Settings;
use mnemo_core::error::{MemoryError, Result};
use mnemo_core::identity::search_fingerprint;
use mnemo_core::types::ScoredMemory;

/// TTL applied to observability counters
const COUNTER_TTL_SECS: i64 = 86_400;

/// Batch size for incremental SCAN during invalidation
const SCAN_COUNT: usize = 100;

/// Per-tenant and global observability counters
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub writes: i64,
    pub searches: i64,
    pub dedupes: i64,
    pub search_cache_hits: i64,
    pub search_cache_misses: i64,
}

/// Async Redis cache operations
#[derive(Clone)]
pub struct MemoryCache {
    conn: ConnectionManager,
    working_set_ttl: u64,
    working_set_max: usize,
    search_cache_ttl: u64,
}

impl MemoryCache {
    /// Connect and verify the cache is reachable
    ///
    /// # Errors
    ///
    /// Returns `Cache` if the URL is invalid or Redis does not answer
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let client = redis::Client::open(settings.redis_url.as_str())
            .map_err(|e| MemoryError::Cache(format!("invalid REDIS_URL: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| MemoryError::Cache(format!("failed to connect: {e}")))?;

        let cache = Self {
            conn,
            working_set_ttl: settings.working_set_ttl,
            working_set_max: settings.working_set_max,
            search_cache_ttl: settings.search_cache_ttl,
        };
        cache.ping().await?;
        info!("redis cache ready");
        Ok(cache)
    }

    /// Connectivity probe for the health endpoint
    ///
    /// # Errors
    ///
    /// Returns `Cache` if Redis does not answer
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| MemoryError::Cache(format!("ping failed: {e}")))?;
        Ok(())
    }

    // Working set

    fn working_set_key(tenant_id: &str, scope_id: &str) -> String {
        format!("mem:ws:{tenant_id}:{scope_id}")
    }

    /// Move a memory id to the front of the scope's working set
    ///
    /// Remove-existing / prepend / trim / refresh-TTL run as one MULTI block,
    /// so concurrent pushes to the same key cannot interleave. Pushing an id
    /// already at the head is a no-op apart from the TTL refresh.
    ///
    /// # Errors
    ///
    /// Returns `Cache` on Redis failure
    pub async fn push_to_working_set(
        &self,
        tenant_id: &str,
        scope_id: &str,
        memory_id: &str,
    ) -> Result<()> {
        let key = Self::working_set_key(tenant_id, scope_id);
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .lrem(&key, 0, memory_id)
            .ignore()
            .lpush(&key, memory_id)
            .ignore()
            .ltrim(&key, 0, self.working_set_max as isize - 1)
            .ignore()
            .expire(&key, self.working_set_ttl as i64)
            .ignore();
        let () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| MemoryError::Cache(format!("working-set push failed: {e}")))?;
        Ok(())
    }

    /// The working-set ids for a scope, most recent first (possibly empty)
    ///
    /// # Errors
    ///
    /// Returns `Cache` on Redis failure
    pub async fn get_working_set(&self, tenant_id: &str, scope_id: &str) -> Result<Vec<String>> {
        let key = Self::working_set_key(tenant_id, scope_id);
        let mut conn = self.conn.clone();
        conn.lrange(&key, 0, -1)
            .await
            .map_err(|e| MemoryError::Cache(format!("working-set read failed: {e}")))
    }

    // Search cache

    fn search_cache_key(tenant_id: &str, scope_id: &str, fingerprint: &str) -> String {
        format!("mem:sc:{tenant_id}:{scope_id}:{fingerprint}")
    }

    /// Cached results for a query fingerprint, if fresh
    ///
    /// Hit/miss counters are recorded here so every probe is counted exactly
    /// once.
    ///
    /// # Errors
    ///
    /// Returns `Cache` on Redis failure
    pub async fn get_cached_search(
        &self,
        tenant_id: &str,
        scope_id: &str,
        query: &str,
        tags: &[String],
        kinds: &[String],
        top_k: i64,
    ) -> Result<Option<Vec<ScoredMemory>>> {
        let fingerprint = search_fingerprint(query, tags, kinds, top_k);
        let key = Self::search_cache_key(tenant_id, scope_id, &fingerprint);
        let mut conn = self.conn.clone();

        let cached: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| MemoryError::Cache(format!("search-cache read failed: {e}")))?;

        match cached {
            Some(raw) => {
                debug!(key = %key, "search cache hit");
                self.increment_counter("mem:stats:search_cache_hits").await?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => {
                self.increment_counter("mem:stats:search_cache_misses").await?;
                Ok(None)
            }
        }
    }

    /// Memoize search results under the query fingerprint
    ///
    /// # Errors
    ///
    /// Returns `Cache` on Redis failure, `Serialization` if rows cannot be
    /// encoded
    pub async fn set_cached_search(
        &self,
        tenant_id: &str,
        scope_id: &str,
        query: &str,
        tags: &[String],
        kinds: &[String],
        top_k: i64,
        results: &[ScoredMemory],
    ) -> Result<()> {
        let fingerprint = search_fingerprint(query, tags, kinds, top_k);
        let key = Self::search_cache_key(tenant_id, scope_id, &fingerprint);
        let payload = serde_json::to_string(results)?;
        let mut conn = self.conn.clone();
        conn.set_ex(&key, payload, self.search_cache_ttl)
            .await
            .map_err(|e| MemoryError::Cache(format!("search-cache write failed: {e}")))
    }

    /// Drop every cached search for a scope after a write
    ///
    /// Uses incremental SCAN so invalidation never blocks the server on a
    /// large keyspace.
    ///
    /// # Errors
    ///
    /// Returns `Cache` on Redis failure
    pub async fn invalidate_scope_cache(&self, tenant_id: &str, scope_id: &str) -> Result<()> {
        let pattern = format!("mem:sc:{tenant_id}:{scope_id}:*");
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .map_err(|e| MemoryError::Cache(format!("invalidation scan failed: {e}")))?;

            if !keys.is_empty() {
                conn.del::<_, ()>(keys)
                    .await
                    .map_err(|e| MemoryError::Cache(format!("invalidation delete failed: {e}")))?;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(())
    }

    // Observability counters

    async fn increment_counter(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.incr(key, 1)
            .ignore()
            .expire(key, COUNTER_TTL_SECS)
            .ignore();
        let () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| MemoryError::Cache(format!("counter increment failed: {e}")))?;
        Ok(())
    }

    /// Count a successful write for the tenant
    ///
    /// # Errors
    ///
    /// Returns `Cache` on Redis failure
    pub async fn record_write(&self, tenant_id: &str) -> Result<()> {
        self.increment_counter(&format!("mem:stats:writes:{tenant_id}"))
            .await
    }

    /// Count a search for the tenant
    ///
    /// # Errors
    ///
    /// Returns `Cache` on Redis failure
    pub async fn record_search(&self, tenant_id: &str) -> Result<()> {
        self.increment_counter(&format!("mem:stats:searches:{tenant_id}"))
            .await
    }

    /// Count a dedupe hit (a write that matched an existing entry)
    ///
    /// # Errors
    ///
    /// Returns `Cache` on Redis failure
    pub async fn record_dedupe_hit(&self, tenant_id: &str) -> Result<()> {
        self.increment_counter(&format!("mem:stats:dedupes:{tenant_id}"))
            .await
    }

    /// Current counters for a tenant plus the global cache hit/miss totals
    ///
    /// # Errors
    ///
    /// Returns `Cache` on Redis failure
    pub async fn get_stats(&self, tenant_id: &str) -> Result<CacheStats> {
        let keys = vec![
            format!("mem:stats:writes:{tenant_id}"),
            format!("mem:stats:searches:{tenant_id}"),
            format!("mem:stats:dedupes:{tenant_id}"),
            "mem:stats:search_cache_hits".to_string(),
            "mem:stats:search_cache_misses".to_string(),
        ];
        let mut conn = self.conn.clone();
        let values: Vec<Option<i64>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| MemoryError::Cache(format!("stats read failed: {e}")))?;

        Ok(CacheStats {
            writes: values.first().copied().flatten().unwrap_or(0),
            searches: values.get(1).copied().flatten().unwrap_or(0),
            dedupes: values.get(2).copied().flatten().unwrap_or(0),
            search_cache_hits: values.get(3).copied().flatten().unwrap_or(0),
            search_cache_misses: values.get(4).copied().flatten().unwrap_or(0),
        })
    }
}
