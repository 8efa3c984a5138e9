//! Integration tests for `MemoryCache` against a live Redis
//!
//! Run with `cargo test -- --ignored` once Redis is reachable via
//! `REDIS_URL` (docker-compose up redis).

use chrono::Utc;
use uuid::Uuid;

use mnemo_core::config::Settings;
use mnemo_core::types::{MemoryKind, MemoryRecord, ScoredMemory};
use mnemo_storage::MemoryCache;

async fn cache() -> MemoryCache {
    let settings = Settings::from_env();
    MemoryCache::connect(&settings)
        .await
        .expect("failed to connect to redis (is docker-compose up?)")
}

fn unique_tenant(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn sample_result(id: &str) -> ScoredMemory {
    ScoredMemory {
        entry: MemoryRecord {
            id: id.to_string(),
            kind: MemoryKind::TaskOutcome,
            title: Some("docker push fix".to_string()),
            content: "Resolved push stall by increasing client timeout.".to_string(),
            tags: vec!["docker".to_string()],
            source: Some("gateway".to_string()),
            author_agent_id: None,
            created_at: Utc::now(),
            updated_at: Some(Utc::now()),
        },
        score: 0.9,
    }
}

#[tokio::test]
#[ignore = "requires live redis (docker-compose up redis)"]
async fn working_set_push_is_idempotent_and_ordered() {
    let cache = cache().await;
    let tenant = unique_tenant("ws");
    let scope = "sc_test";

    cache.push_to_working_set(&tenant, scope, "mem_a").await.unwrap();
    cache.push_to_working_set(&tenant, scope, "mem_b").await.unwrap();
    cache.push_to_working_set(&tenant, scope, "mem_a").await.unwrap();

    let ids = cache.get_working_set(&tenant, scope).await.unwrap();
    assert_eq!(ids, vec!["mem_a".to_string(), "mem_b".to_string()]);
}

#[tokio::test]
#[ignore = "requires live redis (docker-compose up redis)"]
async fn working_set_read_of_absent_scope_is_empty() {
    let cache = cache().await;
    let tenant = unique_tenant("ws-empty");
    let ids = cache.get_working_set(&tenant, "sc_nothing").await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
#[ignore = "requires live redis (docker-compose up redis)"]
async fn search_cache_round_trips_and_invalidates() {
    let cache = cache().await;
    let tenant = unique_tenant("sc");
    let scope = "sc_test";
    let tags: Vec<String> = vec![];
    let kinds: Vec<String> = vec![];

    assert!(cache
        .get_cached_search(&tenant, scope, "docker", &tags, &kinds, 5)
        .await
        .unwrap()
        .is_none());

    let rows = vec![sample_result("mem_1"), sample_result("mem_2")];
    cache
        .set_cached_search(&tenant, scope, "docker", &tags, &kinds, 5, &rows)
        .await
        .unwrap();

    let hit = cache
        .get_cached_search(&tenant, scope, "docker", &tags, &kinds, 5)
        .await
        .unwrap()
        .expect("expected cache hit");
    assert_eq!(hit.len(), 2);
    assert_eq!(hit[0].entry.id, "mem_1");

    // A different top_k is a different fingerprint.
    assert!(cache
        .get_cached_search(&tenant, scope, "docker", &tags, &kinds, 10)
        .await
        .unwrap()
        .is_none());

    cache.invalidate_scope_cache(&tenant, scope).await.unwrap();
    assert!(cache
        .get_cached_search(&tenant, scope, "docker", &tags, &kinds, 5)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore = "requires live redis (docker-compose up redis)"]
async fn counters_accumulate_per_tenant() {
    let cache = cache().await;
    let tenant = unique_tenant("stats");

    cache.record_write(&tenant).await.unwrap();
    cache.record_write(&tenant).await.unwrap();
    cache.record_search(&tenant).await.unwrap();
    cache.record_dedupe_hit(&tenant).await.unwrap();

    let stats = cache.get_stats(&tenant).await.unwrap();
    assert_eq!(stats.writes, 2);
    assert_eq!(stats.searches, 1);
    assert_eq!(stats.dedupes, 1);
}
