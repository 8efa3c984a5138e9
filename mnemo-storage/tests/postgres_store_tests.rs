//! Integration tests for `PostgresStore` against a live database
//!
//! Requirements:
//! - PostgreSQL with the pgvector and pg_trgm extensions
//!   (docker-compose up postgres), reachable via `PG_DSN`
//!
//! All tests are `#[ignore]`d so `cargo test` stays green without
//! infrastructure; run with `cargo test -- --ignored`.

use std::sync::Arc;

use tokio::sync::OnceCell;
use uuid::Uuid;

use mnemo_core::config::Settings;
use mnemo_core::embedding::{EmbeddingProvider, StubEmbedding};
use mnemo_core::identity::{content_hash, normalize_content};
use mnemo_core::types::{LinkRelation, MemoryKind, ScopeKey};
use mnemo_storage::{NewMemory, PostgresStore, SearchFilters};

static MIGRATION_INIT: OnceCell<()> = OnceCell::const_new();

async fn store() -> PostgresStore {
    let settings = Settings::from_env();
    let store = PostgresStore::connect(&settings)
        .await
        .expect("failed to connect to postgres (is docker-compose up?)");

    MIGRATION_INIT
        .get_or_init(|| async {
            store
                .run_migrations(&settings.migrations_dir)
                .await
                .expect("failed to run migrations");
        })
        .await;

    store
}

fn unique_tenant(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn embedder() -> Arc<StubEmbedding> {
    Arc::new(StubEmbedding::new(Settings::from_env().embed_dim))
}

async fn write_entry(
    store: &PostgresStore,
    tenant: &str,
    scope: &ScopeKey,
    kind: MemoryKind,
    title: Option<&str>,
    content: &str,
    tags: &[String],
) -> mnemo_core::types::MemoryRecord {
    store.ensure_tenant(tenant).await.unwrap();
    let scope_id = store.get_or_create_scope(tenant, scope).await.unwrap();

    let normalized = normalize_content(content);
    let hash = content_hash(kind, title, content);
    let embed_input = format!("{} {normalized}", title.unwrap_or(""));
    let embedding = embedder().embed(&embed_input).await.unwrap();

    store
        .write_memory(&NewMemory {
            tenant_id: tenant,
            scope_id: &scope_id,
            kind,
            title,
            content: &normalized,
            tags,
            source: Some("gateway"),
            author_agent_id: None,
            tool_name: None,
            content_hash: &hash,
            embedding: &embedding,
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires live postgres (docker-compose up postgres)"]
async fn duplicate_write_converges_on_one_row() {
    let store = store().await;
    let tenant = unique_tenant("dedupe");
    let scope = ScopeKey::channel("c1");

    let first = write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::Decision,
        Some("use pgvector"),
        "Decided to use pgvector over a standalone vector DB.",
        &["architecture".to_string()],
    )
    .await;
    let second = write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::Decision,
        Some("use pgvector"),
        "Decided to use pgvector over a standalone vector DB.",
        &["architecture".to_string()],
    )
    .await;

    assert_eq!(first.id, second.id);
    assert!(!first.was_rewritten());
    assert!(second.was_rewritten());
}

#[tokio::test]
#[ignore = "requires live postgres (docker-compose up postgres)"]
async fn hybrid_search_finds_written_entry() {
    let store = store().await;
    let tenant = unique_tenant("search");
    let scope = ScopeKey::channel("c1");

    let written = write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::TaskOutcome,
        Some("playwright headless fix"),
        "Fixed Playwright headless Chrome by installing missing system dependencies.",
        &["playwright".to_string(), "testing".to_string()],
    )
    .await;

    let scope_id = store.get_or_create_scope(&tenant, &scope).await.unwrap();
    let query = "playwright headless Chrome dependencies";
    let query_embedding = embedder().embed(query).await.unwrap();

    let results = store
        .search_memory(
            &tenant,
            &scope_id,
            &query_embedding,
            query,
            5,
            &SearchFilters::default(),
        )
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].entry.id, written.id);
    assert!(results[0].score > 0.0);
}

#[tokio::test]
#[ignore = "requires live postgres (docker-compose up postgres)"]
async fn search_does_not_cross_scopes() {
    let store = store().await;
    let tenant = unique_tenant("scope-isolation");
    let home = ScopeKey::channel("c1");
    let other = ScopeKey::channel("c-other");

    write_entry(
        &store,
        &tenant,
        &other,
        MemoryKind::TaskOutcome,
        Some("secret project result"),
        "This should not appear in c1 searches.",
        &[],
    )
    .await;

    let home_id = store.get_or_create_scope(&tenant, &home).await.unwrap();
    let query = "secret project result";
    let query_embedding = embedder().embed(query).await.unwrap();

    let results = store
        .search_memory(
            &tenant,
            &home_id,
            &query_embedding,
            query,
            10,
            &SearchFilters::default(),
        )
        .await
        .unwrap();

    assert!(results
        .iter()
        .all(|r| r.entry.title.as_deref() != Some("secret project result")));
}

#[tokio::test]
#[ignore = "requires live postgres (docker-compose up postgres)"]
async fn tag_filter_restricts_results() {
    let store = store().await;
    let tenant = unique_tenant("tag-filter");
    let scope = ScopeKey::channel("c1");

    write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::TaskOutcome,
        Some("docker push fix"),
        "Resolved push stall by increasing client timeout.",
        &["docker".to_string(), "infra".to_string()],
    )
    .await;
    write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::TaskOutcome,
        Some("unrelated"),
        "Completely unrelated note about gardening.",
        &["hobby".to_string()],
    )
    .await;

    let scope_id = store.get_or_create_scope(&tenant, &scope).await.unwrap();
    let query_embedding = embedder().embed("docker").await.unwrap();
    let filters = SearchFilters {
        tags: Some(vec!["docker".to_string()]),
        ..SearchFilters::default()
    };

    let results = store
        .search_memory(&tenant, &scope_id, &query_embedding, "docker", 10, &filters)
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert!(results
        .iter()
        .all(|r| r.entry.tags.iter().any(|t| t == "docker")));
}

#[tokio::test]
#[ignore = "requires live postgres (docker-compose up postgres)"]
async fn link_creation_is_idempotent() {
    let store = store().await;
    let tenant = unique_tenant("links");
    let scope = ScopeKey::channel("c1");

    let finding = write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::TaskOutcome,
        Some("original finding"),
        "Discovered that the API rate limit is 100 req/min.",
        &[],
    )
    .await;
    let decision = write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::Decision,
        Some("implement rate limiter"),
        "Implementing a client-side rate limiter based on the finding.",
        &[],
    )
    .await;

    let first = store
        .create_link(&tenant, &decision.id, &finding.id, LinkRelation::DerivedFrom)
        .await
        .unwrap();
    let second = store
        .create_link(&tenant, &decision.id, &finding.id, LinkRelation::DerivedFrom)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);

    let linked_from = store.links_from(&tenant, &decision.id).await.unwrap();
    assert_eq!(linked_from.len(), 1);
    assert_eq!(linked_from[0].to_memory_id, finding.id);
    assert_eq!(linked_from[0].relation, LinkRelation::DerivedFrom);

    let linked_to = store.links_to(&tenant, &finding.id).await.unwrap();
    assert_eq!(linked_to.len(), 1);
}

#[tokio::test]
#[ignore = "requires live postgres (docker-compose up postgres)"]
async fn prune_spares_promoted_turns() {
    let store = store().await;
    let tenant = unique_tenant("prune");
    let scope = ScopeKey::channel("c1");

    let doomed = write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::ChatTurn,
        None,
        "Can you help me fix the Docker build failure?",
        &[],
    )
    .await;
    let protected = write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::ChatTurn,
        None,
        "This turn carries important context worth keeping.",
        &[],
    )
    .await;
    store
        .append_tag(&tenant, &protected.id, "promoted")
        .await
        .unwrap();

    // Threshold 0 makes every previously created row eligible.
    let scope_id = store.get_or_create_scope(&tenant, &scope).await.unwrap();
    let deleted = store
        .delete_old_chat_turns(&tenant, &scope_id, 0)
        .await
        .unwrap();

    assert_eq!(deleted, 1);
    assert!(store.get_memory(&tenant, &doomed.id).await.unwrap().is_none());
    assert!(store
        .get_memory(&tenant, &protected.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
#[ignore = "requires live postgres (docker-compose up postgres)"]
async fn promotion_candidates_require_reference_count() {
    let store = store().await;
    let tenant = unique_tenant("promotion");
    let scope = ScopeKey::channel("c1");

    let outcome = write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::TaskOutcome,
        Some("popular outcome"),
        "A result that several other entries reference.",
        &[],
    )
    .await;

    for i in 0..3 {
        let referrer = write_entry(
            &store,
            &tenant,
            &scope,
            MemoryKind::Decision,
            Some(&format!("decision {i}")),
            &format!("Decision number {i} built on the popular outcome."),
            &[],
        )
        .await;
        store
            .create_link(&tenant, &referrer.id, &outcome.id, LinkRelation::DerivedFrom)
            .await
            .unwrap();
    }

    let candidates = store.promotion_candidates(&tenant, 3, 30).await.unwrap();
    assert!(candidates.iter().any(|c| c.id == outcome.id && c.ref_count == 3));

    // Tagging removes it from the candidate set; a second append is a no-op.
    store.append_tag(&tenant, &outcome.id, "promoted").await.unwrap();
    store.append_tag(&tenant, &outcome.id, "promoted").await.unwrap();

    let candidates = store.promotion_candidates(&tenant, 3, 30).await.unwrap();
    assert!(candidates.iter().all(|c| c.id != outcome.id));

    let entry = store.get_memory(&tenant, &outcome.id).await.unwrap().unwrap();
    assert_eq!(entry.tags.iter().filter(|t| *t == "promoted").count(), 1);
}

#[tokio::test]
#[ignore = "requires live postgres (docker-compose up postgres)"]
async fn cross_tenant_reads_return_nothing() {
    let store = store().await;
    let tenant = unique_tenant("tenant-a");
    let intruder = unique_tenant("tenant-b");
    let scope = ScopeKey::channel("c1");

    let entry = write_entry(
        &store,
        &tenant,
        &scope,
        MemoryKind::Runbook,
        Some("deploy process"),
        "Step 1: Build image. Step 2: Push. Step 3: Deploy.",
        &[],
    )
    .await;

    store.ensure_tenant(&intruder).await.unwrap();
    assert!(store
        .get_memory(&intruder, &entry.id)
        .await
        .unwrap()
        .is_none());
}
