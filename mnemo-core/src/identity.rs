//! Deterministic identity derivation and content normalization
//!
//! Every durable id in the system is derived from a sha256 hash: scope ids
//! from the tenant plus the four scope dimensions, memory ids from the content
//! hash, attachment ids from the blob bytes. Dedup thereby reduces to a
//! uniqueness constraint in the store.
//!
//! Normalization (trim + collapse whitespace runs) is applied to the hash
//! input *and* to the persisted content by the same function; storing raw
//! content while hashing normalized content (or vice versa) would break dedup.

use sha2::{Digest, Sha256};

use crate::types::{MemoryKind, ScopeKey};

/// Hex-char prefix length carried by derived ids
const ID_HASH_PREFIX: usize = 24;

/// Hex-char length of a search-cache fingerprint
const FINGERPRINT_LEN: usize = 16;

/// Lowercase hex sha256 of arbitrary bytes
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    use std::fmt::Write as _;

    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Trim outer whitespace and collapse any run of whitespace to a single space
#[must_use]
pub fn normalize_content(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content hash over `kind | title | normalized content`, lowercase hex
#[must_use]
pub fn content_hash(kind: MemoryKind, title: Option<&str>, content: &str) -> String {
    let normalized = normalize_content(content);
    sha256_hex(format!("{}|{}|{normalized}", kind.as_str(), title.unwrap_or("")).as_bytes())
}

/// Derived scope id: `sc_` + first 24 hex chars of the scope-key hash
///
/// Absent dimensions contribute the literal string `None`, so the empty scope
/// hashes deterministically too.
#[must_use]
pub fn scope_id(tenant_id: &str, scope: &ScopeKey) -> String {
    let key = format!(
        "{tenant_id}|{}|{}|{}|{}",
        scope.channel_id.as_deref().unwrap_or("None"),
        scope.conversation_id.as_deref().unwrap_or("None"),
        scope.project_id.as_deref().unwrap_or("None"),
        scope.task_id.as_deref().unwrap_or("None"),
    );
    format!("sc_{}", &sha256_hex(key.as_bytes())[..ID_HASH_PREFIX])
}

/// Derived memory id: `mem_` + first 24 hex chars of the content hash
#[must_use]
pub fn memory_id(content_hash: &str) -> String {
    format!("mem_{}", &content_hash[..ID_HASH_PREFIX.min(content_hash.len())])
}

/// Derived attachment id: `att_` + first 24 hex chars of sha256(bytes)
#[must_use]
pub fn attachment_id(data: &[u8]) -> String {
    format!("att_{}", &sha256_hex(data)[..ID_HASH_PREFIX])
}

/// Search-cache fingerprint over `query | sorted(tags) | sorted(kinds) | top_k`
#[must_use]
pub fn search_fingerprint(query: &str, tags: &[String], kinds: &[String], top_k: i64) -> String {
    let mut tags = tags.to_vec();
    tags.sort();
    let mut kinds = kinds.to_vec();
    kinds.sort();
    let raw = format!("{query}|{}|{}|{top_k}", tags.join("|"), kinds.join("|"));
    sha256_hex(raw.as_bytes())[..FINGERPRINT_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_collapses_whitespace_runs() {
        assert_eq!(
            normalize_content("  hello   world \n\t again "),
            "hello world again"
        );
        assert_eq!(normalize_content(""), "");
        assert_eq!(normalize_content(" \n "), "");
    }

    #[test]
    fn content_hash_matches_known_vector() {
        let hash = content_hash(
            MemoryKind::TaskOutcome,
            Some("docker push fix"),
            "Resolved push stall by increasing client timeout.",
        );
        assert_eq!(
            hash,
            "ebe0a6ff8473627a7efdedd9cd1850e9691fa93cf459d933516d758b4b6917b6"
        );
        assert_eq!(memory_id(&hash), "mem_ebe0a6ff8473627a7efdedd9");
    }

    #[test]
    fn content_hash_is_normalization_insensitive() {
        let a = content_hash(MemoryKind::Decision, None, "use   pgvector\n");
        let b = content_hash(MemoryKind::Decision, None, "use pgvector");
        assert_eq!(a, b);
    }

    #[test]
    fn missing_title_hashes_as_empty() {
        let a = content_hash(MemoryKind::ChatTurn, None, "hello");
        let b = content_hash(MemoryKind::ChatTurn, Some(""), "hello");
        assert_eq!(a, b);
    }

    #[test]
    fn scope_id_matches_known_vector() {
        let scope = ScopeKey::channel("c1");
        assert_eq!(scope_id("t1", &scope), "sc_08d8fe705bdbbdd7c74ebddd");
        assert_eq!(scope_id("t2", &scope), "sc_b811dc209fd9e3d2f93d90b3");
    }

    #[test]
    fn fingerprint_matches_known_vector() {
        let fp = search_fingerprint(
            "playwright",
            &["infra".into(), "docker".into()],
            &["task_outcome".into()],
            5,
        );
        assert_eq!(fp, "1ee36e7eb2ba3ba4");
    }

    #[test]
    fn fingerprint_ignores_filter_order() {
        let a = search_fingerprint("q", &["a".into(), "b".into()], &[], 10);
        let b = search_fingerprint("q", &["b".into(), "a".into()], &[], 10);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn scope_id_is_a_pure_function(
            tenant in "[a-z0-9-]{1,16}",
            channel in proptest::option::of("[a-z0-9-]{1,16}"),
            conversation in proptest::option::of("[a-z0-9-]{1,16}"),
        ) {
            let scope = ScopeKey {
                channel_id: channel,
                conversation_id: conversation,
                ..ScopeKey::default()
            };
            let first = scope_id(&tenant, &scope);
            let second = scope_id(&tenant, &scope);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.starts_with("sc_"));
            prop_assert_eq!(first.len(), 3 + 24);
        }

        #[test]
        fn distinct_tenants_get_distinct_scope_ids(
            tenant in "[a-z0-9]{1,12}",
            other in "[a-z0-9]{1,12}",
        ) {
            prop_assume!(tenant != other);
            let scope = ScopeKey::default();
            prop_assert_ne!(scope_id(&tenant, &scope), scope_id(&other, &scope));
        }
    }
}
