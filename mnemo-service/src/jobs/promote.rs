//! Scheduled job: memory promotion
//!
//! Tags frequently referenced task outcomes with `promoted`, which biases
//! retrieval toward them and shields them from pruning.

use tracing::{error, info};

use mnemo_core::error::Result;

use crate::state::AppState;

/// Promote task outcomes referenced at least `min_references` times
///
/// Returns the ids that were promoted this run. Already promoted entries are
/// never candidates, so re-running is a no-op.
///
/// # Errors
///
/// Returns `Storage` only if the candidate query fails; per-entry failures
/// are logged and skipped.
pub async fn promote_high_value(
    state: &AppState,
    tenant_id: &str,
    min_references: i64,
    lookback_days: i32,
) -> Result<Vec<String>> {
    let candidates = state
        .pg
        .promotion_candidates(tenant_id, min_references, lookback_days)
        .await?;

    let mut promoted = Vec::new();
    for candidate in &candidates {
        match state.pg.append_tag(tenant_id, &candidate.id, "promoted").await {
            Ok(()) => {
                info!(
                    memory = %candidate.id,
                    ref_count = candidate.ref_count,
                    "promoted memory"
                );
                promoted.push(candidate.id.clone());
            }
            Err(e) => error!(memory = %candidate.id, error = %e, "failed to promote memory"),
        }
    }

    info!(
        tenant = tenant_id,
        candidates = candidates.len(),
        promoted = promoted.len(),
        "promotion job complete"
    );
    Ok(promoted)
}
