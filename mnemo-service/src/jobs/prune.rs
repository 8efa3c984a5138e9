//! Scheduled job: memory pruning
//!
//! Deletes low-value chat turns past the age threshold across every scope of
//! a tenant. Entries tagged `promoted` are always preserved.

use std::collections::HashMap;

use tracing::{error, info};

use mnemo_core::error::Result;

use crate::state::AppState;

/// Prune old non-promoted chat turns for all scopes of a tenant
///
/// Returns per-scope deletion counts (scopes with nothing to delete are
/// omitted).
///
/// # Errors
///
/// Returns `Storage` only if the scope enumeration fails; per-scope failures
/// are logged and skipped.
pub async fn prune_old_chat_turns(
    state: &AppState,
    tenant_id: &str,
    older_than_days: i32,
) -> Result<HashMap<String, u64>> {
    let scopes = state.pg.tenant_scopes(tenant_id).await?;

    let mut results = HashMap::new();
    let mut total_deleted: u64 = 0;
    for scope_id in &scopes {
        match state
            .pg
            .delete_old_chat_turns(tenant_id, scope_id, older_than_days)
            .await
        {
            Ok(0) => {}
            Ok(count) => {
                results.insert(scope_id.clone(), count);
                total_deleted += count;
            }
            Err(e) => error!(scope = %scope_id, error = %e, "failed to prune chat turns"),
        }
    }

    info!(
        tenant = tenant_id,
        scopes = scopes.len(),
        total_deleted,
        "prune job complete"
    );
    Ok(results)
}
