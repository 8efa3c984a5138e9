//! Lifecycle jobs: summarize, promote, prune
//!
//! Each job is idempotent and safe to re-run; per-item failures are logged
//! and skipped so one bad row never aborts a batch. Jobs for distinct tenants
//! may run concurrently.

pub mod promote;
pub mod prune;
pub mod summarize;

pub use promote::promote_high_value;
pub use prune::prune_old_chat_turns;
pub use summarize::summarize_active_scopes;
