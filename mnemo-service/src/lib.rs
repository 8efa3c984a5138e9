//! # mnemo memory service
//!
//! Multi-tenant long-term memory for autonomous agents. Clients persist typed
//! knowledge entries scoped to hierarchical contexts and retrieve them via
//! hybrid semantic + lexical search.
//!
//! ## Architecture
//!
//! ```text
//! http (tool endpoints)
//! ├── write      normalize -> hash -> embed -> store -> cache update
//! ├── search     cache probe -> embed -> hybrid query -> cache fill
//! ├── summarize  scope entries -> summary entry + derived_from links
//! ├── jobs       summarize / promote / prune (CLI or scheduler driven)
//! ├── hooks      fire-and-report gateway write entry points
//! └── preflight  "Known Context" assembly for task bootstrap
//! ```
//!
//! The durable store (Postgres) is authoritative; the Redis working set and
//! search cache are advisory and eventually consistent within one TTL window.

pub mod hooks;
pub mod http;
pub mod jobs;
pub mod preflight;
pub mod search;
pub mod state;
pub mod summarize;
pub mod write;

pub use state::AppState;
