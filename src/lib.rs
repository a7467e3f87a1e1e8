// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod relevance;
pub mod store;
pub mod summarize;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::error::{RelayError, RelayResult};
pub use crate::pipeline::{run, run_and_persist, RelayContext, RunReport, SourceReport};
pub use crate::store::{ContentHash, DedupStore};
