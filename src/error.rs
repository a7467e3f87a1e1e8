// src/error.rs
//! Error taxonomy for a relay run.
//!
//! Only `Configuration` (and a failed end-of-run `State` write) ever leaves the
//! orchestrator. Every other variant is caught where it happens, logged with
//! source/title context and turned into a skip or a fallback.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Required credential/target missing or config file unusable. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Feed unreachable or unparsable. The source yields zero articles.
    #[error("feed fetch failed for {source_name}: {reason}")]
    SourceFetch { source_name: String, reason: String },

    /// Article body could not be fetched. Treated as an empty body.
    #[error("content extraction failed for {url}: {reason}")]
    Extraction { url: String, reason: String },

    /// Remote summarizer failed. Falls through to the local tier.
    #[error("remote summarization failed: {0}")]
    Summarization(String),

    /// Delivery failed. The article hash is withheld from the store.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Persisted dedup state could not be read or written.
    #[error("state file {path}: {reason}")]
    State { path: String, reason: String },
}

impl RelayError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::State { .. })
    }
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;
