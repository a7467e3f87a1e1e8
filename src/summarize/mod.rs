// src/summarize/mod.rs
//! Two-tier summarizer: a remote compression service when configured, a
//! deterministic lead-sentence summary otherwise (or when the remote fails).
//! Output is always bounded by the character budget.

pub mod hf;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, warn};

use crate::error::RelayError;
use crate::ingest::{collapse_ws, truncate_chars};

/// Only this much of the source text is sent to the remote tier.
pub const REMOTE_INPUT_CHARS: usize = 2_000;
/// Lead-sentence summaries stop after this many sentences.
pub const MAX_LEAD_SENTENCES: usize = 3;

/// Remote compression service seam.
#[async_trait]
pub trait RemoteSummarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

#[derive(Clone)]
pub struct Summarizer {
    remote: Option<Arc<dyn RemoteSummarizer>>,
    budget: usize,
}

impl Summarizer {
    pub fn local_only(budget: usize) -> Self {
        Self {
            remote: None,
            budget,
        }
    }

    pub fn with_remote(remote: Arc<dyn RemoteSummarizer>, budget: usize) -> Self {
        Self {
            remote: Some(remote),
            budget,
        }
    }

    /// Never fails. Any remote-tier problem falls through to [`lead_summary`].
    pub async fn summarize(&self, text: &str) -> String {
        if let Some(remote) = &self.remote {
            let input = truncate_chars(text, REMOTE_INPUT_CHARS);
            match remote.summarize(&input).await {
                Ok(raw) => {
                    let out = truncate_chars(&collapse_ws(&raw), self.budget);
                    if !out.is_empty() {
                        debug!(provider = remote.name(), chars = out.chars().count(), "remote summary");
                        return out;
                    }
                    warn!(provider = remote.name(), "remote summary empty, using lead sentences");
                }
                Err(e) => {
                    let err = RelayError::Summarization(format!("{e:#}"));
                    warn!(provider = remote.name(), error = %err, "summarization fallback");
                }
            }
            counter!("relay_summarizer_fallback_total").increment(1);
        }
        lead_summary(text, self.budget)
    }
}

/// Split on terminal punctuation (`.`, `!`, `?`) followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut prev: Option<char> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            out.push(&text[start..i]);
            start = i;
        }
        prev = Some(c);
    }
    out.push(&text[start..]);

    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Up to [`MAX_LEAD_SENTENCES`] leading sentences whose space-joined length
/// fits `budget`; if not even the first fits, the first `budget` chars of
/// `text` verbatim.
pub fn lead_summary(text: &str, budget: usize) -> String {
    let mut picked: Vec<&str> = Vec::new();
    let mut total = 0usize;

    for s in split_sentences(text) {
        let sep = usize::from(!picked.is_empty());
        let len = s.chars().count();
        if picked.len() >= MAX_LEAD_SENTENCES || total + sep + len > budget {
            break;
        }
        picked.push(s);
        total += sep + len;
    }

    if picked.is_empty() {
        truncate_chars(text, budget)
    } else {
        picked.join(" ")
    }
}
