// src/extract.rs
//! Article body extraction: fetch the page, drop non-content markup, keep
//! the paragraph text. Failures never reach the caller; they become an
//! empty body.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::error::RelayError;
use crate::ingest::{collapse_ws, truncate_chars};

pub const MAX_BODY_CHARS: usize = 8_000;
pub const MIN_BLOCK_CHARS: usize = 40;
pub const PAGE_TIMEOUT_SECS: u64 = 20;

const EXCLUDED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside", "noscript"];

/// Raw page retrieval seam.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (NewsBot)")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
            .build()
            .context("building page http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let html = self
            .client
            .get(url)
            .send()
            .await
            .context("page get()")?
            .error_for_status()
            .context("page non-2xx")?
            .text()
            .await
            .context("page .text()")?;
        Ok(html)
    }
}

#[derive(Clone)]
pub struct ContentExtractor {
    fetcher: Arc<dyn PageFetcher>,
}

impl ContentExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Plain text of the article at `url`, or "" on any failure.
    pub async fn extract(&self, url: &str) -> String {
        match self.fetcher.fetch_html(url).await {
            Ok(html) => extract_text_from_html(&html),
            Err(e) => {
                let err = RelayError::Extraction {
                    url: url.to_string(),
                    reason: format!("{e:#}"),
                };
                warn!(error = %err, "extraction failed, using empty body");
                String::new()
            }
        }
    }
}

/// Paragraph text longer than [`MIN_BLOCK_CHARS`], outside boilerplate
/// containers, joined by spaces and clamped to [`MAX_BODY_CHARS`].
pub fn extract_text_from_html(html: &str) -> String {
    let doc = Html::parse_document(html);
    let p_sel = Selector::parse("p").expect("p selector");

    let blocks: Vec<String> = doc
        .select(&p_sel)
        .filter(|p| !inside_excluded(p))
        .map(|p| collapse_ws(&visible_text(&p)))
        .filter(|t| t.chars().count() > MIN_BLOCK_CHARS)
        .collect();

    truncate_chars(&blocks.join(" "), MAX_BODY_CHARS)
}

fn is_excluded(el: ElementRef<'_>) -> bool {
    EXCLUDED_TAGS.contains(&el.value().name())
}

fn inside_excluded(p: &ElementRef<'_>) -> bool {
    p.ancestors().filter_map(ElementRef::wrap).any(is_excluded)
}

// Text nodes of `p`, minus anything nested in an excluded element.
fn visible_text(p: &ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for node in p.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if node.ancestors().filter_map(ElementRef::wrap).any(is_excluded) {
            continue;
        }
        parts.push(&**text);
    }
    parts.join(" ")
}
