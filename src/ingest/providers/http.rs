// src/ingest/providers/http.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::parse_feed_body;
use crate::ingest::types::{Article, FeedClient, FeedSource};

pub const FEED_TIMEOUT_SECS: u64 = 30;

/// Fetches a feed over HTTP and parses rss2json JSON or RSS XML.
pub struct HttpFeedClient {
    client: reqwest::Client,
}

impl HttpFeedClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("market-news-relay/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<Article>> {
        let body = self
            .client
            .get(&source.endpoint)
            .send()
            .await
            .with_context(|| format!("{} http get()", source.name))?
            .error_for_status()
            .with_context(|| format!("{} non-2xx", source.name))?
            .text()
            .await
            .with_context(|| format!("{} http .text()", source.name))?;

        let items = parse_feed_body(&body).with_context(|| format!("{} feed body", source.name))?;
        tracing::debug!(source = %source.name, items = items.len(), "feed parsed");
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
