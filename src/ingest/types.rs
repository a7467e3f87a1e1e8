// src/ingest/types.rs
use anyhow::Result;
use serde::Deserialize;

/// One configured feed. Order of sources in config is the processing order.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,     // e.g., "Kontan", "CNBC"
    pub endpoint: String, // rss2json bridge URL or raw RSS URL
}

impl FeedSource {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// A feed entry as handed over by a [`FeedClient`].
///
/// `title` and `link` may still be empty here; the orchestrator drops such
/// entries before they reach dedup (see [`Article::is_well_formed`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub summary_hint: String, // cleaned description, may be empty
    pub image_url: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.summary_hint = hint.into();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() && !self.link.trim().is_empty()
    }
}

/// Feed retrieval seam. Errors are source-scoped: the orchestrator logs them
/// and moves on to the next source.
#[async_trait::async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<Article>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_requires_title_and_link() {
        assert!(Article::new("Saham naik", "https://x.test/a").is_well_formed());
        assert!(!Article::new("  ", "https://x.test/a").is_well_formed());
        assert!(!Article::new("Saham naik", "").is_well_formed());
    }
}
