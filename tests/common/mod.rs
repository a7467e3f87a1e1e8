// tests/common/mod.rs
// In-memory fakes for the four external collaborators, plus a log capture layer.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;
use market_news_relay::extract::{ContentExtractor, PageFetcher};
use market_news_relay::ingest::types::{Article, FeedClient, FeedSource};
use market_news_relay::notify::{DeliveryMode, DeliveryTarget, OutboundMessage, Publisher};
use market_news_relay::relevance::{FilterPolicy, KeywordFilter};
use market_news_relay::summarize::Summarizer;
use market_news_relay::RelayContext;

/// Feed fixture per source name; sources not listed fail to fetch.
#[derive(Default)]
pub struct FakeFeeds {
    feeds: HashMap<String, Vec<Article>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeFeeds {
    pub fn with(mut self, source: &str, articles: Vec<Article>) -> Self {
        self.feeds.insert(source.to_string(), articles);
        self
    }
}

#[async_trait]
impl FeedClient for FakeFeeds {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<Article>> {
        self.calls.lock().unwrap().push(source.name.clone());
        self.feeds
            .get(&source.name)
            .cloned()
            .ok_or_else(|| anyhow!("rss2json status=error: Cannot download this RSS feed"))
    }
    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Pages keyed by URL; unknown URLs fail like a dead link.
#[derive(Default)]
pub struct FakePages {
    pages: HashMap<String, String>,
}

impl FakePages {
    pub fn with(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for FakePages {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("404 for {url}"))
    }
}

/// Records every successful message; fails for titles listed in `fail_titles`.
#[derive(Default)]
pub struct RecordingPublisher {
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub attempts: Mutex<usize>,
    fail_titles: HashSet<String>,
}

impl RecordingPublisher {
    pub fn failing_on(titles: &[&str]) -> Self {
        Self {
            fail_titles: titles.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, msg: &OutboundMessage) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;
        if self.fail_titles.iter().any(|t| msg.text.contains(t.as_str())) {
            return Err(anyhow!("simulated transport error: connection reset by peer"));
        }
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }
    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn keywords() -> Vec<String> {
    market_news_relay::config::defaults::default_keywords()
}

pub fn source(name: &str) -> FeedSource {
    FeedSource::new(name, format!("https://feeds.test/{}", name.to_lowercase()))
}

pub fn article(title: &str, link: &str, hint: &str) -> Article {
    Article::new(title, link).with_hint(hint)
}

pub fn ctx(
    feeds: Arc<FakeFeeds>,
    pages: FakePages,
    publisher: Arc<RecordingPublisher>,
    cap: usize,
) -> RelayContext {
    RelayContext {
        feeds,
        extractor: ContentExtractor::new(Arc::new(pages)),
        filter: KeywordFilter::new(keywords(), FilterPolicy::RejectUnmatched),
        summarizer: Summarizer::local_only(600),
        publisher,
        target: DeliveryTarget::new("@idx_market_news", None),
        mode: DeliveryMode::ImageWithCaption,
        per_source_cap: cap,
        pacing: Duration::ZERO,
    }
}

/// Collects the message of every ERROR event.
#[derive(Clone, Default)]
pub struct ErrorEvents(Arc<Mutex<Vec<String>>>);

impl ErrorEvents {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct MessageField(String);

impl Visit for MessageField {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for ErrorEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }
        let mut msg = MessageField(String::new());
        event.record(&mut msg);
        self.0.lock().unwrap().push(msg.0);
    }
}
