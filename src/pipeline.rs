// src/pipeline.rs
//! # Run orchestrator
//! Per article: `Fetched → DuplicateCheck → Extracted → Filtered → Summarized
//! → Formatted → Delivered`. Sources run one after another in configured
//! order, articles in feed order. A source stops once it has delivered
//! `per_source_cap` articles.
//!
//! The dedup store is owned by the run: only a successful delivery adds a
//! hash, and [`run_and_persist`] writes it back exactly once at the end.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::{RelayError, RelayResult};
use crate::extract::{ContentExtractor, HttpPageFetcher, PageFetcher};
use crate::ingest::providers::http::HttpFeedClient;
use crate::ingest::types::{Article, FeedClient, FeedSource};
use crate::notify::format::format_message_within;
use crate::notify::telegram::TelegramPublisher;
use crate::notify::{DeliveryMode, DeliveryTarget, OutboundMessage, Publisher};
use crate::relevance::{FilterPolicy, KeywordFilter};
use crate::store::{ContentHash, DedupStore};
use crate::summarize::hf::HuggingFaceSummarizer;
use crate::summarize::Summarizer;

/// One-time metrics registration (so series carry descriptions).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "relay_articles_checked_total",
            "Well-formed articles inspected."
        );
        describe_counter!(
            "relay_articles_duplicate_total",
            "Articles skipped because their hash was already delivered."
        );
        describe_counter!(
            "relay_articles_rejected_total",
            "Articles dropped by the relevance filter."
        );
        describe_counter!("relay_deliveries_total", "Successful deliveries.");
        describe_counter!("relay_delivery_errors_total", "Failed deliveries.");
        describe_counter!(
            "relay_source_errors_total",
            "Feed fetch/parse failures."
        );
        describe_counter!(
            "relay_summarizer_fallback_total",
            "Remote summaries replaced by the lead-sentence fallback."
        );
        describe_gauge!("relay_last_run_ts", "Unix ts when the relay last finished a run.");
    });
}

/// Collaborators and policies for one run. Built once, then borrowed by
/// every stage; nothing here is mutated during the run.
#[derive(Clone)]
pub struct RelayContext {
    pub feeds: Arc<dyn FeedClient>,
    pub extractor: ContentExtractor,
    pub filter: KeywordFilter,
    pub summarizer: Summarizer,
    pub publisher: Arc<dyn Publisher>,
    pub target: DeliveryTarget,
    pub mode: DeliveryMode,
    pub per_source_cap: usize,
    pub pacing: Duration,
}

impl RelayContext {
    /// Wire the production HTTP clients from a validated config.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let s = &cfg.settings;
        let c = &cfg.credentials;

        let summarizer = match &c.summarizer_key {
            Some(key) => {
                let hf = HuggingFaceSummarizer::new(s.summarizer_url.clone(), key.clone())?;
                Summarizer::with_remote(Arc::new(hf), s.summary_char_budget)
            }
            None => {
                info!("no summarizer key, using lead-sentence summaries only");
                Summarizer::local_only(s.summary_char_budget)
            }
        };
        let pages: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new()?);
        let publisher = TelegramPublisher::new(s.telegram_api_base.clone(), c.bot_token.clone())
            .context("telegram publisher")?;

        Ok(Self {
            feeds: Arc::new(HttpFeedClient::new()?),
            extractor: ContentExtractor::new(pages),
            filter: KeywordFilter::new(
                s.keywords.iter().cloned(),
                FilterPolicy::from_override(s.allow_all_if_no_keyword_match),
            ),
            summarizer,
            publisher: Arc::new(publisher),
            target: DeliveryTarget::new(c.channel_id.clone(), c.thread_id),
            mode: DeliveryMode::from_send_images(s.send_images),
            per_source_cap: s.per_source_cap,
            pacing: s.pacing(),
        })
    }
}

/// Terminal state of one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleOutcome {
    Malformed,
    Duplicate,
    Rejected,
    Delivered,
    DeliveryFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    pub checked: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub delivered: usize,
    pub failed: usize,
    pub fetch_error: Option<String>,
}

impl SourceReport {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Default::default()
        }
    }

    fn record(&mut self, outcome: ArticleOutcome) {
        if outcome == ArticleOutcome::Malformed {
            self.malformed += 1;
            return;
        }
        self.checked += 1;
        match outcome {
            ArticleOutcome::Duplicate => self.duplicates += 1,
            ArticleOutcome::Rejected => self.rejected += 1,
            ArticleOutcome::Delivered => self.delivered += 1,
            ArticleOutcome::DeliveryFailed => self.failed += 1,
            ArticleOutcome::Malformed => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn checked(&self) -> usize {
        self.sources.iter().map(|s| s.checked).sum()
    }

    pub fn delivered(&self) -> usize {
        self.sources.iter().map(|s| s.delivered).sum()
    }

    pub fn failed(&self) -> usize {
        self.sources.iter().map(|s| s.failed).sum()
    }

    pub fn source_errors(&self) -> usize {
        self.sources.iter().filter(|s| s.fetch_error.is_some()).count()
    }

    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.source == name)
    }
}

/// Process every source against `store`. Never fails: source and article
/// errors are logged and counted in the report.
pub async fn run(ctx: &RelayContext, sources: &[FeedSource], store: &mut DedupStore) -> RunReport {
    ensure_metrics_described();
    info!(target: "relay", sources = sources.len(), known = store.len(), "run started");

    let mut report = RunReport::default();
    for source in sources {
        let sr = process_source(ctx, source, store).await;
        info!(
            target: "relay",
            source = %sr.source,
            checked = sr.checked,
            delivered = sr.delivered,
            failed = sr.failed,
            duplicates = sr.duplicates,
            rejected = sr.rejected,
            "source done"
        );
        report.sources.push(sr);
    }

    info!(
        target: "relay",
        checked = report.checked(),
        delivered = report.delivered(),
        failed = report.failed(),
        source_errors = report.source_errors(),
        "run finished"
    );
    gauge!("relay_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    report
}

/// Load the store, run, and save it once. Only a failed save is an error.
pub async fn run_and_persist(
    ctx: &RelayContext,
    sources: &[FeedSource],
    state_path: &Path,
) -> RelayResult<RunReport> {
    let mut store = DedupStore::load(state_path);
    let before = store.len();

    let report = run(ctx, sources, &mut store).await;

    store.save(state_path)?;
    info!(
        target: "relay",
        path = %state_path.display(),
        items = store.len(),
        added = store.len() - before,
        "dedup store saved"
    );
    Ok(report)
}

async fn process_source(
    ctx: &RelayContext,
    source: &FeedSource,
    store: &mut DedupStore,
) -> SourceReport {
    let mut sr = SourceReport::new(&source.name);

    let articles = match ctx.feeds.fetch(source).await {
        Ok(v) => v,
        Err(e) => {
            let err = RelayError::SourceFetch {
                source_name: source.name.clone(),
                reason: format!("{e:#}"),
            };
            error!(
                target: "relay",
                source = %source.name,
                client = ctx.feeds.name(),
                error = %err,
                "source skipped"
            );
            counter!("relay_source_errors_total").increment(1);
            sr.fetch_error = Some(err.to_string());
            return sr;
        }
    };
    debug!(target: "relay", source = %source.name, items = articles.len(), "feed fetched");

    for article in &articles {
        if sr.delivered >= ctx.per_source_cap {
            debug!(target: "relay", source = %source.name, cap = ctx.per_source_cap, "cap reached");
            break;
        }
        let outcome = process_article(ctx, &source.name, article, store).await;
        sr.record(outcome);
    }
    sr
}

async fn process_article(
    ctx: &RelayContext,
    source: &str,
    article: &Article,
    store: &mut DedupStore,
) -> ArticleOutcome {
    if !article.is_well_formed() {
        debug!(target: "relay", source, "entry without title or link dropped");
        return ArticleOutcome::Malformed;
    }
    let title = article.title.trim();
    let link = article.link.trim();
    counter!("relay_articles_checked_total").increment(1);

    // 1) Dedup
    let hash = ContentHash::of(source, title, link);
    if store.contains(&hash) {
        debug!(target: "relay", source, title, "duplicate");
        counter!("relay_articles_duplicate_total").increment(1);
        return ArticleOutcome::Duplicate;
    }

    // 2) Extract (empty on failure)
    let body = ctx.extractor.extract(link).await;

    // 3) Filter
    let relevance = ctx.filter.evaluate(title, &article.summary_hint, &body);
    if !relevance.pass {
        info!(target: "relay", source, title, "rejected: no keyword match");
        counter!("relay_articles_rejected_total").increment(1);
        return ArticleOutcome::Rejected;
    }

    // 4) Summarize: body, else hint, else title
    let base_text = [body.as_str(), article.summary_hint.as_str(), title]
        .into_iter()
        .find(|t| !t.trim().is_empty())
        .unwrap_or(title);
    let summary = ctx.summarizer.summarize(base_text).await;

    // 5) Format to fit a caption when the image goes along
    let limit = ctx.mode.text_limit(article.image_url.as_deref());
    let text = format_message_within(source, title, link, &summary, &chrono::Local::now(), limit);
    let msg = OutboundMessage::new(text, article.image_url.clone(), ctx.target.clone(), ctx.mode);

    // 6) Deliver; only success records the hash
    match ctx.publisher.publish(&msg).await {
        Ok(()) => {
            store.add(hash);
            info!(
                target: "relay",
                source,
                title,
                matched = ?relevance.matched,
                image = msg.image_url.is_some(),
                publisher = ctx.publisher.name(),
                "delivered"
            );
            counter!("relay_deliveries_total").increment(1);
            if !ctx.pacing.is_zero() {
                tokio::time::sleep(ctx.pacing).await;
            }
            ArticleOutcome::Delivered
        }
        Err(e) => {
            let err = RelayError::Delivery(format!("{e:#}"));
            error!(
                target: "relay",
                source,
                title,
                publisher = ctx.publisher.name(),
                error = %err,
                "delivery failed, will retry next run"
            );
            counter!("relay_delivery_errors_total").increment(1);
            ArticleOutcome::DeliveryFailed
        }
    }
}
