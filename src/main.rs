// src/main.rs
//! market-news-relay: one run-to-completion pass.
//! Loads delivery history, relays new relevant articles from every feed,
//! saves history, exits. Meant to be driven by cron / CI schedules.

use std::process::ExitCode;

use market_news_relay::telemetry::{init_tracing, MetricsTextfile};
use market_news_relay::{run_and_persist, AppConfig, RelayContext};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op in CI where secrets come from the environment.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Config problems abort before any network client exists.
    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "fatal: cannot start");
            return ExitCode::FAILURE;
        }
    };
    info!(
        feeds = cfg.settings.feeds.len(),
        keywords = cfg.settings.keywords.len(),
        cap = cfg.settings.per_source_cap,
        budget = cfg.settings.summary_char_budget,
        remote_summary = cfg.credentials.summarizer_key.is_some(),
        thread = ?cfg.credentials.thread_id,
        "relay starting"
    );

    let metrics = match MetricsTextfile::from_env() {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "metrics textfile disabled");
            None
        }
    };

    let ctx = match RelayContext::from_config(&cfg) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %format!("{e:#}"), "fatal: cannot build clients");
            return ExitCode::FAILURE;
        }
    };

    let outcome = run_and_persist(&ctx, &cfg.settings.feeds, &cfg.settings.state_path).await;

    if let Some(m) = &metrics {
        match m.write() {
            Ok(()) => info!(path = %m.path().display(), "metrics written"),
            Err(e) => warn!(error = %format!("{e:#}"), "metrics not written"),
        }
    }

    match outcome {
        Ok(report) => {
            info!(
                checked = report.checked(),
                delivered = report.delivered(),
                failed = report.failed(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "fatal: delivery history not saved");
            ExitCode::FAILURE
        }
    }
}
