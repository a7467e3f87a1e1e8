// src/telemetry.rs
//! Logging + metrics setup for the binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "RELAY_LOG_FORMAT";
pub const ENV_METRICS_TEXTFILE: &str = "RELAY_METRICS_TEXTFILE";
const DEFAULT_FILTER: &str = "market_news_relay=info,relay=info,warn";

/// Compact text logs by default; `RELAY_LOG_FORMAT=json` for JSON lines.
/// `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

/// Prometheus exposition written to a file at run end (textfile-collector style).
pub struct MetricsTextfile {
    handle: PrometheusHandle,
    path: PathBuf,
}

impl MetricsTextfile {
    /// Installs the global recorder only when `RELAY_METRICS_TEXTFILE` is set.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(path) = std::env::var_os(ENV_METRICS_TEXTFILE) else {
            return Ok(None);
        };
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Some(Self {
            handle,
            path: PathBuf::from(path),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn write(&self) -> Result<()> {
        crate::store::write_atomic(&self.path, self.render().as_bytes())
            .with_context(|| format!("writing metrics to {}", self.path.display()))
    }
}
