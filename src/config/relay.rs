// src/config/relay.rs
//! Run configuration: secrets from the environment, everything else from TOML.
//!
//! Lookup order for the settings file:
//! 1) $RELAY_CONFIG_PATH (must exist)
//! 2) config/relay.toml
//! 3) built-in defaults

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::defaults::*;
use crate::error::{RelayError, RelayResult};
use crate::ingest::types::FeedSource;

pub const ENV_CONFIG_PATH: &str = "RELAY_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";

pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
pub const ENV_CHANNEL_ID: &str = "CHANNEL_ID";
pub const ENV_THREAD_ID: &str = "THREAD_ID";
pub const ENV_HF_TOKEN: &str = "HF_TOKEN";

/// Externally supplied secrets and delivery target.
#[derive(Clone)]
pub struct Credentials {
    pub bot_token: String,
    pub channel_id: String,
    pub thread_id: Option<i64>,
    /// Absent => local lead-sentence summaries only.
    pub summarizer_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Safe diagnostics: never print secrets, only their presence/length
        f.debug_struct("Credentials")
            .field("bot_token_len", &self.bot_token.len())
            .field("channel_id", &self.channel_id)
            .field("thread_id", &self.thread_id)
            .field("summarizer_key", &self.summarizer_key.is_some())
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token =
            get(ENV_BOT_TOKEN).ok_or_else(|| RelayError::config("BOT_TOKEN is required"))?;
        let channel_id =
            get(ENV_CHANNEL_ID).ok_or_else(|| RelayError::config("CHANNEL_ID is required"))?;
        let thread_id = match get(ENV_THREAD_ID) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                RelayError::config(format!("THREAD_ID must be an integer, got {raw:?}"))
            })?),
            None => None,
        };

        Ok(Self {
            bot_token,
            channel_id,
            thread_id,
            summarizer_key: get(ENV_HF_TOKEN),
        })
    }
}

/// Non-secret settings (TOML). Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelaySettings {
    pub allow_all_if_no_keyword_match: bool,
    pub summary_char_budget: usize,
    pub per_source_cap: usize,
    pub keywords: Vec<String>,
    pub feeds: Vec<FeedSource>,
    pub state_path: PathBuf,
    pub pacing_ms: u64,
    pub send_images: bool,
    pub summarizer_url: String,
    pub telegram_api_base: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            allow_all_if_no_keyword_match: false,
            summary_char_budget: DEFAULT_SUMMARY_CHAR_BUDGET,
            per_source_cap: DEFAULT_PER_SOURCE_CAP,
            keywords: default_keywords(),
            feeds: default_feeds(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            pacing_ms: DEFAULT_PACING_MS,
            send_images: true,
            summarizer_url: DEFAULT_SUMMARIZER_URL.to_string(),
            telegram_api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
        }
    }
}

impl RelaySettings {
    pub fn from_toml_str(s: &str) -> RelayResult<Self> {
        let cfg: RelaySettings =
            toml::from_str(s).map_err(|e| RelayError::config(format!("invalid TOML: {e}")))?;
        cfg.normalized()
    }

    pub fn load_from(path: &Path) -> RelayResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RelayError::config(format!("reading settings from {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn load_default() -> RelayResult<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(RelayError::config(format!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                )));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Self::default().normalized()
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    fn normalized(mut self) -> RelayResult<Self> {
        self.keywords = clean_keywords(self.keywords);

        let mut names = HashSet::new();
        for feed in &mut self.feeds {
            feed.name = feed.name.trim().to_string();
            feed.endpoint = feed.endpoint.trim().to_string();
            if feed.name.is_empty() || feed.endpoint.is_empty() {
                return Err(RelayError::config("every feed needs a name and an endpoint"));
            }
            if !names.insert(feed.name.clone()) {
                return Err(RelayError::config(format!("duplicate feed name {:?}", feed.name)));
            }
        }
        Ok(self)
    }
}

/// Trim, drop empties, drop case-insensitive duplicates; first occurrence wins.
fn clean_keywords(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .collect()
}

/// Everything a run needs, validated before any network client exists.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub settings: RelaySettings,
}

impl AppConfig {
    /// Credentials first, so a missing token aborts before settings I/O.
    pub fn load() -> RelayResult<Self> {
        let credentials = Credentials::from_env()?;
        let settings = RelaySettings::load_default()?;
        Ok(Self {
            credentials,
            settings,
        })
    }
}
