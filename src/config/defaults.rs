// src/config/defaults.rs
//! Built-in deployment: Indonesian market desks through the rss2json bridge.

use crate::ingest::types::FeedSource;

pub const RSS2JSON_BASE: &str = "https://api.rss2json.com/v1/api.json?rss_url=";

pub const DEFAULT_SUMMARY_CHAR_BUDGET: usize = 600;
pub const DEFAULT_PER_SOURCE_CAP: usize = 3;
pub const DEFAULT_PACING_MS: u64 = 1_500;
pub const DEFAULT_STATE_PATH: &str = "sent_db.json";
pub const DEFAULT_SUMMARIZER_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "IHSG", "BEI", "IDX", "rupiah", "inflasi", "BI rate", "suku bunga", "obligasi", "SUN",
    "BBCA", "BBRI", "BMRI", "BBNI", "ASII", "TLKM", "ANTM", "INCO", "MDKA", "ADRO", "PGAS",
    "PTBA", "BRIS", "AMMN", "GOTO", "ARTO", "UNVR", "ICBP", "INDF", "KLBF", "CPIN", "SMGR",
    "INTP", "ASSA", "BUKA", "SIDO", "HEAL", "MTEL", "MEDC", "IPO", "dividen", "buyback",
    "emiten", "right issue", "pasar modal", "saham",
];

const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("CNBC", "https://www.cnbcindonesia.com/market/rss"),
    ("Kontan", "https://www.kontan.co.id/rss"),
    ("Bisnis", "https://www.bisnis.com/rss"),
    ("IDNFinancials", "https://www.idnfinancials.com/rss/news"),
    (
        "IDX",
        "https://www.idx.co.id/umbraco/Surface/RssFeed/GetRssFeed?feedName=News",
    ),
];

pub fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

pub fn default_feeds() -> Vec<FeedSource> {
    DEFAULT_FEEDS
        .iter()
        .map(|(name, rss)| FeedSource::new(*name, format!("{RSS2JSON_BASE}{rss}")))
        .collect()
}
