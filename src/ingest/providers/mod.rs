// src/ingest/providers/mod.rs
pub mod http;
pub mod rss2json;
pub mod rss_xml;

use anyhow::Result;

use crate::ingest::types::Article;

/// Parse a feed body in whichever format the endpoint served.
/// rss2json answers with a JSON object; plain feeds answer with RSS XML.
pub fn parse_feed_body(body: &str) -> Result<Vec<Article>> {
    let trimmed = body.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('{') {
        rss2json::parse_items(trimmed)
    } else {
        rss_xml::parse_items(trimmed)
    }
}
