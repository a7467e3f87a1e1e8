// src/ingest/providers/rss2json.rs
//! Payloads of the rss2json bridge (`https://api.rss2json.com/v1/api.json?rss_url=...`).

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::ingest::types::Article;
use crate::ingest::{clean_hint, first_img_src, pick_image};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    enclosure: Option<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(default)]
    link: Option<String>,
}

pub fn parse_items(body: &str) -> Result<Vec<Article>> {
    let env: Envelope = serde_json::from_str(body).context("parsing rss2json payload")?;

    if let Some(status) = env.status.as_deref() {
        if !status.eq_ignore_ascii_case("ok") {
            return Err(anyhow!(
                "rss2json status={status}: {}",
                env.message.as_deref().unwrap_or("no message")
            ));
        }
    }

    let out = env
        .items
        .into_iter()
        .map(|it| {
            let description = it.description.unwrap_or_default();
            let image_url = pick_image([
                it.thumbnail.as_deref(),
                it.enclosure.as_ref().and_then(|e| e.link.as_deref()),
                first_img_src(&description).as_deref(),
            ]);
            Article {
                title: it.title.unwrap_or_default().trim().to_string(),
                link: it.link.unwrap_or_default().trim().to_string(),
                summary_hint: clean_hint(&description),
                image_url,
            }
        })
        .collect();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_payload_maps_fields_and_image_order() {
        let body = r#"{
            "status": "ok",
            "items": [
                {"title": " IHSG menguat ", "link": "https://x.test/1 ",
                 "description": "<img src=\"https://cdn.test/d.jpg\"><p>Saham bank naik</p>",
                 "thumbnail": "", "enclosure": {"link": "https://cdn.test/e.jpg"}},
                {"title": "Rupiah", "link": "https://x.test/2"}
            ]
        }"#;
        let items = parse_items(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "IHSG menguat");
        assert_eq!(items[0].link, "https://x.test/1");
        assert_eq!(items[0].summary_hint, "Saham bank naik");
        assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.test/e.jpg"));
        assert_eq!(items[1].summary_hint, "");
        assert_eq!(items[1].image_url, None);
    }

    #[test]
    fn error_status_is_an_error() {
        let body = r#"{"status":"error","message":"Cannot download this RSS feed"}"#;
        let err = parse_items(body).unwrap_err();
        assert!(err.to_string().contains("Cannot download"));
    }

    #[test]
    fn missing_items_yields_empty() {
        assert!(parse_items(r#"{"status":"ok"}"#).unwrap().is_empty());
    }
}
