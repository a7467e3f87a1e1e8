// src/ingest/providers/rss_xml.rs
//! Plain RSS 2.0 feeds, for endpoints configured without the rss2json bridge.

use anyhow::{Context, Result};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::Article;
use crate::ingest::{clean_hint, first_img_src, pick_image};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    enclosure: Option<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
}

impl Enclosure {
    fn image_url(&self) -> Option<&str> {
        let is_image = self
            .mime
            .as_deref()
            .map_or(true, |m| m.starts_with("image/"));
        if is_image {
            self.url.as_deref()
        } else {
            None
        }
    }
}

pub fn parse_items(xml: &str) -> Result<Vec<Article>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

    let out = rss
        .channel
        .item
        .into_iter()
        .map(|it| {
            let description = it.description.unwrap_or_default();
            let image_url = pick_image([
                it.enclosure.as_ref().and_then(Enclosure::image_url),
                first_img_src(&description).as_deref(),
            ]);
            Article {
                title: clean_hint(it.title.as_deref().unwrap_or_default()),
                link: it.link.unwrap_or_default().trim().to_string(),
                summary_hint: clean_hint(&description),
                image_url,
            }
        })
        .collect();
    Ok(out)
}

// XML only knows five named entities; feeds routinely leak HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
