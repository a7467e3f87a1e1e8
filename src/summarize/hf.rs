// src/summarize/hf.rs
//! Hugging Face Inference API provider (`facebook/bart-large-cnn` by default).

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RemoteSummarizer;

pub const SUMMARIZER_TIMEOUT_SECS: u64 = 60;

pub struct HuggingFaceSummarizer {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl HuggingFaceSummarizer {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("market-news-relay/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(SUMMARIZER_TIMEOUT_SECS))
            .build()
            .context("building summarizer http client")?;
        Ok(Self {
            http,
            url: url.into(),
            api_key: api_key.into(),
        })
    }
}

#[derive(Serialize)]
struct Req<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Resp {
    Summaries(Vec<Summary>),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    summary_text: Option<String>,
}

/// Pull `summary_text` out of the first element of an inference response.
pub fn parse_response(body: &str) -> Result<String> {
    let resp: Resp = serde_json::from_str(body).context("parsing inference response")?;
    match resp {
        Resp::Summaries(list) => list
            .into_iter()
            .next()
            .and_then(|s| s.summary_text)
            .ok_or_else(|| anyhow!("inference response has no summary_text")),
        Resp::Error { error } => Err(anyhow!("inference error: {error}")),
    }
}

#[async_trait]
impl RemoteSummarizer for HuggingFaceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&Req { inputs: text })
            .send()
            .await
            .context("inference post()")?;

        let status = resp.status();
        let body = resp.text().await.context("inference .text()")?;
        if !status.is_success() {
            return Err(anyhow!("inference HTTP {status}: {}", body.chars().take(200).collect::<String>()));
        }
        parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "huggingface"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_summary_list() {
        let body = r#"[{"summary_text":"IHSG closed higher on bank shares."}]"#;
        assert_eq!(parse_response(body).unwrap(), "IHSG closed higher on bank shares.");
    }

    #[test]
    fn model_loading_error_is_an_error() {
        let body = r#"{"error":"Model facebook/bart-large-cnn is currently loading","estimated_time":20.0}"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("currently loading"));
    }

    #[test]
    fn empty_list_is_an_error() {
        assert!(parse_response("[]").is_err());
        assert!(parse_response(r#"[{"generated_text":"x"}]"#).is_err());
    }
}
