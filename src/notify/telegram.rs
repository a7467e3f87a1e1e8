// src/notify/telegram.rs
//! Telegram Bot API publisher (`sendMessage` / `sendPhoto`).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::format::MAX_CAPTION_CHARS;
use super::{OutboundMessage, Publisher};
use crate::ingest::truncate_chars;

pub const DELIVERY_TIMEOUT_SECS: u64 = 30;

/// Outcome of a failed Bot API call, split by whether Telegram may have
/// applied it.
#[derive(Debug, Error)]
enum BotApiError {
    /// Telegram answered `ok: false`; nothing was posted.
    #[error("telegram {method} rejected ({code}): {description}")]
    Rejected {
        method: &'static str,
        code: String,
        description: String,
    },
    /// The connection was never established.
    #[error("telegram {method} unreachable: {reason}")]
    Unreachable { method: &'static str, reason: String },
    /// Timeout or broken response; the message may already be posted.
    #[error("telegram {method} failed: {reason}")]
    Transport { method: &'static str, reason: String },
}

impl BotApiError {
    fn nothing_posted(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Unreachable { .. })
    }

    // reqwest errors embed the URL, which embeds the token
    fn from_reqwest(method: &'static str, e: reqwest::Error) -> Self {
        let unreachable = e.is_connect();
        let reason = e.without_url().to_string();
        if unreachable {
            Self::Unreachable { method, reason }
        } else {
            Self::Transport { method, reason }
        }
    }
}

#[derive(Clone)]
pub struct TelegramPublisher {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramPublisher {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_base, token, Duration::from_secs(DELIVERY_TIMEOUT_SECS))
    }

    fn with_timeout(
        api_base: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("building telegram http client")?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: Serialize + ?Sized>(
        &self,
        method: &'static str,
        payload: &T,
    ) -> Result<(), BotApiError> {
        let resp = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|e| BotApiError::from_reqwest(method, e))?;

        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| BotApiError::from_reqwest(method, e))?;
        body.into_result(method)
    }

    async fn send_text(&self, msg: &OutboundMessage) -> Result<(), BotApiError> {
        let payload = SendMessage {
            chat_id: &msg.target.channel,
            message_thread_id: msg.target.thread_id,
            text: &msg.text,
            parse_mode: "Markdown",
            disable_web_page_preview: false,
        };
        self.call("sendMessage", &payload).await
    }

    async fn send_photo(&self, msg: &OutboundMessage, photo: &str) -> Result<(), BotApiError> {
        let caption = truncate_chars(&msg.text, MAX_CAPTION_CHARS);
        let payload = SendPhoto {
            chat_id: &msg.target.channel,
            message_thread_id: msg.target.thread_id,
            photo,
            caption: &caption,
            parse_mode: "Markdown",
        };
        self.call("sendPhoto", &payload).await
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn publish(&self, msg: &OutboundMessage) -> Result<()> {
        let Some(photo) = msg.image_url.as_deref() else {
            return self.send_text(msg).await.map_err(Into::into);
        };
        match self.send_photo(msg, photo).await {
            Ok(()) => Ok(()),
            Err(e) if e.nothing_posted() => {
                // Broken or hotlink-protected images are common; the text still matters.
                warn!(error = %e, photo, "sendPhoto failed, retrying as text");
                self.send_text(msg).await.map_err(Into::into)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

impl ApiResponse {
    fn into_result(self, method: &'static str) -> Result<(), BotApiError> {
        if self.ok {
            return Ok(());
        }
        Err(BotApiError::Rejected {
            method,
            code: self
                .error_code
                .map_or_else(|| "?".to_string(), |c| c.to_string()),
            description: self
                .description
                .unwrap_or_else(|| "no description".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{DeliveryMode, DeliveryTarget};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn payload_omits_absent_thread() {
        let p = SendMessage {
            chat_id: "@idx_news",
            message_thread_id: None,
            text: "hi",
            parse_mode: "Markdown",
            disable_web_page_preview: false,
        };
        let v = serde_json::to_value(&p).unwrap();
        assert!(v.get("message_thread_id").is_none());
        assert_eq!(v["chat_id"], "@idx_news");

        let msg = OutboundMessage::new(
            "x".into(),
            None,
            DeliveryTarget::new("-100", Some(12)),
            DeliveryMode::TextOnly,
        );
        let p = SendMessage {
            chat_id: &msg.target.channel,
            message_thread_id: msg.target.thread_id,
            text: &msg.text,
            parse_mode: "Markdown",
            disable_web_page_preview: false,
        };
        assert_eq!(serde_json::to_value(&p).unwrap()["message_thread_id"], 12);
    }

    #[test]
    fn api_error_surfaces_description() {
        let r: ApiResponse = serde_json::from_str(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#,
        )
        .unwrap();
        let err = r.into_result("sendMessage").unwrap_err();
        assert!(err.nothing_posted());
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("can't parse entities"));

        let ok: ApiResponse = serde_json::from_str(r#"{"ok":true,"result":{}}"#).unwrap();
        assert!(ok.into_result("sendMessage").is_ok());
    }

    #[test]
    fn method_url_trims_trailing_slash() {
        let p = TelegramPublisher::new("https://api.telegram.org/", "123:abc").unwrap();
        assert_eq!(
            p.method_url("sendPhoto"),
            "https://api.telegram.org/bot123:abc/sendPhoto"
        );
    }

    // ---- local Bot API stand-in ----

    #[derive(Clone, Copy)]
    enum Reply {
        Json(&'static str),
        Stall,
    }

    type Seen = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

    /// Serves one canned reply per Bot API method; records (method, body).
    async fn bot_api(routes: Vec<(&'static str, Reply)>) -> (String, Seen) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen: Seen = Arc::default();
        let log = seen.clone();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let (path, body) = read_request(&mut sock).await;
                    let method = path.rsplit('/').next().unwrap_or_default().to_string();
                    let json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
                    log.lock().unwrap().push((method.clone(), json));
                    let reply = routes
                        .iter()
                        .find(|(m, _)| *m == method)
                        .map(|(_, r)| *r)
                        .unwrap_or(Reply::Json(r#"{"ok":false,"error_code":404,"description":"Not Found"}"#));
                    match reply {
                        Reply::Json(json) => {
                            let resp = format!(
                                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                                json.len(),
                                json
                            );
                            let _ = sock.write_all(resp.as_bytes()).await;
                        }
                        Reply::Stall => tokio::time::sleep(Duration::from_secs(5)).await,
                    }
                });
            }
        });
        (format!("http://{addr}"), seen)
    }

    async fn read_request(sock: &mut TcpStream) -> (String, String) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return (String::new(), String::new());
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let len = head
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < end + 4 + len {
                let n = sock.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let path = head.split_whitespace().nth(1).unwrap_or_default().to_string();
            let body = String::from_utf8_lossy(&buf[end + 4..]).to_string();
            return (path, body);
        }
    }

    fn photo_msg(text: &str) -> OutboundMessage {
        OutboundMessage::new(
            text.to_string(),
            Some("https://cdn.test/antm.jpg".into()),
            DeliveryTarget::new("-1001234", Some(7)),
            DeliveryMode::ImageWithCaption,
        )
    }

    fn methods(seen: &Seen) -> Vec<String> {
        seen.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    #[tokio::test]
    async fn photo_is_sent_with_caption_and_thread() {
        let (base, seen) = bot_api(vec![("sendPhoto", Reply::Json(r#"{"ok":true,"result":{}}"#))]).await;
        let p = TelegramPublisher::new(base, "123:abc").unwrap();

        p.publish(&photo_msg("📰 *Saham ANTM*")).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (method, body) = &seen[0];
        assert_eq!(method, "sendPhoto");
        assert_eq!(body["caption"], "📰 *Saham ANTM*");
        assert_eq!(body["photo"], "https://cdn.test/antm.jpg");
        assert_eq!(body["message_thread_id"], 7);
    }

    #[tokio::test]
    async fn rejected_photo_falls_back_to_text() {
        let (base, seen) = bot_api(vec![
            (
                "sendPhoto",
                Reply::Json(r#"{"ok":false,"error_code":400,"description":"Bad Request: wrong file identifier"}"#),
            ),
            ("sendMessage", Reply::Json(r#"{"ok":true,"result":{}}"#)),
        ])
        .await;
        let p = TelegramPublisher::new(base, "123:abc").unwrap();

        p.publish(&photo_msg("📰 *Saham ANTM*")).await.unwrap();
        assert_eq!(methods(&seen), ["sendPhoto", "sendMessage"]);
        assert_eq!(seen.lock().unwrap()[1].1["text"], "📰 *Saham ANTM*");
    }

    #[tokio::test]
    async fn timed_out_photo_is_not_resent_as_text() {
        let (base, seen) = bot_api(vec![
            ("sendPhoto", Reply::Stall),
            ("sendMessage", Reply::Json(r#"{"ok":true,"result":{}}"#)),
        ])
        .await;
        let p = TelegramPublisher::with_timeout(base, "123:abc", Duration::from_millis(300)).unwrap();

        let err = p.publish(&photo_msg("📰 *Saham ANTM*")).await.unwrap_err();
        assert!(err.to_string().contains("sendPhoto"));
        assert!(!err.to_string().contains("123:abc"));
        assert_eq!(methods(&seen), ["sendPhoto"]);
    }

    #[tokio::test]
    async fn text_rejection_is_a_delivery_error() {
        let (base, _seen) = bot_api(vec![(
            "sendMessage",
            Reply::Json(r#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#),
        )])
        .await;
        let p = TelegramPublisher::new(base, "123:abc").unwrap();
        let msg = OutboundMessage::new(
            "x".into(),
            None,
            DeliveryTarget::new("@c", None),
            DeliveryMode::TextOnly,
        );
        let err = p.publish(&msg).await.unwrap_err();
        assert!(err.to_string().contains("can't parse entities"));
    }
}
