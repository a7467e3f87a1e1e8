// src/notify/mod.rs
pub mod format;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// Where a message goes: a chat/channel and optionally a forum thread in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub channel: String,
    pub thread_id: Option<i64>,
}

impl DeliveryTarget {
    pub fn new(channel: impl Into<String>, thread_id: Option<i64>) -> Self {
        Self {
            channel: channel.into(),
            thread_id,
        }
    }
}

/// How articles with a leading image are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    TextOnly,
    #[default]
    ImageWithCaption,
}

impl DeliveryMode {
    pub fn from_send_images(send_images: bool) -> Self {
        if send_images {
            Self::ImageWithCaption
        } else {
            Self::TextOnly
        }
    }

    /// Char budget for the rendered text: a photo caption when the image
    /// will be attached, a full text message otherwise.
    pub fn text_limit(self, image_url: Option<&str>) -> usize {
        match (self, image_url) {
            (Self::ImageWithCaption, Some(_)) => format::MAX_CAPTION_CHARS,
            _ => format::MAX_MESSAGE_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub image_url: Option<String>,
    pub target: DeliveryTarget,
}

impl OutboundMessage {
    /// Attach `image_url` only when the mode delivers images.
    pub fn new(
        text: String,
        image_url: Option<String>,
        target: DeliveryTarget,
        mode: DeliveryMode,
    ) -> Self {
        let image_url = match mode {
            DeliveryMode::ImageWithCaption => image_url,
            DeliveryMode::TextOnly => None,
        };
        Self {
            text,
            image_url,
            target,
        }
    }
}

/// Delivery seam. `Err` means "not delivered"; the caller withholds the hash.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, msg: &OutboundMessage) -> Result<()>;
    fn name(&self) -> &'static str;
}
