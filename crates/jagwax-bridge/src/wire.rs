//! Wire protocol between the assistant and the transport sidecar.
//!
//! Newline-delimited JSON in both directions. Event frames flow in; command
//! frames flow out. `get_chat` and `download_media` are request/response pairs
//! correlated by `request_id`.

use serde::{Deserialize, Serialize};

use jagwax_core::messaging::types::{
    ChatInfo, IncomingMessage, MediaPayload, OutboundContent, RevokedMessage,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Ready,
    Message(MessageFrame),
    MessageRevoked {
        before: Option<RevokedFrame>,
    },
    ChatInfo {
        request_id: u64,
        chat: ChatInfo,
    },
    Media {
        request_id: u64,
        media: Option<MediaPayload>,
    },
    Error {
        request_id: u64,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct MessageFrame {
    pub from: String,
    pub conversation: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub is_view_once: bool,
    #[serde(default)]
    pub has_media: bool,
    #[serde(default)]
    pub media_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevokedFrame {
    pub conversation: String,
    pub author: String,
    #[serde(default)]
    pub body: String,
}

impl From<MessageFrame> for IncomingMessage {
    fn from(f: MessageFrame) -> Self {
        Self {
            from: f.from.as_str().into(),
            conversation: f.conversation.as_str().into(),
            body: f.body,
            from_me: f.from_me,
            is_view_once: f.is_view_once,
            has_media: f.has_media,
            media_ref: f.media_ref,
        }
    }
}

impl From<RevokedFrame> for RevokedMessage {
    fn from(f: RevokedFrame) -> Self {
        Self {
            conversation: f.conversation.as_str().into(),
            author: f.author.as_str().into(),
            body: f.body,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Send {
        conversation: String,
        content: WireContent,
    },
    GetChat {
        request_id: u64,
        conversation: String,
    },
    DownloadMedia {
        request_id: u64,
        media_ref: String,
    },
    Shutdown,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireContent {
    Text {
        text: String,
    },
    Media {
        #[serde(flatten)]
        media: MediaPayload,
    },
}

impl From<OutboundContent> for WireContent {
    fn from(content: OutboundContent) -> Self {
        match content {
            OutboundContent::Text(text) => Self::Text { text },
            OutboundContent::Media(media) => Self::Media { media },
        }
    }
}
