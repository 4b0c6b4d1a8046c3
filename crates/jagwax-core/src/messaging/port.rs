use async_trait::async_trait;

use crate::{
    domain::ConversationId,
    messaging::types::{ChatInfo, MediaPayload, OutboundContent},
    Result,
};

/// Outbound half of the transport.
///
/// The connection/device-linking handshake is the adapter's problem; the core
/// only sends, inspects chats, fetches media, and asks for teardown.
#[async_trait]
pub trait TransportPort: Send + Sync {
    async fn send(&self, conversation: &ConversationId, content: OutboundContent) -> Result<()>;

    async fn get_chat(&self, conversation: &ConversationId) -> Result<ChatInfo>;

    /// Fetch a media payload by the opaque ref the transport attached to a message.
    /// View-once content may become unavailable after the transport consumes it,
    /// hence `Option`.
    async fn download_media(&self, media_ref: &str) -> Result<Option<MediaPayload>>;

    /// Best-effort disconnect; must not block on acknowledgement.
    async fn shutdown(&self) -> Result<()>;
}
