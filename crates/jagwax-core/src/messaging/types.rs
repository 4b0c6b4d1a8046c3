use serde::{Deserialize, Serialize};

use crate::domain::{ConversationId, Identity};

/// Events the transport emits at us.
///
/// Transport-specific fields (device ids, raw payload envelopes) stay in the
/// adapter; this is the shape the dispatcher consumes.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// Fired once when the transport connection is up; starts the session window.
    Ready,
    Message(IncomingMessage),
    /// Revoke-for-everyone. `before` is the original message if the transport
    /// still had it resident at signal time.
    MessageRevoked { before: Option<RevokedMessage> },
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub from: Identity,
    pub conversation: ConversationId,
    pub body: String,
    /// True when the operator sent this message from their own account.
    pub from_me: bool,
    pub is_view_once: bool,
    pub has_media: bool,
    /// Opaque handle for `TransportPort::download_media`.
    pub media_ref: Option<String>,
}

/// The original message carried by a revoke-for-everyone event.
#[derive(Clone, Debug)]
pub struct RevokedMessage {
    pub conversation: ConversationId,
    pub author: Identity,
    pub body: String,
}

/// Conversation handle as reported by the transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatInfo {
    pub id: ConversationId,
    pub name: String,
    pub is_group: bool,
    #[serde(default)]
    pub participants: Vec<Identity>,
}

/// Media payload sent or archived byte-for-byte; never re-encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    pub mime_type: String,
    #[serde(with = "crate::messaging::types::base64_bytes")]
    pub payload: Vec<u8>,
    pub file_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundContent {
    Text(String),
    Media(MediaPayload),
}

/// Base64 (standard alphabet) encoding for binary blobs inside JSON documents.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_payload_base64_round_trips_bytes_exactly() {
        let media = MediaPayload {
            mime_type: "image/jpeg".to_string(),
            payload: vec![0x00, 0xff, 0x7f, 0x80, 0x01],
            file_name: Some("viewonce".to_string()),
        };

        let json = serde_json::to_string(&media).unwrap();
        assert!(json.contains("AP9/gAE=")); // payload stays opaque, only transcoded
        let back: MediaPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, media);
    }
}
