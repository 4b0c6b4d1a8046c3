//! In-memory transport + fixture wiring for handler tests.

use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;

use jagwax_core::{
    archive::ArchiveStore,
    config::{Config, DEFAULT_MEDIA_MAX_BYTES},
    domain::ConversationId,
    messaging::{
        port::TransportPort,
        types::{ChatInfo, IncomingMessage, MediaPayload, OutboundContent},
    },
    pairing::PairingRegistry,
    session::SessionWindow,
    Error, Result,
};

use crate::Dispatcher;

#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<(ConversationId, OutboundContent)>>,
    chats: Mutex<HashMap<String, ChatInfo>>,
    media: Mutex<HashMap<String, MediaPayload>>,
}

impl RecordingTransport {
    pub(crate) async fn sent(&self) -> Vec<(ConversationId, OutboundContent)> {
        self.sent.lock().await.clone()
    }

    pub(crate) async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|(_, c)| match c {
                OutboundContent::Text(t) => Some(t.clone()),
                OutboundContent::Media(_) => None,
            })
            .collect()
    }

    pub(crate) async fn put_chat(&self, info: ChatInfo) {
        self.chats
            .lock()
            .await
            .insert(info.id.as_str().to_string(), info);
    }

    pub(crate) async fn put_media(&self, media_ref: &str, media: MediaPayload) {
        self.media
            .lock()
            .await
            .insert(media_ref.to_string(), media);
    }
}

#[async_trait]
impl TransportPort for RecordingTransport {
    async fn send(&self, conversation: &ConversationId, content: OutboundContent) -> Result<()> {
        self.sent.lock().await.push((conversation.clone(), content));
        Ok(())
    }

    async fn get_chat(&self, conversation: &ConversationId) -> Result<ChatInfo> {
        self.chats
            .lock()
            .await
            .get(conversation.as_str())
            .cloned()
            .ok_or_else(|| Error::Transport(format!("unknown chat {conversation}")))
    }

    async fn download_media(&self, media_ref: &str) -> Result<Option<MediaPayload>> {
        Ok(self.media.lock().await.get(media_ref).cloned())
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

pub(crate) struct TestBot {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) transport: Arc<RecordingTransport>,
}

impl TestBot {
    pub(crate) async fn new(tag: &str) -> Self {
        let dir = temp_dir(tag);
        let cfg = Arc::new(Config {
            storage_dir: dir.clone(),
            session_max_duration: Duration::from_secs(7 * 24 * 60 * 60),
            media_max_bytes: DEFAULT_MEDIA_MAX_BYTES,
        });

        let archive = Arc::new(ArchiveStore::open(&dir).await.unwrap());
        let pairing = Arc::new(PairingRegistry::in_memory());
        let transport = Arc::new(RecordingTransport::default());
        let port: Arc<dyn TransportPort> = transport.clone();
        let session = SessionWindow::new(cfg.session_max_duration, port.clone());

        Self {
            dispatcher: Dispatcher::new(cfg, archive, pairing, port, session),
            transport,
        }
    }

    /// Direct-chat message: conversation id equals the sender identity.
    pub(crate) fn direct_message(&self, from: &str, body: &str) -> IncomingMessage {
        IncomingMessage {
            from: from.into(),
            conversation: from.into(),
            body: body.to_string(),
            from_me: false,
            is_view_once: false,
            has_media: false,
            media_ref: None,
        }
    }
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("jagwax-bot-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
