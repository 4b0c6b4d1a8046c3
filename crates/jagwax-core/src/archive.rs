//! Durable archive for ephemeral content the transport would otherwise discard.
//!
//! Two keyed collections, one JSON document each on disk:
//! `deleted.json`  -> map<conversation id, ordered list of ArchivedMessage>
//! `viewonce.json` -> map<conversation id, ordered list of ArchivedMedia>
//!
//! Writes go through temp-file + rename so a crash never leaves a torn
//! document behind, and each collection is guarded by one async mutex held
//! across the whole read-modify-write-persist. That serializes same-key
//! appends (the lost-update hazard) and keeps append order = detection order.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    domain::{ConversationId, Identity},
    errors::Error,
    messaging::types::MediaPayload,
    Result,
};

/// A message its sender deleted after delivery. Append-only once archived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedMessage {
    pub body: String,
    pub author: Identity,
    pub captured_at: DateTime<Utc>,
}

/// A view-once attachment captured before the transport consumed it.
/// Payload is stored byte-for-byte; never re-encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedMedia {
    pub mime_type: String,
    #[serde(with = "crate::messaging::types::base64_bytes")]
    pub payload: Vec<u8>,
    pub file_name: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl ArchivedMedia {
    /// Resend shape. Nameless media gets the default the original bot used.
    pub fn to_payload(&self) -> MediaPayload {
        MediaPayload {
            mime_type: self.mime_type.clone(),
            payload: self.payload.clone(),
            file_name: Some(
                self.file_name
                    .clone()
                    .unwrap_or_else(|| "viewonce".to_string()),
            ),
        }
    }
}

pub struct ArchiveStore {
    deleted: Mutex<Collection<ArchivedMessage>>,
    viewonce: Mutex<Collection<ArchivedMedia>>,
}

impl ArchiveStore {
    /// Open (or create) the archive under `dir`.
    pub async fn open(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::Storage(format!("create {}: {e}", dir.display())))?;

        Ok(Self {
            deleted: Mutex::new(Collection::load(dir.join("deleted.json")).await?),
            viewonce: Mutex::new(Collection::load(dir.join("viewonce.json")).await?),
        })
    }

    /// Append a deleted message to the conversation's list. Capture time is
    /// assigned here and clamped so it never decreases within a conversation.
    pub async fn record_deleted_message(
        &self,
        conversation: &ConversationId,
        author: Identity,
        body: String,
    ) -> Result<()> {
        let mut col = self.deleted.lock().await;
        let captured_at = clamp_capture_time(col.last(conversation).map(|m| m.captured_at));
        col.append(
            conversation,
            ArchivedMessage {
                body,
                author,
                captured_at,
            },
        )
        .await
    }

    pub async fn record_view_once_media(
        &self,
        conversation: &ConversationId,
        media: MediaPayload,
    ) -> Result<()> {
        let mut col = self.viewonce.lock().await;
        let captured_at = clamp_capture_time(col.last(conversation).map(|m| m.captured_at));
        col.append(
            conversation,
            ArchivedMedia {
                mime_type: media.mime_type,
                payload: media.payload,
                file_name: media.file_name,
                captured_at,
            },
        )
        .await
    }

    /// Insertion-ordered, possibly empty. Non-destructive.
    pub async fn list_deleted_messages(
        &self,
        conversation: &ConversationId,
    ) -> Vec<ArchivedMessage> {
        self.deleted.lock().await.list(conversation)
    }

    pub async fn list_view_once_media(&self, conversation: &ConversationId) -> Vec<ArchivedMedia> {
        self.viewonce.lock().await.list(conversation)
    }
}

fn clamp_capture_time(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match last {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}

/// One keyed collection backed by a single JSON document.
struct Collection<T> {
    path: PathBuf,
    entries: HashMap<String, Vec<T>>,
}

impl<T: Clone + Serialize + DeserializeOwned> Collection<T> {
    async fn load(path: PathBuf) -> Result<Self> {
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| Error::Storage(format!("parse {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(Error::Storage(format!("read {}: {e}", path.display())));
            }
        };

        Ok(Self { path, entries })
    }

    fn last(&self, key: &ConversationId) -> Option<&T> {
        self.entries.get(key.as_str()).and_then(|v| v.last())
    }

    fn list(&self, key: &ConversationId) -> Vec<T> {
        self.entries.get(key.as_str()).cloned().unwrap_or_default()
    }

    /// Push + persist. The caller holds the collection mutex, so the on-disk
    /// document always reflects a fully applied append. A failed persist rolls
    /// the push back: readers never observe an entry that did not reach disk.
    async fn append(&mut self, key: &ConversationId, item: T) -> Result<()> {
        self.entries
            .entry(key.as_str().to_string())
            .or_default()
            .push(item);

        if let Err(e) = self.persist().await {
            if let Some(list) = self.entries.get_mut(key.as_str()) {
                list.pop();
                if list.is_empty() {
                    self.entries.remove(key.as_str());
                }
            }
            return Err(e);
        }
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.entries)
            .map_err(|e| Error::Storage(format!("encode {}: {e}", self.path.display())))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| Error::Storage(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Storage(format!("rename {}: {e}", self.path.display())))?;

        Ok(())
    }
}
