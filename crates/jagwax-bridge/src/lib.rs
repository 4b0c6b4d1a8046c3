//! Transport bridge over stdin/stdout.
//!
//! The actual messenger client (device linking, QR handshake, delivery) runs
//! as a sidecar process; this adapter speaks the newline-delimited JSON
//! protocol in `wire` and exposes the core `TransportPort`.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    sync::{mpsc, oneshot, Mutex},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use jagwax_core::{
    domain::ConversationId,
    messaging::{
        port::TransportPort,
        types::{ChatInfo, MediaPayload, OutboundContent, TransportEvent},
    },
    Error, Result,
};

pub mod wire;

use wire::{InboundFrame, OutboundFrame, WireContent};

enum PendingReply {
    Chat(ChatInfo),
    Media(Option<MediaPayload>),
    Failed(String),
}

pub struct Bridge<W> {
    writer: Mutex<W>,
    pending: Mutex<HashMap<u64, oneshot::Sender<PendingReply>>>,
    next_request: AtomicU64,
    cancel: CancellationToken,
}

pub type StdioBridge = Bridge<tokio::io::Stdout>;

impl StdioBridge {
    /// Wire the bridge to this process's stdin/stdout and start the reader.
    /// The returned receiver closes when the sidecar side closes stdin.
    pub fn stdio() -> (Arc<Self>, mpsc::UnboundedReceiver<TransportEvent>) {
        let bridge = Arc::new(Bridge::new(tokio::io::stdout()));
        let (tx, rx) = mpsc::unbounded_channel();

        let reader = BufReader::new(tokio::io::stdin());
        tokio::spawn(run_reader(bridge.clone(), reader, tx));

        (bridge, rx)
    }
}

impl<W: AsyncWrite + Send + Unpin + 'static> Bridge<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            pending: Mutex::new(HashMap::new()),
            next_request: AtomicU64::new(1),
            cancel: CancellationToken::new(),
        }
    }

    async fn write_frame(&self, frame: &OutboundFrame) -> Result<()> {
        let mut line = serde_json::to_vec(frame)?;
        line.push(b'\n');

        let mut w = self.writer.lock().await;
        w.write_all(&line)
            .await
            .map_err(|e| Error::Transport(format!("bridge write failed: {e}")))?;
        w.flush()
            .await
            .map_err(|e| Error::Transport(format!("bridge flush failed: {e}")))?;
        Ok(())
    }

    async fn register_request(&self) -> (u64, oneshot::Receiver<PendingReply>) {
        let request_id = self.next_request.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id, tx);
        (request_id, rx)
    }

    async fn resolve_request(&self, request_id: u64, reply: PendingReply) {
        match self.pending.lock().await.remove(&request_id) {
            Some(tx) => {
                let _ = tx.send(reply);
            }
            None => warn!("reply for unknown request {request_id}"),
        }
    }

    async fn await_reply(&self, rx: oneshot::Receiver<PendingReply>) -> Result<PendingReply> {
        match rx.await {
            Ok(PendingReply::Failed(message)) => Err(Error::Transport(message)),
            Ok(reply) => Ok(reply),
            Err(_) => Err(Error::Transport("bridge closed before reply".to_string())),
        }
    }

    /// Correlated replies resolve right here in the reader; events go out
    /// through an unbounded queue. The reader must never wait on the
    /// dispatcher, or a reply the dispatcher is blocked on could sit
    /// unread behind queued events.
    async fn handle_frame(
        &self,
        frame: InboundFrame,
        events: &mpsc::UnboundedSender<TransportEvent>,
    ) {
        let event = match frame {
            InboundFrame::Ready => TransportEvent::Ready,
            InboundFrame::Message(m) => TransportEvent::Message(m.into()),
            InboundFrame::MessageRevoked { before } => TransportEvent::MessageRevoked {
                before: before.map(Into::into),
            },
            InboundFrame::ChatInfo { request_id, chat } => {
                self.resolve_request(request_id, PendingReply::Chat(chat))
                    .await;
                return;
            }
            InboundFrame::Media { request_id, media } => {
                self.resolve_request(request_id, PendingReply::Media(media))
                    .await;
                return;
            }
            InboundFrame::Error {
                request_id,
                message,
            } => {
                self.resolve_request(request_id, PendingReply::Failed(message))
                    .await;
                return;
            }
        };

        if events.send(event).is_err() {
            debug!("dispatcher gone; dropping event");
        }
    }
}

async fn run_reader<W, R>(
    bridge: Arc<Bridge<W>>,
    reader: R,
    events: mpsc::UnboundedSender<TransportEvent>,
) where
    W: AsyncWrite + Send + Unpin + 'static,
    R: AsyncBufRead + Send + Unpin,
{
    let mut lines = reader.lines();
    loop {
        tokio::select! {
            _ = bridge.cancel.cancelled() => break,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("bridge read failed: {e}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<InboundFrame>(&line) {
                    Ok(frame) => bridge.handle_frame(frame, &events).await,
                    // A malformed frame must not take the whole session down.
                    Err(e) => warn!("dropping malformed frame: {e}"),
                }
            }
        }
    }

    // Unblock any caller still waiting on a correlated reply.
    bridge.pending.lock().await.clear();
}

#[async_trait]
impl<W: AsyncWrite + Send + Unpin + 'static> TransportPort for Bridge<W> {
    async fn send(&self, conversation: &ConversationId, content: OutboundContent) -> Result<()> {
        self.write_frame(&OutboundFrame::Send {
            conversation: conversation.as_str().to_string(),
            content: WireContent::from(content),
        })
        .await
    }

    async fn get_chat(&self, conversation: &ConversationId) -> Result<ChatInfo> {
        let (request_id, rx) = self.register_request().await;
        self.write_frame(&OutboundFrame::GetChat {
            request_id,
            conversation: conversation.as_str().to_string(),
        })
        .await?;

        match self.await_reply(rx).await? {
            PendingReply::Chat(chat) => Ok(chat),
            _ => Err(Error::Transport("mismatched reply for get_chat".to_string())),
        }
    }

    async fn download_media(&self, media_ref: &str) -> Result<Option<MediaPayload>> {
        let (request_id, rx) = self.register_request().await;
        self.write_frame(&OutboundFrame::DownloadMedia {
            request_id,
            media_ref: media_ref.to_string(),
        })
        .await?;

        match self.await_reply(rx).await? {
            PendingReply::Media(media) => Ok(media),
            _ => Err(Error::Transport(
                "mismatched reply for download_media".to_string(),
            )),
        }
    }

    async fn shutdown(&self) -> Result<()> {
        // Best-effort: tell the sidecar to disconnect, then stop reading.
        if let Err(e) = self.write_frame(&OutboundFrame::Shutdown).await {
            warn!("shutdown frame not delivered: {e}");
        }
        self.cancel.cancel();
        Ok(())
    }
}
