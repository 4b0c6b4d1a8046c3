use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use jagwax_core::{
    archive::ArchiveStore,
    config::Config,
    domain::ConversationId,
    messaging::{
        port::TransportPort,
        types::{OutboundContent, TransportEvent},
    },
    pairing::PairingRegistry,
    session::SessionWindow,
};

use crate::handlers;

/// The event-to-action router. Owns the archive and pairing registry; the
/// transport handle is shared with the session window.
pub struct Dispatcher {
    pub(crate) cfg: Arc<Config>,
    pub(crate) archive: Arc<ArchiveStore>,
    pub(crate) pairing: Arc<PairingRegistry>,
    pub(crate) transport: Arc<dyn TransportPort>,
    pub(crate) session: SessionWindow,
}

impl Dispatcher {
    pub fn new(
        cfg: Arc<Config>,
        archive: Arc<ArchiveStore>,
        pairing: Arc<PairingRegistry>,
        transport: Arc<dyn TransportPort>,
        session: SessionWindow,
    ) -> Self {
        Self {
            cfg,
            archive,
            pairing,
            transport,
            session,
        }
    }

    /// Drain the event stream until the transport closes it.
    ///
    /// One event is fully processed (storage I/O and outbound sends included)
    /// before the next is dequeued, so replies from a single event go out in
    /// production order and same-conversation archive writes stay in detection
    /// order.
    pub async fn run(
        &self,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> anyhow::Result<()> {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }

        info!("event stream closed; dispatcher stopping");
        self.session.stop().await;
        Ok(())
    }

    pub async fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Ready => {
                info!("transport ready");
                self.session.activate().await;
            }
            TransportEvent::Message(msg) => {
                if let Err(e) = handlers::handle_message(self, &msg).await {
                    warn!("message handling failed: {e}");
                }
            }
            TransportEvent::MessageRevoked { before } => {
                handlers::revoke::handle_revoked(self, before).await;
            }
        }
    }

    /// Send a reply, logging and dropping it on transport failure (no retry).
    pub(crate) async fn reply(&self, conversation: &ConversationId, content: OutboundContent) {
        if let Err(e) = self.transport.send(conversation, content).await {
            warn!("dropping reply to {conversation}: {e}");
        }
    }

    pub(crate) async fn reply_text(&self, conversation: &ConversationId, text: impl Into<String>) {
        self.reply(conversation, OutboundContent::Text(text.into()))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use jagwax_core::session::SessionPhase;
    use jagwax_core::messaging::types::TransportEvent;

    use crate::testing::TestBot;

    #[tokio::test]
    async fn ready_event_activates_the_session_window() {
        let bot = TestBot::new("dispatcher-ready").await;
        assert_eq!(bot.dispatcher.session.phase().await, SessionPhase::Pending);

        bot.dispatcher.handle_event(TransportEvent::Ready).await;
        assert_eq!(bot.dispatcher.session.phase().await, SessionPhase::Active);
    }

    #[tokio::test]
    async fn plain_text_is_a_no_op() {
        let bot = TestBot::new("dispatcher-noop").await;
        bot.dispatcher
            .handle_event(TransportEvent::Message(bot.direct_message(
                "2348011112222",
                "hello there, how are you?",
            )))
            .await;

        assert!(bot.transport.sent().await.is_empty());
    }
}
