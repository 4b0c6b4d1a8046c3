//! Bounded operating window: Pending -> Active -> Expired.
//!
//! One window per process run. Activation arms a single deferred expiry; when
//! it fires the transport is torn down best-effort and the window stays
//! Expired for good (no re-arming, no extension).

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::messaging::port::TransportPort;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Pending,
    Active,
    Expired,
}

#[derive(Clone)]
pub struct SessionWindow {
    inner: Arc<Inner>,
}

struct Inner {
    max_duration: Duration,
    transport: Arc<dyn TransportPort>,
    state: Mutex<State>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct State {
    phase: Phase,
    timer: Option<JoinHandle<()>>,
}

#[derive(Default, Clone, Copy, PartialEq, Eq)]
enum Phase {
    #[default]
    Pending,
    Active,
    Expired,
}

impl SessionWindow {
    pub fn new(max_duration: Duration, transport: Arc<dyn TransportPort>) -> Self {
        Self {
            inner: Arc::new(Inner {
                max_duration,
                transport,
                state: Mutex::new(State::default()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Transport-ready signal: Pending -> Active, arming the expiry timer.
    /// Any later call is ignored; the window cannot be re-armed.
    pub async fn activate(&self) {
        let mut st = self.inner.state.lock().await;
        if st.phase != Phase::Pending {
            warn!("session window already activated; ignoring ready signal");
            return;
        }
        st.phase = Phase::Active;

        info!(
            "session window active for {}s",
            self.inner.max_duration.as_secs()
        );

        let window = self.clone();
        let cancel = self.inner.cancel.clone();
        st.timer = Some(tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(window.inner.max_duration) => {
                    window.expire().await;
                }
            }
        }));
    }

    /// External termination path: the deferred expiry is simply never reached.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        let mut st = self.inner.state.lock().await;
        if let Some(timer) = st.timer.take() {
            timer.abort();
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        match self.inner.state.lock().await.phase {
            Phase::Pending => SessionPhase::Pending,
            Phase::Active => SessionPhase::Active,
            Phase::Expired => SessionPhase::Expired,
        }
    }

    async fn expire(&self) {
        {
            let mut st = self.inner.state.lock().await;
            if st.phase == Phase::Expired {
                return;
            }
            st.phase = Phase::Expired;
        }

        info!("session window expired; disconnecting transport");
        if let Err(e) = self.inner.transport.shutdown().await {
            warn!("transport teardown failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{
        domain::ConversationId,
        messaging::types::{ChatInfo, MediaPayload, OutboundContent},
        Result,
    };

    #[derive(Default)]
    struct CountingTransport {
        shutdowns: AtomicUsize,
    }

    #[async_trait]
    impl TransportPort for CountingTransport {
        async fn send(&self, _: &ConversationId, _: OutboundContent) -> Result<()> {
            Ok(())
        }

        async fn get_chat(&self, conversation: &ConversationId) -> Result<ChatInfo> {
            Ok(ChatInfo {
                id: conversation.clone(),
                name: String::new(),
                is_group: false,
                participants: Vec::new(),
            })
        }

        async fn download_media(&self, _: &str) -> Result<Option<MediaPayload>> {
            Ok(None)
        }

        async fn shutdown(&self) -> Result<()> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    async fn settle() {
        // Let the expiry task observe the advanced clock.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_fires_once_at_window_end() {
        let transport = Arc::new(CountingTransport::default());
        let window = SessionWindow::new(WEEK, transport.clone());

        window.activate().await;
        assert_eq!(window.phase().await, SessionPhase::Active);

        // One hour short of the window: nothing fires.
        tokio::time::advance(WEEK - Duration::from_secs(3600)).await;
        settle().await;
        assert_eq!(window.phase().await, SessionPhase::Active);
        assert_eq!(transport.shutdowns.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(3600)).await;
        settle().await;
        assert_eq!(window.phase().await, SessionPhase::Expired);
        assert_eq!(transport.shutdowns.load(Ordering::SeqCst), 1);

        // Terminal state: nothing fires again.
        tokio::time::advance(WEEK).await;
        settle().await;
        assert_eq!(transport.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_ready_signals_do_not_rearm() {
        let transport = Arc::new(CountingTransport::default());
        let window = SessionWindow::new(Duration::from_secs(10), transport.clone());

        window.activate().await;
        tokio::time::advance(Duration::from_secs(6)).await;
        settle().await;
        window.activate().await; // ignored; must not reset the deadline

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(window.phase().await, SessionPhase::Expired);
        assert_eq!(transport.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_expiry() {
        let transport = Arc::new(CountingTransport::default());
        let window = SessionWindow::new(Duration::from_secs(5), transport.clone());

        window.activate().await;
        window.stop().await;

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(transport.shutdowns.load(Ordering::SeqCst), 0);
    }
}
