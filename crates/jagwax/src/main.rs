use std::sync::Arc;

use tracing::info;

use jagwax_bot::Dispatcher;
use jagwax_bridge::StdioBridge;
use jagwax_core::{
    archive::ArchiveStore, config::Config, messaging::port::TransportPort,
    pairing::PairingRegistry, session::SessionWindow,
};

#[tokio::main]
async fn main() -> Result<(), jagwax_core::Error> {
    jagwax_core::logging::init("jagwax")?;

    let cfg = Arc::new(Config::load()?);
    info!("storage dir: {}", cfg.storage_dir.display());

    let archive = Arc::new(ArchiveStore::open(&cfg.storage_dir).await?);
    let pairing = Arc::new(PairingRegistry::open(cfg.storage_dir.join("pairing.json")).await?);

    let (bridge, events) = StdioBridge::stdio();
    let transport: Arc<dyn TransportPort> = bridge;
    let session = SessionWindow::new(cfg.session_max_duration, transport.clone());

    let dispatcher = Dispatcher::new(cfg, archive, pairing, transport, session);
    dispatcher
        .run(events)
        .await
        .map_err(|e| jagwax_core::Error::Transport(format!("dispatcher failed: {e}")))?;

    Ok(())
}
