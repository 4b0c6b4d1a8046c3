//! Message-event handlers.
//!
//! Every inbound message goes through three independent passes:
//! 1. unconditional view-once capture (before any command, since the content
//!    becomes unrecoverable once the transport consumes it),
//! 2. the command switch on the first whitespace token,
//! 3. the pairing-code check on the raw body prefix.
//!
//! Passes 2 and 3 are deliberately not mutually exclusive: a message shaped
//! like both fires both.

use tracing::{debug, error, warn};

use jagwax_core::{
    domain::ConversationId,
    messaging::types::IncomingMessage,
    pairing::PairingRegistry,
    Error, Result,
};

use crate::Dispatcher;

pub mod commands;
pub mod revoke;

pub async fn handle_message(app: &Dispatcher, msg: &IncomingMessage) -> Result<()> {
    capture_view_once(app, msg).await;

    let command = msg
        .body
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();

    if let Err(e) = commands::dispatch(app, msg, &command).await {
        match e {
            Error::Storage(ref reason) => {
                error!("storage failure in {command}: {reason}");
                app.reply_text(&msg.conversation, "Something went wrong. Please try again.")
                    .await;
            }
            other => warn!("command {command} failed: {other}"),
        }
    }

    if PairingRegistry::looks_like_code(&msg.body) {
        let text = if app.pairing.verify(&msg.from, &msg.body).await {
            "Jagwaz has successfully taken over"
        } else {
            "Invalid pairing code."
        };
        app.reply_text(&msg.conversation, text).await;
    }

    Ok(())
}

/// Archive view-once media, keyed by the sender identity (matching the reads
/// done by `.vv`). Failures are logged, never fatal to the event.
async fn capture_view_once(app: &Dispatcher, msg: &IncomingMessage) {
    if !msg.is_view_once || !msg.has_media {
        return;
    }
    let Some(media_ref) = &msg.media_ref else {
        debug!("view-once message without media ref from {}", msg.from);
        return;
    };

    let media = match app.transport.download_media(media_ref).await {
        Ok(Some(media)) => media,
        Ok(None) => {
            debug!("view-once media already gone: {media_ref}");
            return;
        }
        Err(e) => {
            warn!("view-once download failed: {e}");
            return;
        }
    };

    if media.payload.len() > app.cfg.media_max_bytes {
        warn!(
            "skipping view-once media of {} bytes from {} (cap {})",
            media.payload.len(),
            msg.from,
            app.cfg.media_max_bytes
        );
        return;
    }

    let key = ConversationId::from(&msg.from);
    if let Err(e) = app.archive.record_view_once_media(&key, media).await {
        error!("failed to archive view-once media for {key}: {e}");
    }
}
