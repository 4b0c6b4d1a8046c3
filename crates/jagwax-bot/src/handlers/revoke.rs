//! Revoke-for-everyone handling: archive the original, then announce it.

use tracing::{debug, error};

use jagwax_core::messaging::types::RevokedMessage;

use crate::Dispatcher;

/// `before` is the original message if the transport still had it resident.
/// When it was already evicted there is nothing to archive; skip quietly.
pub(crate) async fn handle_revoked(app: &Dispatcher, before: Option<RevokedMessage>) {
    let Some(before) = before else {
        debug!("revoked message no longer resident; skipping");
        return;
    };

    if let Err(e) = app
        .archive
        .record_deleted_message(
            &before.conversation,
            before.author.clone(),
            before.body.clone(),
        )
        .await
    {
        error!("failed to archive deleted message in {}: {e}", before.conversation);
    }

    app.reply_text(
        &before.conversation,
        format!("Deleted message from {}: \"{}\"", before.author, before.body),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use jagwax_core::messaging::types::{RevokedMessage, TransportEvent};

    use crate::testing::TestBot;

    #[tokio::test]
    async fn revoked_message_is_archived_and_announced() {
        let bot = TestBot::new("revoke").await;

        bot.dispatcher
            .handle_event(TransportEvent::MessageRevoked {
                before: Some(RevokedMessage {
                    conversation: "123".into(),
                    author: "123".into(),
                    body: "hello".to_string(),
                }),
            })
            .await;

        let archived = bot.dispatcher.archive.list_deleted_messages(&"123".into()).await;
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].body, "hello");
        assert_eq!(archived[0].author, "123".into());

        let sent = bot.transport.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "123".into());
        assert_eq!(
            bot.transport.sent_texts().await,
            vec!["Deleted message from 123: \"hello\"".to_string()]
        );
    }

    #[tokio::test]
    async fn evicted_original_is_skipped_without_crashing() {
        let bot = TestBot::new("revoke-missing").await;

        bot.dispatcher
            .handle_event(TransportEvent::MessageRevoked { before: None })
            .await;

        assert!(bot.transport.sent().await.is_empty());
    }
}
