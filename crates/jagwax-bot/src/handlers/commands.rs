//! The fixed command table and its handlers.
//!
//! Handlers receive the sender identity, originating conversation and full
//! body via `IncomingMessage`, and produce zero or more replies in order.
//! `.vv`/`.recover` read the archive keyed by the sender identity, the same
//! key the capture paths write.

use jagwax_core::{
    content,
    domain::{ConversationId, Identity},
    messaging::types::{IncomingMessage, OutboundContent},
    Error, Result,
};

use crate::Dispatcher;

pub(crate) async fn dispatch(app: &Dispatcher, msg: &IncomingMessage, command: &str) -> Result<()> {
    match command {
        ".menu" | ".help" => {
            app.reply_text(&msg.conversation, content::menu()).await;
        }
        ".motivate" => {
            app.reply_text(&msg.conversation, content::random_quote())
                .await;
        }
        ".vv" => resend_view_once(app, msg).await?,
        ".recover" => recover_deleted(app, msg).await?,
        ".pair" => pair(app, msg).await?,
        ".mycode" => my_code(app, msg).await,
        ".groupinfo" => group_info(app, msg).await?,
        ".welcome" => welcome(app, msg).await?,
        ".status" => {
            app.reply_text(
                &msg.conversation,
                "Status features are limited by the transport API. Auto-reaction is enabled.",
            )
            .await;
        }
        ".addcontact" => add_contact(app, msg).await?,
        // Empty or unrecognized token: plain conversational text, no-op.
        _ => {}
    }

    Ok(())
}

async fn resend_view_once(app: &Dispatcher, msg: &IncomingMessage) -> Result<()> {
    let key = ConversationId::from(&msg.from);
    let media = app.archive.list_view_once_media(&key).await;

    if media.is_empty() {
        app.reply_text(&msg.conversation, "No saved view-once media yet.")
            .await;
        return Ok(());
    }

    for item in media {
        app.reply(&msg.conversation, OutboundContent::Media(item.to_payload()))
            .await;
    }
    Ok(())
}

async fn recover_deleted(app: &Dispatcher, msg: &IncomingMessage) -> Result<()> {
    let key = ConversationId::from(&msg.from);
    let deleted = app.archive.list_deleted_messages(&key).await;

    if deleted.is_empty() {
        app.reply_text(&msg.conversation, "No deleted messages saved.")
            .await;
        return Ok(());
    }

    for item in deleted {
        app.reply_text(&msg.conversation, format!("Recovered: {}", item.body))
            .await;
    }
    Ok(())
}

async fn pair(app: &Dispatcher, msg: &IncomingMessage) -> Result<()> {
    if let Some(code) = app.pairing.get(&msg.from).await {
        app.reply_text(&msg.conversation, format!("Your pairing code is: {code}"))
            .await;
        return Ok(());
    }

    let code = app.pairing.issue_or_get(&msg.from).await?;
    app.reply_text(
        &msg.conversation,
        format!("Your Jagwax AI pairing code is: {code}\nEnter this on the pairing site."),
    )
    .await;
    Ok(())
}

async fn my_code(app: &Dispatcher, msg: &IncomingMessage) {
    match app.pairing.get(&msg.from).await {
        Some(code) => {
            app.reply_text(&msg.conversation, format!("Your pairing code: {code}"))
                .await;
        }
        None => {
            app.reply_text(
                &msg.conversation,
                "No pairing code found. Use *.pair* to generate.",
            )
            .await;
        }
    }
}

async fn group_info(app: &Dispatcher, msg: &IncomingMessage) -> Result<()> {
    let chat = app.transport.get_chat(&msg.conversation).await?;
    if !chat.is_group {
        app.reply_text(&msg.conversation, "This command works in groups only.")
            .await;
        return Ok(());
    }

    app.reply_text(
        &msg.conversation,
        format!(
            "Group Name: {}\nParticipants: {}",
            chat.name,
            chat.participants.len()
        ),
    )
    .await;
    Ok(())
}

async fn welcome(app: &Dispatcher, msg: &IncomingMessage) -> Result<()> {
    let chat = app.transport.get_chat(&msg.conversation).await?;
    if !chat.is_group {
        app.reply_text(&msg.conversation, "This command works in groups only.")
            .await;
        return Ok(());
    }

    // Feature stub: the transport does not surface participant-added events yet.
    app.reply_text(
        &msg.conversation,
        "Welcome messages activated. New members will be greeted.",
    )
    .await;
    Ok(())
}

async fn add_contact(app: &Dispatcher, msg: &IncomingMessage) -> Result<()> {
    // Rejections stay local to the chat; only storage/transport failures
    // escape to the dispatcher.
    match checked_add_contact(app, msg).await {
        Ok(reply) => {
            app.reply_text(&msg.conversation, reply).await;
            Ok(())
        }
        Err(Error::Unauthorized(_)) => {
            app.reply_text(&msg.conversation, "Only owner can add contacts.")
                .await;
            Ok(())
        }
        Err(Error::InvalidArgument(_)) => {
            app.reply_text(&msg.conversation, "Usage: *.addcontact <number>*")
                .await;
            Ok(())
        }
        Err(other) => Err(other),
    }
}

async fn checked_add_contact(app: &Dispatcher, msg: &IncomingMessage) -> Result<String> {
    // Privileged: only the operator messaging from their own account.
    if !msg.from_me {
        return Err(Error::Unauthorized(
            "add-contact from a non-owner account".to_string(),
        ));
    }

    let number = msg
        .body
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::InvalidArgument("missing contact number".to_string()))?;

    let code = app.pairing.issue_or_get(&Identity::from(number)).await?;
    Ok(format!("Contact {number} added. Pairing code: {code}"))
}
