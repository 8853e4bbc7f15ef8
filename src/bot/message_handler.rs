//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use teloxide::{ApiError, RequestError};
use tracing::{debug, error, info};

// Import dialogue types
use crate::dialogue::{InboundEvent, SearchDialogue};
use crate::search::Query;

// Import state machine functions
use super::dialogue_manager::{next_step, run_search, search_failed, Reply, Step};

// Import UI builder functions
use super::ui_builder::{create_keyboard, render_text, Screen};

use super::AppContext;

/// Send a reply as a new message
pub async fn send_reply(
    bot: &Bot,
    chat_id: ChatId,
    reply: &Reply,
    ctx: &AppContext,
    language_code: Option<&str>,
) -> Result<Message, RequestError> {
    let text = render_text(&reply.screen, &ctx.l10n, language_code);
    let mut request = bot.send_message(chat_id, text);

    if reply.screen.uses_html() {
        request = request.parse_mode(ParseMode::Html);
    }
    if let Some(menu) = reply.menu {
        request = request.reply_markup(create_keyboard(menu, &ctx.l10n, language_code));
    }

    request.await
}

/// Show a reply by editing an existing bot message
pub async fn edit_reply(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    reply: &Reply,
    ctx: &AppContext,
    language_code: Option<&str>,
) -> Result<(), RequestError> {
    let text = render_text(&reply.screen, &ctx.l10n, language_code);
    let mut request = bot.edit_message_text(chat_id, message_id, text);

    if reply.screen.uses_html() {
        request = request.parse_mode(ParseMode::Html);
    }
    if let Some(menu) = reply.menu {
        request = request.reply_markup(create_keyboard(menu, &ctx.l10n, language_code));
    }

    match request.await {
        Ok(_) => Ok(()),
        // Pressing the same button twice renders identical content
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Best-effort apology after a handler failed
pub async fn notify_failure(
    bot: &Bot,
    chat_id: ChatId,
    ctx: &AppContext,
    language_code: Option<&str>,
) {
    let text = render_text(&Screen::GenericError, &ctx.l10n, language_code);
    if let Err(e) = bot.send_message(chat_id, text).await {
        error!(user_id = %chat_id, error = %e, "Failed to notify user about an error");
    }
}

async fn handle_search(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &SearchDialogue,
    ctx: &AppContext,
    query: Query,
    language_code: Option<&str>,
) -> Result<()> {
    info!(user_id = %chat_id, query = %query, "User searching by all fields");

    let placeholder = bot
        .send_message(chat_id, render_text(&Screen::Searching, &ctx.l10n, language_code))
        .await?;

    let reply = run_search(ctx, &query, language_code).await;

    match edit_reply(bot, chat_id, placeholder.id, &reply, ctx, language_code).await {
        Ok(()) => dialogue.update(reply.next_state).await?,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to deliver search results");
            let fallback = search_failed();
            dialogue.update(fallback.next_state).await?;
            edit_reply(bot, chat_id, placeholder.id, &fallback, ctx, language_code).await?;
        }
    }

    Ok(())
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: &SearchDialogue,
    ctx: &AppContext,
    language_code: Option<&str>,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    let first_name = msg
        .from
        .as_ref()
        .map(|user| user.first_name.as_str())
        .unwrap_or_default();

    let state = dialogue.get_or_default().await?;
    let event = InboundEvent::from_text(text);

    match next_step(state, &event, first_name) {
        Step::Reply(reply) => {
            if matches!(reply.screen, Screen::Welcome { .. }) {
                info!(user_id = %msg.chat.id, "User started the bot");
            }
            dialogue.update(reply.next_state).await?;
            send_reply(bot, msg.chat.id, &reply, ctx, language_code).await?;
        }
        Step::Search(query) => {
            handle_search(bot, msg.chat.id, dialogue, ctx, query, language_code).await?;
        }
        Step::Ignore => {}
    }

    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: SearchDialogue,
    ctx: Arc<AppContext>,
) -> Result<()> {
    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str());

    let Some(text) = msg.text() else {
        debug!(user_id = %msg.chat.id, "Ignoring non-text message");
        return Ok(());
    };

    if let Err(e) = handle_text_message(&bot, &msg, text, &dialogue, &ctx, language_code).await {
        error!(user_id = %msg.chat.id, error = %e, "Failed to handle message");
        notify_failure(&bot, msg.chat.id, &ctx, language_code).await;
    }

    Ok(())
}
