//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, warn};

// Import dialogue types
use crate::dialogue::{CallbackAction, InboundEvent, SearchDialogue};

// Import state machine functions
use super::dialogue_manager::{next_step, Step};

use super::message_handler::{edit_reply, notify_failure};
use super::AppContext;

async fn handle_callback(
    bot: &Bot,
    q: &CallbackQuery,
    dialogue: &SearchDialogue,
    ctx: &AppContext,
    language_code: Option<&str>,
) -> Result<()> {
    let data = q.data.as_deref().unwrap_or("");
    let event = InboundEvent::from_callback_data(data);

    // Always stop the button spinner, with a toast on cancel
    let mut answer = bot.answer_callback_query(q.id.clone());
    if event == InboundEvent::Action(CallbackAction::Cancel) {
        answer = answer.text(ctx.l10n.t("cancel-toast", language_code));
    }
    if let Err(e) = answer.await {
        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let state = dialogue.get_or_default().await?;
    debug!(user_id = %q.from.id, dialogue_state = ?state, data = %data, "Handling callback");

    match next_step(state, &event, &q.from.first_name) {
        Step::Reply(reply) => {
            // The transition holds even if the screen cannot be shown
            dialogue.update(reply.next_state).await?;

            let Some(msg) = &q.message else {
                debug!(user_id = %q.from.id, "Callback without an accessible message");
                return Ok(());
            };
            edit_reply(bot, msg.chat().id, msg.id(), &reply, ctx, language_code).await?;
        }
        Step::Search(query) => {
            // Searches start from text input only
            debug!(user_id = %q.from.id, query = %query, "Ignoring search step from a button");
        }
        Step::Ignore => {}
    }

    Ok(())
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: SearchDialogue,
    ctx: Arc<AppContext>,
) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    let language_code = q.from.language_code.as_deref();

    if let Err(e) = handle_callback(&bot, &q, &dialogue, &ctx, language_code).await {
        error!(user_id = %q.from.id, error = %e, "Failed to handle callback query");
        if let Some(msg) = &q.message {
            notify_failure(&bot, msg.chat().id, &ctx, language_code).await;
        }
    }

    Ok(())
}
