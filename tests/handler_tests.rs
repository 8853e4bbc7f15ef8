//! # Handler Tests
//!
//! Callback handling against a Bot API server that rejects every request.

use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use participants::bot::{callback_handler, AppContext};
use participants::config::{ColumnsConfig, SheetsConfig};
use participants::dialogue::{SearchDialogue, SearchDialogueState};
use participants::localization::LocalizationManager;
use participants::search::SearchService;
use participants::sheets::SheetsService;

const CHAT_ID: i64 = 42;

async fn failing_bot_api() -> Result<(MockServer, Bot)> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: query is too old and response timeout expired or query ID is invalid",
        })))
        .mount(&server)
        .await;

    let bot = Bot::new("123456:test-token").set_api_url(reqwest::Url::parse(&server.uri())?);
    Ok((server, bot))
}

fn app_context() -> Result<Arc<AppContext>> {
    Ok(Arc::new(AppContext::new(
        Arc::new(SheetsService::new(SheetsConfig::new(
            "test-sheet",
            "/nonexistent/google_credentials.json",
        ))),
        SearchService::new(ColumnsConfig::default()),
        LocalizationManager::new()?,
    )))
}

fn callback_query(data: &str, with_message: bool) -> Result<CallbackQuery> {
    let user = json!({
        "id": CHAT_ID,
        "is_bot": false,
        "first_name": "Мария",
        "language_code": "ru",
    });

    let mut query = json!({
        "id": "4382bfdwdsb323b2d9",
        "from": user,
        "chat_instance": "-1234567890",
        "data": data,
    });

    if with_message {
        query["message"] = json!({
            "message_id": 7,
            "date": 1_700_000_000,
            "chat": { "id": CHAT_ID, "type": "private", "first_name": "Мария" },
            "from": { "id": 123456, "is_bot": true, "first_name": "Lookup Bot", "username": "lookup_bot" },
            "text": "✍️ Введите данные для поиска:",
        });
    }

    Ok(serde_json::from_value(query)?)
}

async fn awaiting_dialogue() -> Result<SearchDialogue> {
    let dialogue = SearchDialogue::new(InMemStorage::new(), ChatId(CHAT_ID));
    dialogue
        .update(SearchDialogueState::AwaitingCombinedQuery)
        .await?;
    Ok(dialogue)
}

/// Test that cancel resets the dialogue even when Telegram rejects every call
#[tokio::test]
async fn test_cancel_resets_state_when_telegram_fails() -> Result<()> {
    let (_server, bot) = failing_bot_api().await?;
    let dialogue = awaiting_dialogue().await?;

    callback_handler(bot, callback_query("cancel", true)?, dialogue.clone(), app_context()?).await?;

    assert_eq!(dialogue.get().await?, Some(SearchDialogueState::MainMenu));
    Ok(())
}

/// Test that cancel resets the dialogue when the original message is unavailable
#[tokio::test]
async fn test_cancel_resets_state_without_message() -> Result<()> {
    let (_server, bot) = failing_bot_api().await?;
    let dialogue = awaiting_dialogue().await?;

    callback_handler(bot, callback_query("cancel", false)?, dialogue.clone(), app_context()?).await?;

    assert_eq!(dialogue.get().await?, Some(SearchDialogueState::MainMenu));
    Ok(())
}

/// Test that back to menu from results resets the dialogue when the edit fails
#[tokio::test]
async fn test_back_to_menu_resets_state_when_edit_fails() -> Result<()> {
    let (_server, bot) = failing_bot_api().await?;
    let dialogue = SearchDialogue::new(InMemStorage::new(), ChatId(CHAT_ID));
    dialogue.update(SearchDialogueState::ShowingResults).await?;

    callback_handler(
        bot,
        callback_query("back_to_menu", true)?,
        dialogue.clone(),
        app_context()?,
    )
    .await?;

    assert_eq!(dialogue.get().await?, Some(SearchDialogueState::MainMenu));
    Ok(())
}

/// Test that a stale button leaves the dialogue untouched
#[tokio::test]
async fn test_stale_button_keeps_state() -> Result<()> {
    let (_server, bot) = failing_bot_api().await?;
    let dialogue = awaiting_dialogue().await?;

    callback_handler(
        bot,
        callback_query("start_search", true)?,
        dialogue.clone(),
        app_context()?,
    )
    .await?;

    assert_eq!(
        dialogue.get().await?,
        Some(SearchDialogueState::AwaitingCombinedQuery)
    );
    Ok(())
}
