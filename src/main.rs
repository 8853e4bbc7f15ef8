use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use tracing::{info, warn};

use participants::bot::{self, AppContext};
use participants::config::BotConfig;
use participants::dialogue::SearchDialogueState;
use participants::localization::LocalizationManager;
use participants::logging::init_logging;
use participants::search::SearchService;
use participants::sheets::SheetsService;

/// Connect and prefetch once so problems show up in the logs early
async fn probe_spreadsheet(sheets: &SheetsService) {
    if let Err(e) = sheets.connect().await {
        warn!(error = %e, "Spreadsheet connection failed at startup, will retry on first search");
        return;
    }

    match sheets.get_all_data(false).await {
        Ok(data) => info!(records = data.len(), "Spreadsheet data prefetched"),
        Err(e) => warn!(error = %e, "Failed to prefetch spreadsheet data"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;

    // Initialize logging
    init_logging(&config.logging)?;

    info!("Starting Participants Lookup Telegram Bot");
    info!(
        spreadsheet_id = %config.sheets.spreadsheet_id,
        sheet = config.sheets.sheet_name.as_deref().unwrap_or("<first>"),
        "Configuration loaded"
    );

    let l10n = LocalizationManager::new()?;
    let sheets = Arc::new(SheetsService::new(config.sheets.clone()));

    probe_spreadsheet(&sheets).await;

    let ctx = Arc::new(AppContext::new(
        sheets,
        SearchService::new(config.columns.clone()),
        l10n,
    ));

    // Initialize the bot
    let bot = Bot::new(config.bot_token);

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![InMemStorage::<SearchDialogueState>::new(), ctx])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot shutdown complete");

    Ok(())
}
