//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles commands and free-text messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards, renders screens and formats search results
//! - `dialogue_manager`: The conversation state machine and the search pipeline

use std::sync::Arc;

use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::dialogue::SearchDialogueState;
use crate::localization::LocalizationManager;
use crate::search::SearchService;
use crate::sheets::SheetsService;

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

// Re-export utility functions that might be used elsewhere
pub use dialogue_manager::{next_step, run_search, Reply, Step};
pub use ui_builder::{create_keyboard, format_results, render_text, Menu, Screen};

/// Services shared by every handler, built once at startup
pub struct AppContext {
    pub sheets: Arc<SheetsService>,
    pub search: SearchService,
    pub l10n: LocalizationManager,
}

impl AppContext {
    pub fn new(sheets: Arc<SheetsService>, search: SearchService, l10n: LocalizationManager) -> Self {
        Self {
            sheets,
            search,
            l10n,
        }
    }
}

/// Update routing: every update enters the per-chat dialogue first
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dialogue::enter::<Update, InMemStorage<SearchDialogueState>, SearchDialogueState, _>()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}
