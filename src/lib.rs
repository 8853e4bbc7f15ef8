//! # Participants Lookup Telegram Bot
//!
//! A Telegram bot that looks up olympiad participants in a Google spreadsheet
//! by surname, name, patronymic and class, and replies with their participant
//! ID and subjects.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod localization;
pub mod logging;
pub mod record;
pub mod search;
pub mod sheets;
pub mod sheets_auth;
pub mod sheets_errors;
