//! Search dialogue module for handling conversation state with users.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Represents the conversation state of one chat
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchDialogueState {
    #[default]
    MainMenu,
    /// The next free-text message is parsed as a combined query
    AwaitingCombinedQuery,
    ShowingResults,
}

/// Type alias for our search dialogue
pub type SearchDialogue = Dialogue<SearchDialogueState, InMemStorage<SearchDialogueState>>;

/// Inline button actions, carried as callback data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    StartSearch,
    ShowHelp,
    NewSearch,
    Cancel,
    BackToMenu,
}

impl CallbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackAction::StartSearch => "start_search",
            CallbackAction::ShowHelp => "show_help",
            CallbackAction::NewSearch => "new_search",
            CallbackAction::Cancel => "cancel",
            CallbackAction::BackToMenu => "back_to_menu",
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "start_search" => Some(CallbackAction::StartSearch),
            "show_help" => Some(CallbackAction::ShowHelp),
            "new_search" => Some(CallbackAction::NewSearch),
            "cancel" => Some(CallbackAction::Cancel),
            "back_to_menu" => Some(CallbackAction::BackToMenu),
            _ => None,
        }
    }
}

/// Bot commands
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Unknown(String),
}

/// Something the user did, independent of the Telegram types
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    Command(Command),
    Text(String),
    Action(CallbackAction),
    /// Callback data the bot does not know
    UnknownAction(String),
}

impl InboundEvent {
    /// Classify a text message as a command or free text
    ///
    /// Handles the `/command@BotName` form used in group chats.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return InboundEvent::Text(text.to_string());
        };

        let word = rest.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or("");

        let command = match name.to_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            _ => Command::Unknown(name.to_string()),
        };
        InboundEvent::Command(command)
    }

    pub fn from_callback_data(data: &str) -> Self {
        match CallbackAction::parse(data) {
            Some(action) => InboundEvent::Action(action),
            None => InboundEvent::UnknownAction(data.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_tags_round_trip() {
        for action in [
            CallbackAction::StartSearch,
            CallbackAction::ShowHelp,
            CallbackAction::NewSearch,
            CallbackAction::Cancel,
            CallbackAction::BackToMenu,
        ] {
            assert_eq!(CallbackAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(CallbackAction::parse("search_all_fields"), None);
    }

    #[test]
    fn test_command_detection() {
        assert_eq!(
            InboundEvent::from_text("/start"),
            InboundEvent::Command(Command::Start)
        );
        assert_eq!(
            InboundEvent::from_text("/help@participants_bot"),
            InboundEvent::Command(Command::Help)
        );
        assert_eq!(
            InboundEvent::from_text("/stats"),
            InboundEvent::Command(Command::Unknown("stats".to_string()))
        );
        assert_eq!(
            InboundEvent::from_text("Иванов Иван Иванович 10А"),
            InboundEvent::Text("Иванов Иван Иванович 10А".to_string())
        );
    }
}
