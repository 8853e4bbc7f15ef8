//! Dialogue Manager module for handling dialogue state transitions
//!
//! [`next_step`] is the whole state machine: it looks at the current state and the
//! user event and decides what to show and where to go next. It performs no I/O.
//! A valid combined query yields [`Step::Search`]; the caller then runs
//! [`run_search`] and renders its reply.

use tracing::{debug, error, info};

use crate::dialogue::{CallbackAction, Command, InboundEvent, SearchDialogueState};
use crate::search::{Query, QueryParseError};

use super::ui_builder::{format_results, Menu, Screen};
use super::AppContext;

/// What to show and which state to store afterwards
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub screen: Screen,
    pub menu: Option<Menu>,
    pub next_state: SearchDialogueState,
}

impl Reply {
    pub fn new(screen: Screen, menu: Option<Menu>, next_state: SearchDialogueState) -> Self {
        Self {
            screen,
            menu,
            next_state,
        }
    }

    fn main_menu(screen: Screen) -> Self {
        Self::new(screen, Some(Menu::Main), SearchDialogueState::MainMenu)
    }

    fn prompt(screen: Screen) -> Self {
        Self::new(
            screen,
            Some(Menu::Cancel),
            SearchDialogueState::AwaitingCombinedQuery,
        )
    }
}

/// Outcome of feeding one event to the state machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Reply(Reply),
    /// Fetch, match and format, then show the results
    Search(Query),
    /// Nothing to do for this event in this state
    Ignore,
}

/// Decide the next step for `event` received in `state`
pub fn next_step(state: SearchDialogueState, event: &InboundEvent, first_name: &str) -> Step {
    use SearchDialogueState::*;

    let reply = match (state, event) {
        (_, InboundEvent::Command(Command::Start)) => Reply::main_menu(Screen::Welcome {
            first_name: first_name.to_string(),
        }),
        (_, InboundEvent::Command(Command::Help)) => Reply::new(Screen::Help, None, state),
        (_, InboundEvent::Command(Command::Unknown(_))) => {
            Reply::new(Screen::UnknownCommand, None, state)
        }

        (_, InboundEvent::Action(CallbackAction::Cancel)) => Reply::main_menu(Screen::Cancelled),

        (MainMenu, InboundEvent::Action(CallbackAction::StartSearch))
        | (ShowingResults, InboundEvent::Action(CallbackAction::NewSearch)) => {
            Reply::prompt(Screen::QueryPrompt)
        }
        (_, InboundEvent::Action(CallbackAction::ShowHelp)) => {
            Reply::main_menu(Screen::HelpMenu)
        }
        (ShowingResults, InboundEvent::Action(CallbackAction::BackToMenu)) => {
            Reply::main_menu(Screen::MainMenu)
        }

        (AwaitingCombinedQuery, InboundEvent::Text(text)) => match Query::parse(text) {
            Ok(query) => return Step::Search(query),
            Err(QueryParseError::Empty) => Reply::prompt(Screen::EmptyQuery),
            Err(QueryParseError::TooFewParts { found }) => {
                debug!(found, "Combined query has too few parts");
                Reply::prompt(Screen::NotEnoughData)
            }
        },
        (MainMenu, InboundEvent::Text(_)) => {
            Reply::new(Screen::TextOutsideSearch, Some(Menu::Main), state)
        }
        (ShowingResults, InboundEvent::Text(_)) => {
            Reply::new(Screen::TextOutsideSearch, Some(Menu::PostResults), state)
        }

        (_, InboundEvent::Action(action)) => {
            debug!(?state, ?action, "Ignoring button not available in this state");
            return Step::Ignore;
        }
        (_, InboundEvent::UnknownAction(data)) => {
            debug!(?state, data = %data, "Ignoring unknown callback data");
            return Step::Ignore;
        }
    };

    Step::Reply(reply)
}

/// Fetch the table, match the query and format the report
pub async fn run_search(ctx: &AppContext, query: &Query, language_code: Option<&str>) -> Reply {
    let data = match ctx.sheets.get_all_data(false).await {
        Ok(data) => data,
        Err(e) => {
            error!(error = %e, "Spreadsheet unavailable for search");
            return Reply::main_menu(Screen::ConnectionError);
        }
    };

    let results = ctx.search.search_by_all_fields(data.iter(), query);
    info!(results = results.len(), "Combined search completed");

    let report = format_results(&results, ctx.search.columns(), &ctx.l10n, language_code);
    Reply::new(
        Screen::Results(report),
        Some(Menu::PostResults),
        SearchDialogueState::ShowingResults,
    )
}

/// Reply used when the results could not be delivered
pub fn search_failed() -> Reply {
    Reply::main_menu(Screen::SearchError)
}
