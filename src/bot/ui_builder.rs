//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::config::ColumnsConfig;
use crate::dialogue::CallbackAction;
use crate::localization::LocalizationManager;
use crate::record::Record;

pub const RESULT_SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━";
pub const SUBJECT_BULLET: &str = "   • ";

/// Inline menus shown under bot messages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Menu {
    /// Start search + help
    Main,
    /// Cancel only, shown while waiting for the query
    Cancel,
    /// New search + back to menu
    PostResults,
}

/// Everything the bot can show to the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Welcome { first_name: String },
    /// Full help for the /help command
    Help,
    /// Short help opened from the main menu
    HelpMenu,
    QueryPrompt,
    EmptyQuery,
    NotEnoughData,
    Searching,
    Results(String),
    ConnectionError,
    SearchError,
    MainMenu,
    Cancelled,
    TextOutsideSearch,
    UnknownCommand,
    GenericError,
}

impl Screen {
    /// Whether the rendered text carries HTML markup
    pub fn uses_html(&self) -> bool {
        matches!(
            self,
            Screen::Help | Screen::HelpMenu | Screen::QueryPrompt | Screen::NotEnoughData
        )
    }
}

/// Render a screen into message text
pub fn render_text(screen: &Screen, l10n: &LocalizationManager, language_code: Option<&str>) -> String {
    let t = |key: &str| l10n.t(key, language_code);

    match screen {
        Screen::Welcome { first_name } => format!(
            "{}\n\n{}\n\n{}\n{}\n{}\n{}\n{}\n\n{}",
            l10n.t_args("welcome-greeting", &[("name", first_name.as_str())], language_code),
            t("welcome-description"),
            t("welcome-fields-title"),
            t("welcome-field-surname"),
            t("welcome-field-name"),
            t("welcome-field-patronymic"),
            t("welcome-field-class"),
            t("welcome-start")
        ),
        Screen::Help => [
            t("help-title"),
            [t("help-commands-title"), t("help-command-start"), t("help-command-help")].join("\n"),
            usage_section(&t),
            features_section(&t),
            [t("help-results-title"), t("help-result-id"), t("help-result-subjects")].join("\n"),
        ]
        .join("\n\n"),
        Screen::HelpMenu => [t("help-title"), usage_section(&t), features_section(&t)].join("\n\n"),
        Screen::QueryPrompt => format!(
            "{}\n\n{}\n\n{}",
            t("search-prompt-title"),
            t("search-format"),
            t("search-example")
        ),
        Screen::EmptyQuery => format!("{}\n\n{}", t("search-empty-input"), t("search-format")),
        Screen::NotEnoughData => format!(
            "{}\n\n{}\n{}",
            t("search-not-enough-data"),
            t("search-format"),
            t("search-example")
        ),
        Screen::Searching => t("searching"),
        Screen::Results(report) => report.clone(),
        Screen::ConnectionError => format!("{}\n{}", t("error-connection"), t("error-try-later")),
        Screen::SearchError => t("error-search"),
        Screen::MainMenu => format!("{}\n\n{}", t("main-menu-title"), t("choose-action")),
        Screen::Cancelled => format!("{}\n\n{}", t("cancelled"), t("choose-action")),
        Screen::TextOutsideSearch => t("text-outside-search"),
        Screen::UnknownCommand => t("unknown-command"),
        Screen::GenericError => t("error-generic"),
    }
}

fn usage_section(t: &impl Fn(&str) -> String) -> String {
    [t("help-usage-title"), t("help-step1"), t("help-step2"), t("help-step3")].join("\n")
}

fn features_section(t: &impl Fn(&str) -> String) -> String {
    [
        t("help-features-title"),
        t("help-feature-case"),
        t("help-feature-exact"),
        t("help-feature-all"),
    ]
    .join("\n")
}

/// Create the inline keyboard for a menu, one button per row
pub fn create_keyboard(
    menu: Menu,
    l10n: &LocalizationManager,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let button = |key: &str, action: CallbackAction| {
        vec![InlineKeyboardButton::callback(
            l10n.t(key, language_code),
            action.as_str(),
        )]
    };

    let rows = match menu {
        Menu::Main => vec![
            button("button-start-search", CallbackAction::StartSearch),
            button("button-help", CallbackAction::ShowHelp),
        ],
        Menu::Cancel => vec![button("button-cancel", CallbackAction::Cancel)],
        Menu::PostResults => vec![
            button("button-new-search", CallbackAction::NewSearch),
            button("button-main-menu", CallbackAction::BackToMenu),
        ],
    };

    InlineKeyboardMarkup::new(rows)
}

/// Format matched records as a report
pub fn format_results(
    results: &[&Record],
    columns: &ColumnsConfig,
    l10n: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    if results.is_empty() {
        return l10n.t("results-none", language_code);
    }

    let missing = l10n.t("result-missing-value", language_code);
    let field = |record: &Record, column: &str| {
        record
            .get(column)
            .map(str::to_string)
            .unwrap_or_else(|| missing.clone())
    };

    let count = results.len().to_string();
    let mut parts = vec![format!(
        "{}\n",
        l10n.t_args("results-count", &[("count", count.as_str())], language_code)
    )];

    for (idx, &record) in results.iter().enumerate() {
        let index = (idx + 1).to_string();
        let surname = field(record, &columns.surname);
        let name = field(record, &columns.name);
        let patronymic = field(record, &columns.patronymic);
        let class = field(record, &columns.class);
        let participant_id = field(record, &columns.participant_id);

        parts.push(RESULT_SEPARATOR.to_string());
        parts.push(l10n.t_args("result-title", &[("index", index.as_str())], language_code));
        parts.push(String::new());

        parts.push(l10n.t_args(
            "result-full-name",
            &[
                ("surname", surname.as_str()),
                ("name", name.as_str()),
                ("patronymic", patronymic.as_str()),
            ],
            language_code,
        ));
        parts.push(l10n.t_args("result-class", &[("class", class.as_str())], language_code));
        parts.push(String::new());

        parts.push(l10n.t_args(
            "result-participant-id",
            &[("id", participant_id.as_str())],
            language_code,
        ));
        parts.push(l10n.t("result-subjects", language_code));

        // One bullet per non-empty line of the subjects cell
        let subjects: Vec<&str> = record
            .get(&columns.subjects)
            .unwrap_or("")
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if subjects.is_empty() {
            parts.push(format!(
                "{SUBJECT_BULLET}{}",
                l10n.t("result-subjects-none", language_code)
            ));
        } else {
            parts.extend(subjects.iter().map(|line| format!("{SUBJECT_BULLET}{line}")));
        }

        parts.push(String::new());
    }

    parts.join("\n")
}
