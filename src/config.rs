//! # Configuration Module
//!
//! This module defines configuration structures for the bot: Telegram credentials,
//! the spreadsheet data source, logging and the spreadsheet column layout.
//! Values are read from environment variables (optionally populated from a `.env` file).

use std::path::PathBuf;

// Environment variable names
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_SPREADSHEET_ID: &str = "SPREADSHEET_ID";
pub const ENV_SHEET_NAME: &str = "SHEET_NAME";
pub const ENV_CREDENTIALS_PATH: &str = "GOOGLE_CREDENTIALS_PATH";
pub const ENV_SHEETS_API_BASE: &str = "SHEETS_API_BASE";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "LOG_FILE";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
pub const ENV_CACHE_TTL_SECS: &str = "CACHE_TTL_SECS";

// Defaults
pub const DEFAULT_CREDENTIALS_PATH: &str = "config/google_credentials.json";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FILE: &str = "logs/bot.log";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300; // 5 minutes, not enforced by the cache

/// Read-only scope requested for the service account
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Errors raised while loading configuration at startup
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required variable is absent or blank
    Missing(&'static str),
    /// A variable is present but cannot be parsed
    Invalid { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "Invalid value for {key}: {value}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Header names of the spreadsheet columns the bot reads
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnsConfig {
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub class: String,
    pub participant_id: String,
    pub subjects: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            surname: "Фамилия".to_string(),
            name: "Имя".to_string(),
            patronymic: "Отчество".to_string(),
            class: "Класс".to_string(),
            participant_id: "ID участника".to_string(),
            subjects: "Предметы".to_string(),
        }
    }
}

impl ColumnsConfig {
    /// Whether `field_name` is one of the four searchable columns
    pub fn is_searchable(&self, field_name: &str) -> bool {
        [&self.surname, &self.name, &self.patronymic, &self.class]
            .iter()
            .any(|column| column.as_str() == field_name)
    }
}

/// Spreadsheet data source settings
#[derive(Debug, Clone, PartialEq)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// Empty means the first sheet of the spreadsheet
    pub sheet_name: Option<String>,
    pub credentials_path: PathBuf,
    pub api_base: String,
    /// Loaded for operators; the cache is only invalidated explicitly
    pub cache_ttl_secs: u64,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>, credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: None,
            credentials_path: credentials_path.into(),
            api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub level: String,
    pub file: PathBuf,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: PathBuf::from(DEFAULT_LOG_FILE),
            format: LogFormat::Text,
        }
    }
}

/// Complete bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub sheets: SheetsConfig,
    pub logging: LogConfig,
    pub columns: ColumnsConfig,
}

impl BotConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bot_token = get(ENV_BOT_TOKEN).ok_or(ConfigError::Missing(ENV_BOT_TOKEN))?;
        let spreadsheet_id =
            get(ENV_SPREADSHEET_ID).ok_or(ConfigError::Missing(ENV_SPREADSHEET_ID))?;

        let cache_ttl_secs = match get(ENV_CACHE_TTL_SECS) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: ENV_CACHE_TTL_SECS,
                value,
            })?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let format = match get(ENV_LOG_FORMAT).map(|v| v.to_lowercase()).as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: ENV_LOG_FORMAT,
                    value: other.to_string(),
                })
            }
        };

        let sheets = SheetsConfig {
            spreadsheet_id,
            sheet_name: get(ENV_SHEET_NAME),
            credentials_path: PathBuf::from(
                get(ENV_CREDENTIALS_PATH).unwrap_or_else(|| DEFAULT_CREDENTIALS_PATH.to_string()),
            ),
            api_base: get(ENV_SHEETS_API_BASE)
                .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string()),
            cache_ttl_secs,
        };

        let logging = LogConfig {
            level: get(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            file: PathBuf::from(get(ENV_LOG_FILE).unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())),
            format,
        };

        Ok(Self {
            bot_token,
            sheets,
            logging,
            columns: ColumnsConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = BotConfig::from_lookup(lookup(&[
            (ENV_BOT_TOKEN, "123:abc"),
            (ENV_SPREADSHEET_ID, "sheet-id"),
        ]))
        .unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.sheets.spreadsheet_id, "sheet-id");
        assert_eq!(config.sheets.sheet_name, None);
        assert_eq!(
            config.sheets.credentials_path,
            PathBuf::from(DEFAULT_CREDENTIALS_PATH)
        );
        assert_eq!(config.sheets.api_base, DEFAULT_SHEETS_API_BASE);
        assert_eq!(config.sheets.cache_ttl_secs, 300);
        assert_eq!(config.logging, LogConfig::default());
    }

    #[test]
    fn test_missing_required_values() {
        let err = BotConfig::from_lookup(lookup(&[(ENV_SPREADSHEET_ID, "sheet-id")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_BOT_TOKEN));

        // Whitespace-only token is treated as missing
        let err = BotConfig::from_lookup(lookup(&[(ENV_BOT_TOKEN, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_BOT_TOKEN));

        let err = BotConfig::from_lookup(lookup(&[(ENV_BOT_TOKEN, "t")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ENV_SPREADSHEET_ID));
        assert_eq!(err.to_string(), "SPREADSHEET_ID must be set");
    }

    #[test]
    fn test_optional_overrides() {
        let config = BotConfig::from_lookup(lookup(&[
            (ENV_BOT_TOKEN, "t"),
            (ENV_SPREADSHEET_ID, "s"),
            (ENV_SHEET_NAME, "Участники"),
            (ENV_LOG_FORMAT, "JSON"),
            (ENV_CACHE_TTL_SECS, "60"),
        ]))
        .unwrap();

        assert_eq!(config.sheets.sheet_name.as_deref(), Some("Участники"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.sheets.cache_ttl_secs, 60);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = BotConfig::from_lookup(lookup(&[
            (ENV_BOT_TOKEN, "t"),
            (ENV_SPREADSHEET_ID, "s"),
            (ENV_CACHE_TTL_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_CACHE_TTL_SECS, .. }));
    }

    #[test]
    fn test_searchable_columns() {
        let columns = ColumnsConfig::default();
        assert!(columns.is_searchable("Фамилия"));
        assert!(columns.is_searchable("Класс"));
        assert!(!columns.is_searchable("Предметы"));
        assert!(!columns.is_searchable("фамилия"));
    }
}
