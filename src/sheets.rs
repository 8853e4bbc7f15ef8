//! # Sheets Data Source Module
//!
//! Reads the participant table from Google Sheets and keeps the parsed result in
//! memory until it is explicitly invalidated.
//!
//! ## Cache lifecycle
//!
//! - The first successful fetch stores an `Arc<RecordSet>`
//! - Later calls hand out the same `Arc` without touching the network
//! - `get_all_data(true)` and `clear_cache()` force the next call to fetch again
//! - The cache is replaced wholesale, never edited; concurrent first fetches race
//!   and the last writer wins
//!
//! The configured cache TTL is not applied here.

use std::sync::Arc;

use reqwest::Url;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::SheetsConfig;
use crate::record::RecordSet;
use crate::sheets_auth::{ServiceAccountKey, TokenProvider};
use crate::sheets_errors::SheetsError;

/// Column span read from the sheet
const DATA_COLUMNS: &str = "A:Z";
const HEADER_COLUMNS: &str = "A1:Z1";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Build an A1 range, quoting sheet names that are not plain identifiers
pub fn a1_range(sheet_name: Option<&str>, columns: &str) -> String {
    match sheet_name {
        None => columns.to_string(),
        Some(name) if name.chars().all(|c| c.is_alphanumeric() || c == '_') => {
            format!("{name}!{columns}")
        }
        Some(name) => format!("'{}'!{columns}", name.replace('\'', "''")),
    }
}

/// Spreadsheet data source with an explicit-invalidation cache
pub struct SheetsService {
    config: SheetsConfig,
    http: reqwest::Client,
    connection: RwLock<Option<Arc<TokenProvider>>>,
    cache: RwLock<Option<Arc<RecordSet>>>,
}

impl SheetsService {
    pub fn new(config: SheetsConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            connection: RwLock::new(None),
            cache: RwLock::new(None),
        }
    }

    /// Load credentials and prepare authenticated access
    ///
    /// Safe to call repeatedly; an existing connection is kept.
    pub async fn connect(&self) -> Result<(), SheetsError> {
        if self.connection.read().await.is_some() {
            debug!("Sheets connection already established");
            return Ok(());
        }

        match self.open_connection().await {
            Ok(provider) => {
                info!(
                    client_email = %provider.client_email(),
                    spreadsheet_id = %self.config.spreadsheet_id,
                    "Successfully connected to Google Sheets API"
                );
                *self.connection.write().await = Some(Arc::new(provider));
                Ok(())
            }
            Err(e) => {
                error!(
                    credentials_path = %self.config.credentials_path.display(),
                    error = %e,
                    "Error connecting to Google Sheets API"
                );
                Err(e)
            }
        }
    }

    async fn open_connection(&self) -> Result<TokenProvider, SheetsError> {
        let key = ServiceAccountKey::from_file(&self.config.credentials_path).await?;
        TokenProvider::new(key, self.http.clone())
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    pub async fn has_cached_data(&self) -> bool {
        self.cache.read().await.is_some()
    }

    async fn provider(&self) -> Result<Arc<TokenProvider>, SheetsError> {
        if let Some(provider) = self.connection.read().await.as_ref() {
            return Ok(Arc::clone(provider));
        }

        self.connect().await?;
        self.connection
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| SheetsError::Credentials("connection not established".to_string()))
    }

    /// All records of the sheet, from cache unless `force_refresh` is set
    ///
    /// An empty table is `Ok` with no records; any fetch problem is `Err`.
    pub async fn get_all_data(&self, force_refresh: bool) -> Result<Arc<RecordSet>, SheetsError> {
        if !force_refresh {
            if let Some(cached) = self.cache.read().await.as_ref() {
                debug!(records = cached.len(), "Returning cached data");
                return Ok(Arc::clone(cached));
            }
        }

        let rows = match self.fetch_values(DATA_COLUMNS).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "Failed to fetch data from spreadsheet");
                return Err(e);
            }
        };

        if rows.is_empty() {
            warn!("No data found in spreadsheet");
        }

        let data = Arc::new(RecordSet::from_rows(rows));
        *self.cache.write().await = Some(Arc::clone(&data));
        info!(records = data.len(), "Successfully retrieved rows from spreadsheet");

        Ok(data)
    }

    /// Column headers of the sheet (first row only, never cached)
    pub async fn get_headers(&self) -> Result<Vec<String>, SheetsError> {
        let mut rows = self.fetch_values(HEADER_COLUMNS).await.map_err(|e| {
            error!(error = %e, "Error fetching headers");
            e
        })?;

        let headers = if rows.is_empty() {
            Vec::new()
        } else {
            rows.swap_remove(0)
        };
        info!(count = headers.len(), "Retrieved column headers");
        Ok(headers)
    }

    /// Drop cached data so the next read goes to the network
    pub async fn clear_cache(&self) {
        *self.cache.write().await = None;
        info!("Data cache cleared");
    }

    fn values_url(&self, range: &str) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| SheetsError::Transport(format!("Invalid API base URL: {e}")))?;

        url.path_segments_mut()
            .map_err(|_| SheetsError::Transport("API base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.config.spreadsheet_id.as_str(), "values", range]);

        Ok(url)
    }

    async fn fetch_values(&self, columns: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let provider = self.provider().await?;
        let token = provider.access_token().await?;

        let range = a1_range(self.config.sheet_name.as_deref(), columns);
        let url = self.values_url(&range)?;
        debug!(range = %range, "Fetching spreadsheet values");

        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsError::Parse(e.to_string()))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_range() {
        assert_eq!(a1_range(None, "A:Z"), "A:Z");
        assert_eq!(a1_range(Some("Sheet1"), "A:Z"), "Sheet1!A:Z");
        assert_eq!(a1_range(Some("Лист1"), "A1:Z1"), "Лист1!A1:Z1");
        assert_eq!(a1_range(Some("Class 10"), "A:Z"), "'Class 10'!A:Z");
        assert_eq!(a1_range(Some("O'Neil"), "A:Z"), "'O''Neil'!A:Z");
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(cell_to_string(serde_json::json!("10А")), "10А");
        assert_eq!(cell_to_string(serde_json::json!(42)), "42");
        assert_eq!(cell_to_string(serde_json::Value::Null), "");
    }

    #[test]
    fn test_values_url() {
        let mut config = SheetsConfig::new("sheet-id", "creds.json");
        config.api_base = "http://127.0.0.1:8080".to_string();
        let service = SheetsService::new(config);

        let url = service.values_url("A:Z").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/v4/spreadsheets/sheet-id/values/A:Z"
        );
    }
}
