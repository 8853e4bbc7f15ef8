//! # Sheets Error Types Module
//!
//! This module defines the error type returned by the spreadsheet data source.
//! Every variant is a recoverable connection-level failure: callers report it to the
//! user as "try again later" and keep serving.

/// Custom error types for spreadsheet access
#[derive(Debug, Clone, PartialEq)]
pub enum SheetsError {
    /// Credential file missing, unreadable or malformed
    Credentials(String),
    /// Token exchange with the OAuth endpoint failed
    Auth(String),
    /// Network-level failure talking to the API
    Transport(String),
    /// The API answered with a non-success status
    Api { status: u16, message: String },
    /// The API answered with a body that could not be decoded
    Parse(String),
}

impl std::fmt::Display for SheetsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsError::Credentials(msg) => write!(f, "Credentials error: {msg}"),
            SheetsError::Auth(msg) => write!(f, "Authentication error: {msg}"),
            SheetsError::Transport(msg) => write!(f, "Transport error: {msg}"),
            SheetsError::Api { status, message } => {
                write!(f, "Sheets API error (HTTP {status}): {message}")
            }
            SheetsError::Parse(msg) => write!(f, "Response parse error: {msg}"),
        }
    }
}

impl std::error::Error for SheetsError {}

impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SheetsError::Parse(err.to_string())
        } else {
            SheetsError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SheetsError::Api {
            status: 403,
            message: "The caller does not have permission".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sheets API error (HTTP 403): The caller does not have permission"
        );

        let err = SheetsError::Credentials("file not found".to_string());
        assert_eq!(err.to_string(), "Credentials error: file not found");
    }
}
