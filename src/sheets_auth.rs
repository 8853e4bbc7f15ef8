//! # Sheets Authentication Module
//!
//! Service-account authentication for the Google Sheets API. A signed JWT
//! assertion is exchanged for a short-lived bearer token, which is reused until
//! shortly before it expires.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::SHEETS_READONLY_SCOPE;
use crate::sheets_errors::SheetsError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Token lifetime to trust, bounded so odd `expires_in` values cannot overflow
fn token_lifetime(expires_in: Option<i64>) -> i64 {
    expires_in
        .unwrap_or(ASSERTION_LIFETIME_SECS)
        .clamp(0, ASSERTION_LIFETIME_SECS)
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Fields of a Google service-account key file that the bot needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

// Keep the private key out of logs
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(json)
            .map_err(|e| SheetsError::Credentials(format!("Invalid credentials file: {e}")))
    }

    pub async fn from_file(path: &Path) -> Result<Self, SheetsError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            SheetsError::Credentials(format!(
                "Cannot read credentials file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Authenticated access to the Sheets API for one service account
pub struct TokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    /// Validate the key material; no network access happens here
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self, SheetsError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetsError::Credentials(format!("Invalid private key: {e}")))?;

        Ok(Self {
            key,
            encoding_key,
            http,
            token: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Current bearer token, requesting a new one when missing or about to expire
    pub async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
            debug!("Access token expired, requesting a new one");
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, SheetsError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SHEETS_READONLY_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| SheetsError::Auth(format!("Failed to sign assertion: {e}")))
    }

    async fn request_token(&self) -> Result<AccessToken, SheetsError> {
        let now = Utc::now();
        let assertion = self.sign_assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!(
                "Token endpoint returned HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetsError::Auth(format!("Malformed token response: {e}")))?;

        let lifetime = token_lifetime(token.expires_in);
        info!(
            client_email = %self.key.client_email,
            expires_in = lifetime,
            "Obtained Sheets API access token"
        );

        Ok(AccessToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "bot@project.iam.gserviceaccount.com", "private_key": "pem"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(key.private_key_id, None);
    }

    #[test]
    fn test_key_debug_hides_private_key() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "bot@example.com", "private_key": "SECRET-MATERIAL"}"#,
        )
        .unwrap();
        assert!(!format!("{key:?}").contains("SECRET-MATERIAL"));
    }

    #[test]
    fn test_malformed_key_file() {
        let err = ServiceAccountKey::from_json(r#"{"client_email": 1}"#).unwrap_err();
        assert!(matches!(err, SheetsError::Credentials(_)));
    }

    #[test]
    fn test_invalid_private_key_rejected() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "bot@example.com", "private_key": "not a pem"}"#,
        )
        .unwrap();
        let result = TokenProvider::new(key, reqwest::Client::new());
        assert!(matches!(result, Err(SheetsError::Credentials(_))));
    }

    #[test]
    fn test_token_lifetime_bounded() {
        assert_eq!(token_lifetime(None), ASSERTION_LIFETIME_SECS);
        assert_eq!(token_lifetime(Some(1800)), 1800);
        assert_eq!(token_lifetime(Some(-5)), 0);
        assert_eq!(token_lifetime(Some(i64::MAX)), ASSERTION_LIFETIME_SECS);

        // Extreme values still produce a usable expiry
        let now = Utc::now();
        let expires_at = now + Duration::seconds(token_lifetime(Some(i64::MAX)));
        assert!(expires_at > now);
    }

    #[test]
    fn test_token_freshness_margin() {
        let now = Utc::now();
        let token = AccessToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(!token.is_fresh(now));

        let token = AccessToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(3600),
        };
        assert!(token.is_fresh(now));
    }
}
