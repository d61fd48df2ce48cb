//! Google endpoint and credential-path configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default Gmail REST base URL.
pub const DEFAULT_GMAIL_BASE_URL: &str = "https://gmail.googleapis.com";
/// Default Calendar REST base URL.
pub const DEFAULT_CALENDAR_BASE_URL: &str = "https://www.googleapis.com";
/// Default OAuth token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Read-only scopes requested for the benchmark checks.
pub const OAUTH_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/calendar.readonly",
];

/// Google configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Where the interactive OAuth token is persisted
    pub token_path: PathBuf,
    /// OAuth client file downloaded from the Cloud Console
    pub client_secrets_path: PathBuf,
    /// Optional service-account key used when no OAuth token exists
    pub service_account_path: Option<PathBuf>,
    /// Gmail API base URL
    pub gmail_base_url: String,
    /// Calendar API base URL
    pub calendar_base_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        GoogleConfig {
            token_path: std::env::var("FAILBENCH_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("token.json")),
            client_secrets_path: std::env::var("FAILBENCH_CLIENT_SECRETS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("oauth_credentials.json")),
            service_account_path: std::env::var("GOOGLE_CREDENTIALS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            gmail_base_url: std::env::var("FAILBENCH_GMAIL_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GMAIL_BASE_URL.to_string()),
            calendar_base_url: std::env::var("FAILBENCH_CALENDAR_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_CALENDAR_BASE_URL.to_string()),
        }
    }
}

impl GoogleConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Point both APIs at the same base URL (used against mock servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        self.gmail_base_url = base.clone();
        self.calendar_base_url = base;
        self
    }

    /// Override the token path
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Override the OAuth client file path
    pub fn with_client_secrets(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_secrets_path = path.into();
        self
    }

    /// Override the service-account key path
    pub fn with_service_account(mut self, path: impl Into<PathBuf>) -> Self {
        self.service_account_path = Some(path.into());
        self
    }
}
