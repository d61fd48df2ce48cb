//! Credential resolution and client construction.
//!
//! Order: persisted OAuth token, then the service-account key named by
//! `GOOGLE_CREDENTIALS_FILE`, then no remote access at all.

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{CalendarSource, DisabledClient, GoogleClient, MessageSource};
use crate::config::GoogleConfig;
use crate::credentials::{Credential, CredentialStore};
use crate::service_account::{exchange_service_account_token, ServiceAccountKey};

/// Where the credential in use came from.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    OAuth(Credential),
    ServiceAccount(Credential),
    Disabled,
}

impl CredentialSource {
    pub fn label(&self) -> &'static str {
        match self {
            CredentialSource::OAuth(_) => "oauth",
            CredentialSource::ServiceAccount(_) => "service_account",
            CredentialSource::Disabled => "disabled",
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            CredentialSource::OAuth(c) | CredentialSource::ServiceAccount(c) => Some(c),
            CredentialSource::Disabled => None,
        }
    }
}

/// Pick the first usable credential. Never fails; the worst case is `Disabled`.
pub async fn resolve_credential(
    config: &GoogleConfig,
    http_client: &reqwest::Client,
) -> CredentialSource {
    if let Some(credential) = CredentialStore::new(&config.token_path).load() {
        info!(path = %config.token_path.display(), "using OAuth token");
        return CredentialSource::OAuth(credential);
    }

    let Some(path) = config.service_account_path.as_ref().filter(|p| p.exists()) else {
        warn!("no Google credentials found");
        return CredentialSource::Disabled;
    };

    let key = match ServiceAccountKey::from_file(path) {
        Ok(k) => k,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read service account key");
            return CredentialSource::Disabled;
        }
    };
    match exchange_service_account_token(http_client, &key).await {
        Ok(credential) => {
            warn!("using service account (OAuth token not available)");
            CredentialSource::ServiceAccount(credential)
        }
        Err(e) => {
            warn!(error = %e, "failed to initialize Google API with service account");
            CredentialSource::Disabled
        }
    }
}

/// The two query seams handed to the evaluator.
#[derive(Clone)]
pub struct RemoteServices {
    pub messages: Arc<dyn MessageSource>,
    pub calendar: Arc<dyn CalendarSource>,
    pub source: &'static str,
}

impl RemoteServices {
    /// Build services for an already-resolved credential.
    pub fn from_source(
        config: &GoogleConfig,
        http_client: reqwest::Client,
        source: &CredentialSource,
    ) -> Self {
        match source.credential() {
            Some(credential) => {
                let client = Arc::new(GoogleClient::new(
                    http_client,
                    credential.clone(),
                    &config.gmail_base_url,
                    &config.calendar_base_url,
                ));
                info!(source = source.label(), "Google API services initialized");
                RemoteServices {
                    messages: client.clone(),
                    calendar: client,
                    source: source.label(),
                }
            }
            None => RemoteServices::disabled(),
        }
    }

    /// Services whose every query reports "unavailable".
    pub fn disabled() -> Self {
        RemoteServices {
            messages: Arc::new(DisabledClient),
            calendar: Arc::new(DisabledClient),
            source: "disabled",
        }
    }
}

/// Resolve a credential and build the query services.
pub async fn connect(config: &GoogleConfig) -> RemoteServices {
    let http_client = reqwest::Client::new();
    let source = resolve_credential(config, &http_client).await;
    RemoteServices::from_source(config, http_client, &source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn no_token_and_no_service_account_is_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GoogleConfig::from_env().with_token_path(dir.path().join("token.json"));
        config.service_account_path = None;
        let source = resolve_credential(&config, &reqwest::Client::new()).await;
        assert_eq!(source, CredentialSource::Disabled);
        assert!(source.credential().is_none());
    }

    #[tokio::test]
    async fn valid_token_wins() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        let credential = Credential {
            access_token: "ya29.ok".to_string(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            scopes: vec![],
            expiry: Some(Utc::now() + Duration::hours(1)),
        };
        CredentialStore::new(&token_path).save(&credential).unwrap();

        let config = GoogleConfig::from_env()
            .with_token_path(&token_path)
            .with_service_account(dir.path().join("missing-sa.json"));
        let source = resolve_credential(&config, &reqwest::Client::new()).await;
        assert_eq!(source.label(), "oauth");
        assert_eq!(source.credential(), Some(&credential));
    }

    #[tokio::test]
    async fn unreadable_service_account_is_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let sa_path = dir.path().join("sa.json");
        std::fs::write(&sa_path, "{}").unwrap();
        let config = GoogleConfig::from_env()
            .with_token_path(dir.path().join("token.json"))
            .with_service_account(&sa_path);
        let source = resolve_credential(&config, &reqwest::Client::new()).await;
        assert_eq!(source, CredentialSource::Disabled);
    }
}
