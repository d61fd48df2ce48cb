//! Service-account fallback credential (JWT-bearer grant).

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{DEFAULT_TOKEN_URI, OAUTH_SCOPES};
use crate::credentials::{Credential, TokenResponse};
use crate::error::GoogleQueryError;
use crate::Result;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Fields of a service-account key file that the grant needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let key: ServiceAccountKey = serde_json::from_str(&content)?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(GoogleQueryError::InvalidServiceAccount(
                "client_email and private_key are required".to_string(),
            ));
        }
        Ok(key)
    }

    /// Signed RS256 assertion for the read-only scopes.
    pub fn assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.client_email,
            scope: OAUTH_SCOPES.join(" "),
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }
}

/// Exchange a signed assertion for an access token.
pub async fn exchange_service_account_token(
    http_client: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<Credential> {
    let assertion = key.assertion()?;
    let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];
    let response = http_client.post(&key.token_uri).form(&params).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GoogleQueryError::TokenExchange {
            status: status.as_u16(),
            body,
        });
    }
    let token: TokenResponse = response.json().await?;
    info!(client_email = %key.client_email, "service account token obtained");
    Ok(Credential::from_token_response(token, &OAUTH_SCOPES))
}
