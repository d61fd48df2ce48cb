//! Persisted OAuth credential.
//!
//! A single token file is written once by the authorization helper and read
//! on every benchmark run. Loading never fails: a missing, unreadable,
//! malformed, or expired token is reported as "no credential" and the caller
//! falls back to the next credential source.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::Result;

/// Authorization artifact for the Google APIs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Absolute expiry; `None` means the issuer did not say.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credential {
    /// Build a credential from a token endpoint response.
    pub fn from_token_response(response: TokenResponse, scopes: &[&str]) -> Self {
        let expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        let scopes = match response.scope {
            Some(s) => s.split_whitespace().map(str::to_string).collect(),
            None => scopes.iter().map(|s| s.to_string()).collect(),
        };
        Credential {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type.unwrap_or_else(default_token_type),
            scopes,
            expiry,
        }
    }

    /// Valid means usable right now: a non-empty token that has not expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.trim().is_empty() {
            return false;
        }
        match self.expiry {
            Some(expiry) => expiry > now,
            None => true,
        }
    }

    /// [`Credential::is_valid_at`] against the current time.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Body returned by the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// File-backed store for the single persisted credential.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a token file is present, valid or not.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted credential if it is present and currently valid.
    pub fn load(&self) -> Option<Credential> {
        if !self.path.exists() {
            return None;
        }
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "token unreadable");
                return None;
            }
        };
        let credential: Credential = match serde_json::from_slice(&bytes) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "token malformed");
                return None;
            }
        };
        if credential.is_valid() {
            Some(credential)
        } else {
            debug!(path = %self.path.display(), "token expired or empty");
            None
        }
    }

    /// Persist the credential atomically (temp file in the same directory, then rename).
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let content = serde_json::to_vec_pretty(credential)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&content)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
