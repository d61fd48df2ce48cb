//! Read-only Gmail and Google Calendar access for failbench.
//!
//! Provides:
//! - `CredentialStore`: the persisted OAuth token
//! - `InstalledFlow`: one-time interactive authorization
//! - `ServiceAccountKey`: fallback credential source
//! - `MessageSource` / `CalendarSource`: query seams, with a REST client,
//!   a disabled stand-in, and in-memory fakes

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fakes;
pub mod oauth;
pub mod records;
pub mod service_account;
pub mod source;

pub use client::{CalendarSource, DisabledClient, GoogleClient, MessageSource, MAX_EVENTS};
pub use config::{GoogleConfig, OAUTH_SCOPES};
pub use credentials::{Credential, CredentialStore, TokenResponse};
pub use error::{GoogleQueryError, QueryResult, RemoteQueryError};
pub use oauth::{authorize_interactive, ClientSecrets, InstalledFlow, PendingAuthorization};
pub use records::{CalendarEventRecord, EmailRecord};
pub use service_account::{exchange_service_account_token, ServiceAccountKey};
pub use source::{connect, resolve_credential, CredentialSource, RemoteServices};

/// Result type for credential operations
pub type Result<T> = std::result::Result<T, GoogleQueryError>;
