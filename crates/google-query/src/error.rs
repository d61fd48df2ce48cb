//! Error types for google-query

use thiserror::Error;

/// Errors raised while obtaining or persisting credentials.
#[derive(Error, Debug)]
pub enum GoogleQueryError {
    /// Client secrets file is missing
    #[error("client secrets file not found: {0}")]
    ClientSecretsNotFound(String),

    /// Client secrets file has neither an `installed` nor a `web` section
    #[error("invalid client secrets: {0}")]
    InvalidClientSecrets(String),

    /// Service account key could not be parsed or used
    #[error("invalid service account key: {0}")]
    InvalidServiceAccount(String),

    /// Authorization flow did not produce a code
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// Token endpoint rejected the exchange
    #[error("token exchange failed ({status}): {body}")]
    TokenExchange { status: u16, body: String },

    /// OAuth token endpoint refused the authorization code
    #[error("token exchange rejected: {0}")]
    TokenRejected(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for GoogleQueryError {
    fn from(err: reqwest::Error) -> Self {
        GoogleQueryError::Http(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for GoogleQueryError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        GoogleQueryError::InvalidServiceAccount(err.to_string())
    }
}

impl From<url::ParseError> for GoogleQueryError {
    fn from(err: url::ParseError) -> Self {
        GoogleQueryError::Authorization(format!("bad URL: {err}"))
    }
}

/// Errors raised by a read-only remote query.
///
/// Callers decide how to degrade: [`RemoteQueryError::is_degradable`] marks the
/// variants that should turn into an empty result set rather than a recorded
/// check error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteQueryError {
    /// No credential, so the service was never initialised
    #[error("{service} service not available")]
    Unavailable { service: String },

    /// The API answered with a non-success status
    #[error("{service} API error ({status}): {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    /// Request never got an answer (connect, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body did not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),
}

impl RemoteQueryError {
    /// Whether the caller should log this and continue with an empty result.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            RemoteQueryError::Unavailable { .. } | RemoteQueryError::Api { .. }
        )
    }
}

impl From<reqwest::Error> for RemoteQueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteQueryError::Decode(err.to_string())
        } else {
            RemoteQueryError::Transport(err.to_string())
        }
    }
}

/// Result alias for remote queries.
pub type QueryResult<T> = std::result::Result<T, RemoteQueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradable_variants() {
        let unavailable = RemoteQueryError::Unavailable {
            service: "Gmail".to_string(),
        };
        assert!(unavailable.is_degradable());

        let api = RemoteQueryError::Api {
            service: "Calendar".to_string(),
            status: 403,
            message: "forbidden".to_string(),
        };
        assert!(api.is_degradable());

        assert!(!RemoteQueryError::Transport("connection reset".to_string()).is_degradable());
        assert!(!RemoteQueryError::Decode("missing field".to_string()).is_degradable());
    }

    #[test]
    fn test_error_display() {
        let err = RemoteQueryError::Api {
            service: "Gmail".to_string(),
            status: 500,
            message: "backend error".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Gmail"));
        assert!(msg.contains("500"));

        let err = GoogleQueryError::TokenExchange {
            status: 400,
            body: "invalid_grant".to_string(),
        };
        assert!(err.to_string().contains("invalid_grant"));
    }
}
