//! Installed-application OAuth flow.
//!
//! One-time setup: bind a loopback listener, send the user to Google's consent
//! page, catch the redirect carrying the authorization code, and exchange the
//! code for a token. URL construction, CSRF state and the token exchange go
//! through `oauth2`; the redirect is served by `tiny_http`.

use std::collections::HashMap;
use std::path::Path;

use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, RedirectUrl, RequestTokenError, Scope, TokenUrl,
};
use serde::Deserialize;
use tiny_http::{Request, Response, Server};
use tracing::{debug, info, warn};
use url::{form_urlencoded, Url};

use crate::config::{DEFAULT_TOKEN_URI, OAUTH_SCOPES};
use crate::credentials::{Credential, CredentialStore, TokenResponse};
use crate::error::GoogleQueryError;
use crate::Result;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const SUCCESS_PAGE: &str =
    "The authentication flow has completed. You may close this window.";

type GoogleOAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// OAuth client identity from the Cloud Console download.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse the downloaded client file (`installed` or `web` section).
    pub fn from_json(content: &str) -> Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(content)?;
        file.installed.or(file.web).ok_or_else(|| {
            GoogleQueryError::InvalidClientSecrets(
                "expected an \"installed\" or \"web\" section".to_string(),
            )
        })
    }

    /// Read and parse the client file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GoogleQueryError::ClientSecretsNotFound(
                path.display().to_string(),
            ));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Authorization-code flow for an installed application.
pub struct InstalledFlow {
    secrets: ClientSecrets,
    scopes: Vec<String>,
    open_browser: bool,
    http_client: reqwest::Client,
}

/// A flow waiting for the browser redirect.
pub struct PendingAuthorization {
    server: Server,
    redirect_uri: String,
    state: CsrfToken,
    auth_url: Url,
}

impl PendingAuthorization {
    /// Consent page the user must visit.
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Loopback address registered as the redirect target.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

impl InstalledFlow {
    /// Create a flow requesting the read-only Gmail and Calendar scopes.
    pub fn new(secrets: ClientSecrets) -> Self {
        // The token endpoint must not be followed through redirects.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();
        InstalledFlow {
            secrets,
            scopes: OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
            open_browser: true,
            http_client,
        }
    }

    /// Disable the attempt to launch a browser; the URL is still printed.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    fn client(&self, redirect_uri: &str) -> Result<GoogleOAuthClient> {
        Ok(BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.secrets.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(self.secrets.auth_uri.clone())?)
            .set_token_uri(TokenUrl::new(self.secrets.token_uri.clone())?)
            .set_redirect_uri(RedirectUrl::new(redirect_uri.to_string())?)
            .set_auth_type(AuthType::RequestBody))
    }

    /// Build the consent URL for `redirect_uri` carrying `state`.
    pub fn authorization_url(&self, redirect_uri: &str, state: CsrfToken) -> Result<Url> {
        let (url, _) = self
            .client(redirect_uri)?
            .authorize_url(move || state)
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();
        Ok(url)
    }

    /// Bind the loopback listener on an ephemeral port and prepare the consent URL.
    pub async fn start(&self) -> Result<PendingAuthorization> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|e| GoogleQueryError::Authorization(format!("callback listener: {e}")))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| {
                GoogleQueryError::Authorization("callback listener has no TCP port".to_string())
            })?;
        let redirect_uri = format!("http://127.0.0.1:{port}/");
        let state = CsrfToken::new_random();
        let auth_url = self.authorization_url(&redirect_uri, state.clone())?;
        debug!(port, "oauth callback listener bound");
        Ok(PendingAuthorization {
            server,
            redirect_uri,
            state,
            auth_url,
        })
    }

    /// Wait for the redirect, then exchange its code for a credential.
    pub async fn complete(&self, pending: PendingAuthorization) -> Result<Credential> {
        let PendingAuthorization {
            server,
            redirect_uri,
            state,
            ..
        } = pending;
        let code = tokio::task::spawn_blocking(move || wait_for_code(&server, state.secret()))
            .await
            .map_err(|e| GoogleQueryError::Authorization(format!("callback listener: {e}")))??;
        self.exchange_code(&code, &redirect_uri).await
    }

    /// Full interactive run: start, show the consent page, complete.
    pub async fn run_local_server(&self) -> Result<Credential> {
        let pending = self.start().await?;
        println!("Please log in and authorize access to Gmail and Calendar:");
        println!("{}", pending.auth_url());
        if self.open_browser {
            open_in_browser(pending.auth_url().as_str());
        }
        self.complete(pending).await
    }

    /// Exchange an authorization code at the token endpoint.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Credential> {
        let token = self
            .client(redirect_uri)?
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(token_error)?;
        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        info!("authorization code exchanged for token");
        Ok(Credential::from_token_response(token_response(&token), &scopes))
    }
}

/// Run the interactive flow and persist the resulting credential.
pub async fn authorize_interactive(
    secrets: ClientSecrets,
    store: &CredentialStore,
    open_browser: bool,
) -> Result<Credential> {
    let mut flow = InstalledFlow::new(secrets);
    if !open_browser {
        flow = flow.without_browser();
    }
    let credential = flow.run_local_server().await?;
    store.save(&credential)?;
    info!(path = %store.path().display(), "token saved");
    Ok(credential)
}

/// Serve callback requests until one carries a code. Requests without a code
/// (e.g. favicon) are answered and skipped.
fn wait_for_code(server: &Server, expected_state: &str) -> Result<String> {
    for request in server.incoming_requests() {
        debug!(url = %request.url(), "oauth callback request");
        let params = callback_params(request.url());

        if let Some(error) = params.get("error") {
            respond(request, 200, "Authorization was denied.");
            return Err(GoogleQueryError::Authorization(error.clone()));
        }
        let Some(code) = params.get("code") else {
            respond(request, 404, "not found");
            continue;
        };
        if params.get("state").map(String::as_str) != Some(expected_state) {
            respond(request, 400, "state mismatch");
            return Err(GoogleQueryError::Authorization(
                "state parameter mismatch".to_string(),
            ));
        }

        respond(request, 200, SUCCESS_PAGE);
        return Ok(code.clone());
    }
    Err(GoogleQueryError::Authorization(
        "callback listener closed before a code arrived".to_string(),
    ))
}

fn callback_params(target: &str) -> HashMap<String, String> {
    let query = target.split_once('?').map(|(_, q)| q).unwrap_or("");
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

fn respond(request: Request, status: u16, body: &str) {
    let response = Response::from_string(body).with_status_code(status);
    if let Err(e) = request.respond(response) {
        warn!(error = %e, "failed to answer oauth callback");
    }
}

fn token_response(token: &BasicTokenResponse) -> TokenResponse {
    use oauth2::TokenResponse as _;

    TokenResponse {
        access_token: token.access_token().secret().clone(),
        refresh_token: token.refresh_token().map(|t| t.secret().clone()),
        token_type: Some("Bearer".to_string()),
        expires_in: token.expires_in().map(|d| d.as_secs() as i64),
        scope: token.scopes().map(|scopes| {
            scopes
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        }),
    }
}

fn token_error<RE: std::error::Error + 'static>(
    err: RequestTokenError<RE, BasicErrorResponse>,
) -> GoogleQueryError {
    match err {
        RequestTokenError::ServerResponse(response) => {
            GoogleQueryError::TokenRejected(response.to_string())
        }
        RequestTokenError::Parse(e, body) => GoogleQueryError::TokenRejected(format!(
            "{e}: {}",
            String::from_utf8_lossy(&body)
        )),
        RequestTokenError::Request(e) => GoogleQueryError::Http(e.to_string()),
        RequestTokenError::Other(message) => GoogleQueryError::TokenRejected(message),
    }
}

fn open_in_browser(url: &str) {
    let mut command = if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        std::process::Command::new("xdg-open")
    };
    if let Err(e) = command.arg(url).spawn() {
        warn!(error = %e, "could not launch a browser; open the URL manually");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTALLED: &str = r#"{
        "installed": {
            "client_id": "123.apps.googleusercontent.com",
            "client_secret": "shh",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "redirect_uris": ["http://localhost"]
        }
    }"#;

    #[test]
    fn parses_installed_section() {
        let secrets = ClientSecrets::from_json(INSTALLED).unwrap();
        assert_eq!(secrets.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secrets.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn parses_web_section_with_defaults() {
        let secrets =
            ClientSecrets::from_json(r#"{"web":{"client_id":"id","client_secret":"s"}}"#).unwrap();
        assert_eq!(secrets.auth_uri, DEFAULT_AUTH_URI);
        assert_eq!(secrets.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn rejects_file_without_known_section() {
        let err = ClientSecrets::from_json(r#"{"other":{}}"#).unwrap_err();
        assert!(matches!(err, GoogleQueryError::InvalidClientSecrets(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientSecrets::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, GoogleQueryError::ClientSecretsNotFound(_)));
    }

    #[test]
    fn authorization_url_carries_scopes_and_state() {
        let flow = InstalledFlow::new(ClientSecrets::from_json(INSTALLED).unwrap());
        let url = flow
            .authorization_url("http://127.0.0.1:8080/", CsrfToken::new("xyz".to_string()))
            .unwrap();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["redirect_uri"], "http://127.0.0.1:8080/");
        assert!(params["scope"].contains("gmail.readonly"));
        assert!(params["scope"].contains("calendar.readonly"));
    }

    #[test]
    fn callback_params_decode_query() {
        let params = callback_params("/?code=4%2Fabc&state=s1");
        assert_eq!(params["code"], "4/abc");
        assert_eq!(params["state"], "s1");

        assert!(callback_params("/favicon.ico").is_empty());
    }
}
