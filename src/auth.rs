use crate::credential::Credential;
use crate::gmail::GmailClient;
use crate::{FetchError, FetcherConfig, Result};
use chrono::{Duration, Utc};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl, Scope, TokenUrl,
};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

// ── ClientSecrets ────────────────────────────────────────────────────────────

/// The OAuth client registration downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,

    #[serde(default)]
    pub client_secret: Option<String>,

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

/// Top level of the secrets file: desktop clients use `installed`, web
/// clients use `web`.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Read a client secrets file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            FetchError::ClientSecrets(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Parse the contents of a client secrets file.
    ///
    /// ```
    /// use pdfgmailfetch::ClientSecrets;
    ///
    /// let secrets = ClientSecrets::from_json(
    ///     r#"{"installed": {"client_id": "abc.apps.googleusercontent.com", "client_secret": "s3cr3t"}}"#,
    /// ).unwrap();
    /// assert_eq!(secrets.client_id, "abc.apps.googleusercontent.com");
    /// assert_eq!(secrets.token_uri, "https://oauth2.googleapis.com/token");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| FetchError::ClientSecrets(format!("malformed client secrets: {e}")))?;

        file.installed.or(file.web).ok_or_else(|| {
            FetchError::ClientSecrets("expected an \"installed\" or \"web\" section".into())
        })
    }
}

// ── Token endpoint reply ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
}

// ── Authenticator ────────────────────────────────────────────────────────────

/// Produces a Gmail client authorized for the configured scopes.
///
/// The credential is read from the cache file, refreshed when it has
/// expired, or obtained through the browser consent flow when there is
/// nothing to refresh. Whatever is newly obtained is written back to the
/// cache.
pub struct Authenticator {
    token_path: PathBuf,
    client_secrets_path: PathBuf,
    scopes: Vec<String>,
    api_base: String,
    http: Client,
}

impl Authenticator {
    pub fn new(config: &FetcherConfig) -> Self {
        Self {
            token_path: config.token_path.clone(),
            client_secrets_path: config.client_secrets_path.clone(),
            scopes: config.scopes.clone(),
            api_base: config.gmail_api_base.clone(),
            http: Client::new(),
        }
    }

    /// Obtain a credential and bind a [`GmailClient`] to it.
    pub fn connect(&self) -> Result<GmailClient> {
        let credential = self.credential()?;
        Ok(GmailClient::with_api_base(
            credential.access_token,
            self.api_base.as_str(),
        ))
    }

    /// Return a usable credential, refreshing or re-authorizing as needed.
    pub fn credential(&self) -> Result<Credential> {
        let cached = self.load_cached();

        if let Some(credential) = cached.as_ref().filter(|c| c.is_valid()) {
            debug!("Using cached credential from {}", self.token_path.display());
            return Ok(credential.clone());
        }

        let fresh = match cached {
            Some(credential) if credential.can_refresh() => self.refresh(&credential)?,
            _ => self.authorize_interactively()?,
        };

        fresh.save(&self.token_path)?;
        Ok(fresh)
    }

    /// Cached credential, if the cache exists and decodes.
    fn load_cached(&self) -> Option<Credential> {
        if !self.token_path.exists() {
            return None;
        }

        match Credential::load(&self.token_path) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(
                    "Ignoring unreadable credential cache {}: {e}",
                    self.token_path.display()
                );
                None
            }
        }
    }

    /// Mint a new access token from `credential`'s refresh token.
    pub fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| FetchError::Auth("credential has no refresh token".into()))?;

        info!("Refreshing access token");

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", credential.client_id.as_str()),
        ];
        if let Some(secret) = credential.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        let reply = self.post_token_request(&credential.token_uri, &params)?;

        Ok(Credential {
            access_token: reply.access_token,
            refresh_token: reply.refresh_token.or_else(|| credential.refresh_token.clone()),
            expiry: expiry_from(reply.expires_in),
            scopes: reply
                .scope
                .map(|s| split_scopes(&s))
                .unwrap_or_else(|| credential.scopes.clone()),
            ..credential.clone()
        })
    }

    /// Run the installed-app consent flow through a loopback redirect.
    fn authorize_interactively(&self) -> Result<Credential> {
        let secrets = ClientSecrets::load(&self.client_secrets_path)?;

        let listener = TcpListener::bind("127.0.0.1:0")?;
        let redirect_uri = format!("http://127.0.0.1:{}/", listener.local_addr()?.port());

        let client = BasicClient::new(
            ClientId::new(secrets.client_id.clone()),
            secrets.client_secret.clone().map(ClientSecret::new),
            AuthUrl::new(secrets.auth_uri.clone())
                .map_err(|e| FetchError::ClientSecrets(format!("bad auth_uri: {e}")))?,
            Some(
                TokenUrl::new(secrets.token_uri.clone())
                    .map_err(|e| FetchError::ClientSecrets(format!("bad token_uri: {e}")))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(redirect_uri.clone())
                .map_err(|e| FetchError::Auth(format!("bad redirect uri: {e}")))?,
        );

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        // access_type=offline + prompt=consent so Google issues a refresh token.
        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (auth_url, csrf_token) = request.url();

        println!("Please visit this URL to authorize this application: {auth_url}");

        let code = wait_for_authorization_code(&listener, csrf_token.secret())?;

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", secrets.client_id.as_str()),
            ("code_verifier", pkce_verifier.secret().as_str()),
        ];
        if let Some(secret) = secrets.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        let reply = self.post_token_request(&secrets.token_uri, &params)?;
        info!("Authorization complete");

        Ok(Credential {
            access_token: reply.access_token,
            refresh_token: reply.refresh_token,
            expiry: expiry_from(reply.expires_in),
            token_uri: secrets.token_uri,
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            scopes: reply
                .scope
                .map(|s| split_scopes(&s))
                .unwrap_or_else(|| self.scopes.clone()),
        })
    }

    fn post_token_request(&self, token_uri: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self.http.post(token_uri).form(params).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        Ok(response.json()?)
    }
}

/// Absolute expiry for an `expires_in` lifetime; out-of-range values mean no expiry.
fn expiry_from(expires_in: Option<i64>) -> Option<chrono::DateTime<Utc>> {
    let lifetime = Duration::try_seconds(expires_in?)?;
    Utc::now().checked_add_signed(lifetime)
}

fn split_scopes(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(str::to_string).collect()
}

// ── Loopback callback ────────────────────────────────────────────────────────

const CALLBACK_DONE: &str =
    "<html><body>The authentication flow has completed. You may close this window.</body></html>";
const CALLBACK_FAILED: &str =
    "<html><body>The authentication flow failed. Check the terminal for details.</body></html>";

/// Block until the browser is redirected back with an authorization code.
///
/// Requests without `code` or `error` (a favicon fetch, say) are answered
/// and ignored.
fn wait_for_authorization_code(listener: &TcpListener, expected_state: &str) -> Result<String> {
    for stream in listener.incoming() {
        let mut stream = stream?;
        let params = read_callback_params(&stream)?;

        if let Some(error) = params.get("error") {
            respond(&mut stream, CALLBACK_FAILED)?;
            return Err(FetchError::Auth(format!("authorization denied: {error}")));
        }

        let Some(code) = params.get("code") else {
            respond(&mut stream, CALLBACK_FAILED)?;
            continue;
        };

        if params.get("state").map(String::as_str) != Some(expected_state) {
            respond(&mut stream, CALLBACK_FAILED)?;
            return Err(FetchError::Auth("state parameter mismatch".into()));
        }

        respond(&mut stream, CALLBACK_DONE)?;
        return Ok(code.clone());
    }

    Err(FetchError::Auth("callback listener closed".into()))
}

/// Query parameters of the request line; headers are read and discarded.
fn read_callback_params(stream: &TcpStream) -> Result<HashMap<String, String>> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let mut header = String::new();
    while reader.read_line(&mut header)? > 0 && !header.trim_end().is_empty() {
        header.clear();
    }

    let query = request_line
        .split_whitespace()
        .nth(1)
        .and_then(|target| target.split_once('?'))
        .map(|(_, query)| query)
        .unwrap_or_default();

    Ok(url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect())
}

fn respond(stream: &mut TcpStream, body: &str) -> Result<()> {
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )?;
    stream.flush()?;
    Ok(())
}
