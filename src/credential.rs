use crate::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tokens expiring within this window are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 300;

// ── Credential ───────────────────────────────────────────────────────────────

/// An OAuth credential plus everything needed to refresh it without the
/// client secrets file.
///
/// Cached on disk as JSON by [`crate::Authenticator`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    /// Bearer token for API requests.
    pub access_token: String,

    /// Long-lived token used to mint new access tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// When `access_token` stops being accepted. `None` means unknown.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,

    pub token_uri: String,
    pub client_id: String,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// Load a cached credential from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write this credential to `path`, replacing any previous content.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Returns `true` when the expiry (if known) is at or inside the skew window.
    ///
    /// ```
    /// # use pdfgmailfetch::Credential;
    /// # use chrono::{Duration, Utc};
    /// let mut cred = Credential {
    ///     access_token: "ya29.token".into(),
    ///     refresh_token: None,
    ///     expiry: Some(Utc::now() - Duration::minutes(1)),
    ///     token_uri: "https://oauth2.googleapis.com/token".into(),
    ///     client_id: "id".into(),
    ///     client_secret: None,
    ///     scopes: vec![],
    /// };
    /// assert!(cred.is_expired());
    ///
    /// cred.expiry = None;
    /// assert!(!cred.is_expired());
    /// ```
    pub fn is_expired(&self) -> bool {
        self.expiry
            .map(|expiry| Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry)
            .unwrap_or(false)
    }

    /// Returns `true` when the access token can be used as is.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    /// Returns `true` when a refresh can be attempted.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }
}
