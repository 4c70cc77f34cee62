use crate::mime::{Message, MimePart};
use crate::{FetchError, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// URL-safe alphabet, accepting payloads with or without `=` padding.
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// ── MailService ──────────────────────────────────────────────────────────────

/// Read-only access to messages and their attachment payloads.
pub trait MailService {
    /// Fetch the full message, including its MIME part tree.
    fn get_message(&self, message_id: &str) -> Result<Message>;

    /// Fetch one attachment payload of a message.
    fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<AttachmentPayload>;
}

/// An attachment body as delivered on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentPayload {
    /// base64url-encoded content.
    #[serde(default)]
    pub data: String,
}

impl AttachmentPayload {
    /// Decode the payload to raw bytes.
    ///
    /// ```
    /// use pdfgmailfetch::AttachmentPayload;
    ///
    /// let payload = AttachmentPayload { data: "aGk_Pw".into() };
    /// assert_eq!(payload.decode().unwrap(), b"hi??");
    /// ```
    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(BASE64_URL.decode(self.data.trim())?)
    }
}

// ── GmailClient ──────────────────────────────────────────────────────────────

/// Blocking Gmail REST client (`gmail`, `v1`) bound to one access token.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    access_token: String,
    api_base: String,
}

impl GmailClient {
    /// Client for the API rooted at `api_base`, normally
    /// [`FetcherConfig::gmail_api_base`](crate::FetcherConfig::gmail_api_base).
    pub fn with_api_base(access_token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            access_token: access_token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// `{api_base}/gmail/v1/users/me/messages/{segments...}`.
    ///
    /// Each segment is percent-encoded on its own, so an identifier taken
    /// from a link cannot add path components or a query.
    fn messages_url(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(FetchError::InvalidUrl(format!("unusable path segment {bad:?}")));
        }

        let mut url = Url::parse(&self.api_base)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(format!("{} cannot be a base", self.api_base)))?
            .pop_if_empty()
            .extend(["gmail", "v1", "users", "me", "messages"])
            .extend(segments);
        Ok(url)
    }

    fn get_text(&self, url: Url, query: &[(&str, &str)]) -> Result<String> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        Ok(response.text()?)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        Ok(serde_json::from_str(&self.get_text(url, query)?)?)
    }
}

impl MailService for GmailClient {
    fn get_message(&self, message_id: &str) -> Result<Message> {
        let url = self.messages_url(&[message_id])?;
        parse_message(&self.get_text(url, &[("format", "full")])?)
    }

    fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<AttachmentPayload> {
        let url = self.messages_url(&[message_id, "attachments", attachment_id])?;
        self.get_json(url, &[])
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    payload: Option<WireMessagePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessagePart {
    part_id: Option<String>,
    mime_type: Option<String>,
    filename: Option<String>,
    body: Option<WireMessagePartBody>,
    parts: Option<Vec<WireMessagePart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessagePartBody {
    attachment_id: Option<String>,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Self {
            id: wire.id,
            payload: wire.payload.map(MimePart::from).unwrap_or_default(),
        }
    }
}

impl From<WireMessagePart> for MimePart {
    fn from(wire: WireMessagePart) -> Self {
        Self {
            part_id: wire.part_id,
            filename: wire.filename,
            mime_type: wire.mime_type,
            attachment_id: wire.body.and_then(|b| b.attachment_id),
            parts: wire
                .parts
                .unwrap_or_default()
                .into_iter()
                .map(MimePart::from)
                .collect(),
        }
    }
}

/// Map a raw `users.messages.get` JSON reply into a [`Message`].
pub fn parse_message(json: &str) -> Result<Message> {
    let wire: WireMessage = serde_json::from_str(json)?;
    Ok(wire.into())
}
