//! # pdfgmailfetch
//!
//! A Rust library for pulling Gmail attachments referenced from PDF printouts.
//!
//! ## What this crate does
//!
//! 1. **Organize** — moves each PDF into its own folder (`<name>/message.pdf`)
//!    next to a fresh `downloads/` directory, never reusing an existing name.
//! 2. **Extract links** — walks the link annotations on every page and keeps
//!    the Gmail URLs that carry a message identifier (`th=`), one per message.
//! 3. **Authenticate** — loads, refreshes or interactively obtains an OAuth
//!    credential for the read-only Gmail scope and caches it on disk.
//! 4. **Download** — fetches each message's MIME tree and writes every
//!    attachment payload into the PDF's `downloads/` directory.
//!
//! ## Quick example
//!
//! ```no_run
//! use pdfgmailfetch::{Authenticator, FetcherConfig, PdfProcessor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FetcherConfig::default();
//! let gmail = Authenticator::new(&config).connect()?;
//!
//! let processor = PdfProcessor::new(&gmail, &config);
//! let report = processor.process("invoice.pdf")?;
//! println!("{} link(s) in {}", report.links.len(), report.folder.root.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use thiserror::Error;

mod auth;
mod credential;
mod downloader;
mod gmail;
mod link_extractor;
mod mime;
mod organizer;
mod pdf_links;
mod pdf_utils;
mod processor;

pub use auth::{Authenticator, ClientSecrets};
pub use credential::Credential;
pub use downloader::{download_attachments, DownloadReport, FailedAttachment};
pub use gmail::{parse_message, AttachmentPayload, GmailClient, MailService};
pub use link_extractor::{
    collect_mail_links, extract_mail_links, is_mail_link, message_id_from_link,
    MAIL_DOMAIN_MARKER, MESSAGE_ID_PARAM,
};
pub use mime::{attachment_file_name, attachment_parts, Message, MimePart};
pub use organizer::{create_folder_structure, find_pdf_files, unique_folder_path, OutputFolder};
pub use pdf_links::{LinkAnnotations, PdfLinkReader};
pub use processor::{PdfProcessor, PdfReport};

/// OAuth scope granting read-only access to messages and attachments.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

// ── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration shared by every stage.
///
/// The defaults reproduce the fixed layout of a run from the current
/// directory: `token.json` and `credentials.json` sit next to the PDFs.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Directory scanned for `*.pdf` files.
    pub working_directory: PathBuf,

    /// Credential cache, rewritten whenever a new or refreshed token is obtained.
    pub token_path: PathBuf,

    /// Google installed-app client secrets, read only for the interactive flow.
    pub client_secrets_path: PathBuf,

    /// OAuth scopes requested during the interactive flow.
    pub scopes: Vec<String>,

    /// Name the PDF is given once moved into its output folder.
    pub pdf_file_name: String,

    /// Name of the attachment directory inside each output folder.
    pub downloads_dir_name: String,

    /// Root of the Gmail REST API.
    pub gmail_api_base: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            working_directory: PathBuf::from("."),
            token_path: PathBuf::from("token.json"),
            client_secrets_path: PathBuf::from("credentials.json"),
            scopes: vec![GMAIL_READONLY_SCOPE.to_string()],
            pdf_file_name: "message.pdf".to_string(),
            downloads_dir_name: "downloads".to_string(),
            gmail_api_base: "https://gmail.googleapis.com".to_string(),
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A filesystem I/O error occurred (folder creation, PDF move, file write).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The underlying lopdf parser returned an error.
    #[error("PDF parse error: {0}")]
    ParseError(#[from] lopdf::Error),

    /// The PDF parsed but lacks the structure needed to walk its pages.
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// The HTTP transport failed (connection, TLS, body decoding).
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// An API URL could not be built from the configured base and identifiers.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A JSON document (credential cache, client secrets, API reply) was malformed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// An attachment payload was not valid base64url.
    #[error("Invalid attachment encoding: {0}")]
    DecodeError(#[from] base64::DecodeError),

    /// The client secrets file is missing or unusable.
    #[error("Client secrets error: {0}")]
    ClientSecrets(String),

    /// The authorization flow or token refresh failed.
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// The Gmail API answered with a non-success status.
    #[error("Gmail API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// A link did not carry a `th` message identifier.
    #[error("Could not find message ID in URL: {0}")]
    MissingMessageId(String),

    /// The working directory holds no PDF files.
    #[error("No PDF files found in {}", .0.display())]
    NoPdfFiles(PathBuf),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, FetchError>;
