use std::path::Path;
use tracing::debug;

// ── Message ───────────────────────────────────────────────────────────────────

/// A mail message as far as attachment discovery is concerned.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Provider-assigned message identifier.
    pub id: String,

    /// Root of the MIME part tree.
    pub payload: MimePart,
}

impl Message {
    /// Every part below the payload that carries a downloadable attachment.
    pub fn attachments(&self) -> Vec<&MimePart> {
        attachment_parts(&self.payload.parts)
    }

    /// Log the part tree below the payload at debug level.
    pub fn log_structure(&self) {
        debug!("Message parts structure:");
        log_parts(&self.payload.parts, 0);
    }
}

// ── MimePart ──────────────────────────────────────────────────────────────────

/// One node of a message's MIME tree.
///
/// `filename` is `Some` whenever the part declares the field, even when the
/// declared value is empty.
#[derive(Debug, Clone, Default)]
pub struct MimePart {
    pub part_id: Option<String>,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    /// Reference used to fetch the binary body separately.
    pub attachment_id: Option<String>,
    pub parts: Vec<MimePart>,
}

impl MimePart {
    /// Returns `true` when this part declares both a filename and an
    /// attachment reference.
    pub fn is_attachment(&self) -> bool {
        self.filename.is_some() && self.attachment_id.is_some()
    }
}

/// Flatten `parts` into the qualifying attachment parts, depth first.
///
/// A part with children contributes its qualifying descendants after itself
/// (if it qualifies too).
pub fn attachment_parts(parts: &[MimePart]) -> Vec<&MimePart> {
    let mut out = Vec::new();
    for part in parts {
        if part.is_attachment() {
            out.push(part);
        }
        out.extend(attachment_parts(&part.parts));
    }
    out
}

/// Name under which `part` is written inside the downloads directory.
///
/// The declared filename is reduced to its last path component; when that
/// leaves nothing usable, `attachment_{message_id}_{attachment_id}` is used.
///
/// ```
/// use pdfgmailfetch::{attachment_file_name, MimePart};
///
/// let part = MimePart {
///     filename: Some(String::new()),
///     attachment_id: Some("A1".into()),
///     ..Default::default()
/// };
/// assert_eq!(attachment_file_name("M1", &part), "attachment_M1_A1");
///
/// let named = MimePart { filename: Some("../invoice.pdf".into()), ..part };
/// assert_eq!(attachment_file_name("M1", &named), "invoice.pdf");
/// ```
pub fn attachment_file_name(message_id: &str, part: &MimePart) -> String {
    part.filename
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "attachment_{}_{}",
                message_id,
                part.attachment_id.as_deref().unwrap_or_default()
            )
        })
}

fn log_parts(parts: &[MimePart], level: usize) {
    let indent = "  ".repeat(level);
    for part in parts {
        debug!(
            "{indent}Part ID: {} | Filename: {} | MIME Type: {}",
            part.part_id.as_deref().unwrap_or("None"),
            part.filename.as_deref().unwrap_or("None"),
            part.mime_type.as_deref().unwrap_or("None"),
        );
        log_parts(&part.parts, level + 1);
    }
}
