use crate::gmail::MailService;
use crate::link_extractor::message_id_from_link;
use crate::mime::{attachment_file_name, MimePart};
use crate::{FetchError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of processing one link.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    /// Message id parsed from the link, `None` when the link had none.
    pub message_id: Option<String>,

    /// Files written, in download order.
    pub saved: Vec<PathBuf>,

    /// Attachments that could not be fetched, decoded or written.
    pub failed: Vec<FailedAttachment>,
}

/// An attachment that was skipped, with the reason.
#[derive(Debug, Clone)]
pub struct FailedAttachment {
    pub file_name: String,
    pub reason: String,
}

/// Download every attachment of the message `link` points to into `dest`.
///
/// Never fails: a link without a message id, or a message that cannot be
/// fetched, is logged and skipped. A failing attachment is logged and the
/// remaining ones are still downloaded.
pub fn download_attachments<S: MailService + ?Sized>(
    service: &S,
    link: &str,
    dest: &Path,
) -> DownloadReport {
    let mut report = DownloadReport::default();

    let message_id = match message_id_from_link(link) {
        Some(id) => id,
        None => {
            warn!("{}", FetchError::MissingMessageId(link.to_string()));
            return report;
        }
    };
    report.message_id = Some(message_id.clone());

    info!("Processing message ID: {message_id}");

    let message = match service.get_message(&message_id) {
        Ok(m) => m,
        Err(e) => {
            warn!("Error processing message {message_id}: {e}");
            return report;
        }
    };

    message.log_structure();

    let parts = message.attachments();
    if parts.is_empty() {
        info!("No attachments found in message {message_id}");
        return report;
    }

    info!("Found {} attachments in message", parts.len());

    for part in parts {
        let file_name = attachment_file_name(&message_id, part);
        match save_attachment(service, &message_id, part, &dest.join(&file_name)) {
            Ok(path) => {
                info!("Successfully downloaded: {file_name}");
                report.saved.push(path);
            }
            Err(e) => {
                warn!("Error downloading attachment {file_name}: {e}");
                report.failed.push(FailedAttachment {
                    file_name,
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

/// Fetch, decode and write a single attachment part.
fn save_attachment<S: MailService + ?Sized>(
    service: &S,
    message_id: &str,
    part: &MimePart,
    dest: &Path,
) -> Result<PathBuf> {
    let attachment_id = part.attachment_id.as_deref().unwrap_or_default();
    let payload = service.get_attachment(message_id, attachment_id)?;
    std::fs::write(dest, payload.decode()?)?;
    Ok(dest.to_path_buf())
}
