use crate::pdf_links::{LinkAnnotations, PdfLinkReader};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Substring every Gmail attachment-viewer URL contains.
pub const MAIL_DOMAIN_MARKER: &str = "mail.google.com";

/// Query parameter carrying the message identifier.
pub const MESSAGE_ID_PARAM: &str = "th";

/// Returns `true` when `uri` has the shape of a Gmail link that names a message.
///
/// ```
/// use pdfgmailfetch::is_mail_link;
///
/// assert!(is_mail_link("https://mail.google.com/mail/u/0?ui=2&th=18c2f&view=att"));
/// assert!(!is_mail_link("https://mail.google.com/mail/u/0/#inbox"));
/// assert!(!is_mail_link("https://example.com/?th=18c2f"));
/// ```
pub fn is_mail_link(uri: &str) -> bool {
    uri.contains(MAIL_DOMAIN_MARKER) && uri.contains(&format!("{MESSAGE_ID_PARAM}="))
}

/// Extract the message identifier from a link's `th` query parameter.
///
/// The first non-empty `th` value wins; an empty or missing parameter gives `None`.
///
/// ```
/// use pdfgmailfetch::message_id_from_link;
///
/// let link = "https://mail.google.com/mail/u/0?ui=2&th=18c2f0a1&view=att#x";
/// assert_eq!(message_id_from_link(link).as_deref(), Some("18c2f0a1"));
/// assert_eq!(message_id_from_link("https://mail.google.com/mail/u/0?th="), None);
/// ```
pub fn message_id_from_link(link: &str) -> Option<String> {
    let query = link.split_once('?')?.1;
    let query = query.split_once('#').map_or(query, |(q, _)| q);

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == MESSAGE_ID_PARAM && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Filter `source`'s link URIs down to unique Gmail message links.
///
/// Order is first-seen order; later URIs naming an already seen message id
/// are dropped. Errors from the source propagate.
pub fn collect_mail_links<S: LinkAnnotations + ?Sized>(source: &S) -> crate::Result<Vec<String>> {
    let mut links = Vec::new();
    let mut message_ids = HashSet::new();

    for uri in source.link_uris()? {
        if !is_mail_link(&uri) {
            continue;
        }

        if let Some(message_id) = message_id_from_link(&uri) {
            if message_ids.insert(message_id.clone()) {
                info!("Found message ID: {message_id}");
                links.push(uri);
            }
        }
    }

    Ok(links)
}

/// Open the PDF at `pdf_path` and return its unique Gmail message links.
///
/// Never fails: any error while opening or walking the document is logged
/// and yields an empty list rather than partial results.
pub fn extract_mail_links<P: AsRef<Path>>(pdf_path: P) -> Vec<String> {
    let result = PdfLinkReader::from_path(pdf_path.as_ref())
        .and_then(|reader| collect_mail_links(&reader));

    match result {
        Ok(links) => links,
        Err(e) => {
            warn!("An error occurred while extracting links: {e}");
            Vec::new()
        }
    }
}
