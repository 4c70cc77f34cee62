use crate::{pdf_utils, FetchError, Result};
use lopdf::{Document, Object, ObjectId};
use std::path::Path;

// ── LinkAnnotations ───────────────────────────────────────────────────────────

/// The only view of a PDF the link extractor needs: the URI of every link
/// annotation, page by page, in document order.
pub trait LinkAnnotations {
    /// Returns every link-annotation URI in the document.
    ///
    /// Pages without annotations and annotations without a URI action
    /// contribute nothing. A malformed object graph is an error.
    fn link_uris(&self) -> Result<Vec<String>>;
}

impl LinkAnnotations for Vec<String> {
    fn link_uris(&self) -> Result<Vec<String>> {
        Ok(self.clone())
    }
}

// ── PdfLinkReader ─────────────────────────────────────────────────────────────

/// [`LinkAnnotations`] backed by a parsed [`lopdf::Document`].
///
/// ```no_run
/// use pdfgmailfetch::{LinkAnnotations, PdfLinkReader};
///
/// let reader = PdfLinkReader::from_path("message.pdf").unwrap();
/// for uri in reader.link_uris().unwrap() {
///     println!("{uri}");
/// }
/// ```
pub struct PdfLinkReader {
    document: Document,
}

impl PdfLinkReader {
    /// Load a PDF from the file system.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_document(Document::load(path)?)
    }

    /// Wrap an already parsed document.
    ///
    /// The document must have a catalog and at least one page.
    pub fn from_document(document: Document) -> Result<Self> {
        document
            .catalog()
            .map_err(|e| FetchError::InvalidPdf(format!("missing or invalid catalog: {e}")))?;

        if document.get_pages().is_empty() {
            return Err(FetchError::InvalidPdf("document has no pages".into()));
        }

        Ok(Self { document })
    }

    /// Link URIs found on a single page.
    fn page_link_uris(&self, page_id: ObjectId) -> Result<Vec<String>> {
        let page = self.document.get_dictionary(page_id)?;

        let annots_val = match page.get(b"Annots") {
            Ok(val) => val,
            Err(_) => return Ok(Vec::new()),
        };

        let annots = pdf_utils::resolve_array(&self.document, annots_val)?;

        let mut uris = Vec::new();
        for annot in annots {
            if let Some(uri) = self.annotation_uri(annot)? {
                uris.push(uri);
            }
        }

        Ok(uris)
    }

    /// URI of a `/Link` annotation with a URI action, if it is one.
    ///
    /// Every annotation must name its `/Subtype`.
    fn annotation_uri(&self, annot: &Object) -> Result<Option<String>> {
        let dict = pdf_utils::resolve_dict(&self.document, annot)?;

        if !pdf_utils::has_subtype(dict, b"Link")? {
            return Ok(None);
        }

        let action_val = match dict.get(b"A") {
            Ok(val) => val,
            Err(_) => return Ok(None),
        };
        let action = pdf_utils::resolve_dict(&self.document, action_val)?;

        pdf_utils::string_from_dict(&self.document, action, b"URI")
    }
}

impl LinkAnnotations for PdfLinkReader {
    fn link_uris(&self) -> Result<Vec<String>> {
        let mut uris = Vec::new();

        // get_pages() is keyed by page number, so values() is document order.
        for page_id in self.document.get_pages().values() {
            uris.extend(self.page_link_uris(*page_id)?);
        }

        Ok(uris)
    }
}
