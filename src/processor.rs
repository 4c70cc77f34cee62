use crate::downloader::{download_attachments, DownloadReport};
use crate::gmail::MailService;
use crate::link_extractor::extract_mail_links;
use crate::organizer::{create_folder_structure, OutputFolder};
use crate::{FetcherConfig, Result};
use std::path::Path;
use tracing::info;

/// What happened to one input PDF.
#[derive(Debug, Clone)]
pub struct PdfReport {
    pub folder: OutputFolder,

    /// Unique Gmail links found in the PDF, in first-seen order.
    pub links: Vec<String>,

    /// One entry per link, same order as `links`.
    pub downloads: Vec<DownloadReport>,
}

impl PdfReport {
    /// Total number of attachment files written for this PDF.
    pub fn saved_count(&self) -> usize {
        self.downloads.iter().map(|d| d.saved.len()).sum()
    }

    /// Total number of attachments that could not be downloaded.
    pub fn failed_count(&self) -> usize {
        self.downloads.iter().map(|d| d.failed.len()).sum()
    }
}

/// Runs the organize → extract → download pipeline for one PDF at a time.
pub struct PdfProcessor<'a, S: MailService + ?Sized> {
    service: &'a S,
    config: &'a FetcherConfig,
}

impl<'a, S: MailService + ?Sized> PdfProcessor<'a, S> {
    pub fn new(service: &'a S, config: &'a FetcherConfig) -> Self {
        Self { service, config }
    }

    /// Process a single PDF.
    ///
    /// Only folder creation and the PDF move can fail; link extraction and
    /// downloads log their own errors and carry on.
    pub fn process<P: AsRef<Path>>(&self, pdf_path: P) -> Result<PdfReport> {
        let pdf_path = pdf_path.as_ref();
        info!("Processing PDF: {}", pdf_path.display());

        let folder = create_folder_structure(pdf_path, self.config)?;
        let links = extract_mail_links(&folder.pdf_path);

        if links.is_empty() {
            info!("No Gmail attachments found in the PDF: {}", pdf_path.display());
        } else {
            info!("Found {} Gmail attachments to download", links.len());
        }

        let downloads = links
            .iter()
            .map(|link| download_attachments(self.service, link, &folder.downloads_dir))
            .collect();

        Ok(PdfReport {
            folder,
            links,
            downloads,
        })
    }
}
