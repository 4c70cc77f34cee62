use crate::{FetcherConfig, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// The per-PDF output layout created by [`create_folder_structure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFolder {
    /// The collision-free folder named after the PDF.
    pub root: PathBuf,

    /// `root/downloads`, where attachments are written.
    pub downloads_dir: PathBuf,

    /// `root/message.pdf`, the relocated PDF.
    pub pdf_path: PathBuf,
}

/// List the `*.pdf` files directly inside `dir`, sorted by name.
///
/// The extension match is case-sensitive: `REPORT.PDF` is not picked up.
pub fn find_pdf_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut pdfs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(".pdf") {
            pdfs.push(dir.join(entry.file_name()));
        }
    }

    pdfs.sort();
    Ok(pdfs)
}

/// First path `parent/base`, `parent/base (1)`, `parent/base (2)`, … that
/// does not exist yet.
///
/// Not atomic: another process may create the same name before it is used.
pub fn unique_folder_path(parent: &Path, base: &str) -> PathBuf {
    let mut candidate = parent.join(base);
    let mut counter = 1;

    while candidate.exists() {
        candidate = parent.join(format!("{base} ({counter})"));
        counter += 1;
    }

    candidate
}

/// Create the output folder for `pdf_path`, move the PDF inside it and
/// create its downloads directory.
///
/// The folder is created next to the PDF and named after its file stem.
/// Any filesystem failure is returned to the caller.
///
/// ```no_run
/// use pdfgmailfetch::{create_folder_structure, FetcherConfig};
///
/// let out = create_folder_structure("invoice.pdf", &FetcherConfig::default()).unwrap();
/// assert!(out.pdf_path.ends_with("message.pdf"));
/// ```
pub fn create_folder_structure<P: AsRef<Path>>(
    pdf_path: P,
    config: &FetcherConfig,
) -> Result<OutputFolder> {
    let pdf_path = pdf_path.as_ref();
    let parent = pdf_path.parent().unwrap_or_else(|| Path::new(""));
    let base = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let root = unique_folder_path(parent, &base);
    fs::create_dir(&root)?;
    info!("Created main folder: {}", root.display());

    let downloads_dir = root.join(&config.downloads_dir_name);
    if !downloads_dir.exists() {
        fs::create_dir(&downloads_dir)?;
        info!("Created downloads folder: {}", downloads_dir.display());
    }

    let new_pdf_path = root.join(&config.pdf_file_name);
    fs::rename(pdf_path, &new_pdf_path)?;
    info!("Moved and renamed PDF to: {}", new_pdf_path.display());

    Ok(OutputFolder {
        root,
        downloads_dir,
        pdf_path: new_pdf_path,
    })
}
