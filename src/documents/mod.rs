// PDF document loading
// Turns the configured PDF files into page-level text records


use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{debug, info, warn};

use crate::{RagError, Result};

/// Text of a single PDF page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPage {
    /// File the page was read from
    pub source: PathBuf,
    /// 1-based page number within `source`
    pub page: u32,
    /// Extracted page text
    pub text: String,
}

/// Presence of one configured document on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStatus {
    pub name: String,
    pub path: PathBuf,
    pub present: bool,
}

/// Load every page of every file, in list order.
///
/// The first missing file aborts the whole load with [`RagError::MissingFile`].
#[inline]
pub fn load_documents(files: &[PathBuf]) -> Result<Vec<DocumentPage>> {
    let mut pages = Vec::new();

    for path in files {
        if !path.exists() {
            warn!("Document not found: {}", path.display());
            return Err(RagError::MissingFile { path: path.clone() });
        }

        let file_pages = load_pdf(path)?;
        debug!("Loaded {} pages from {}", file_pages.len(), path.display());
        pages.extend(file_pages);
    }

    info!("Loaded {} pages from {} documents", pages.len(), files.len());
    Ok(pages)
}

/// Extract the text of each page of a single PDF
#[inline]
pub fn load_pdf(path: &Path) -> Result<Vec<DocumentPage>> {
    let document = Document::load(path)
        .map_err(|e| RagError::Pdf(format!("Failed to open {}: {}", path.display(), e)))?;

    document
        .get_pages()
        .into_keys()
        .map(|page| {
            let text = document.extract_text(&[page]).map_err(|e| {
                RagError::Pdf(format!(
                    "Failed to extract page {} of {}: {}",
                    page,
                    path.display(),
                    e
                ))
            })?;

            Ok(DocumentPage {
                source: path.to_path_buf(),
                page,
                text,
            })
        })
        .collect()
}

/// Check which of the configured files currently exist
#[inline]
pub fn document_status(files: &[PathBuf]) -> Vec<DocumentStatus> {
    files
        .iter()
        .map(|path| DocumentStatus {
            name: path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
            path: path.clone(),
            present: path.exists(),
        })
        .collect()
}
