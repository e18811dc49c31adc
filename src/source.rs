//! Per-page plain text from PDF files.
//!
//! Text extraction proper is delegated to a backend behind [`PageSource`].
//! The default backend is `lopdf`.

use crate::error::{Error, Result};
use lopdf::Document;
use std::path::Path;

/// Produces one string per physical page, in page order.
pub trait PageSource {
    /// Extract the text of every page of the document at `path`.
    ///
    /// A page whose text cannot be extracted (a scanned image, an unsupported
    /// font encoding) yields an empty string. Only a document that cannot be
    /// opened at all is an error.
    fn page_texts(&self, path: &Path) -> Result<Vec<String>>;
}

/// [`PageSource`] backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfSource;

impl LopdfSource {
    /// Create a new source.
    pub fn new() -> Self {
        Self
    }
}

impl PageSource for LopdfSource {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>> {
        let doc = Document::load(path).map_err(|e| Error::PdfLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut pages = Vec::with_capacity(page_numbers.len());

        for page_num in page_numbers {
            pages.push(text_or_empty(doc.extract_text(&[page_num]), page_num, path));
        }

        log::info!("Extracted {} page(s) from {}", pages.len(), path.display());
        Ok(pages)
    }
}

/// A page that fails extraction becomes empty text instead of failing the document.
fn text_or_empty(extracted: lopdf::Result<String>, page: u32, path: &Path) -> String {
    match extracted {
        Ok(text) => text,
        Err(e) => {
            let err = Error::PageText {
                page,
                reason: e.to_string(),
            };
            log::warn!("{} ({}); using empty text", err, path.display());
            String::new()
        },
    }
}
