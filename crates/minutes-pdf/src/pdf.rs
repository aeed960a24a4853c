//! PDF page reader
//!
//! Extracts the text layer with `pdf-extract`, one string per PDF page.
//!
//! # Example
//! ```no_run
//! use minutes_pdf::{PageSource, PdfPageReader, SourceError};
//!
//! fn count_pages(path: &str) -> Result<usize, SourceError> {
//!     let pages = PdfPageReader::new().read_pages(path, None)?;
//!     Ok(pages.len())
//! }
//! ```

use crate::source::{content_id_of, read_source_bytes, select_pages};
use crate::{PageSource, SourceError};
use minutes_types::Page;
use pdf_extract::extract_text_from_mem_by_pages;
use tracing::{debug, warn};

/// Reads pages from a PDF file path
#[derive(Debug, Clone, Default)]
pub struct PdfPageReader;

impl PdfPageReader {
    pub fn new() -> Self {
        Self
    }

    /// Extract page texts from PDF bytes
    ///
    /// # Errors
    /// - `SourceError::Unreadable` when the PDF is encrypted, malformed, or
    ///   carries no text layer at all (scanned documents need OCR first)
    pub fn extract_pages(source_id: &str, pdf_bytes: &[u8]) -> Result<Vec<Page>, SourceError> {
        let page_texts = extract_text_from_mem_by_pages(pdf_bytes).map_err(|e| {
            let error_msg = e.to_string().to_lowercase();
            let reason = if error_msg.contains("encrypted") || error_msg.contains("password") {
                "password-protected PDF".to_string()
            } else {
                e.to_string()
            };
            SourceError::Unreadable {
                source_id: source_id.to_string(),
                reason,
            }
        })?;

        // Scanned PDFs come back as whitespace only
        let non_whitespace_chars = page_texts
            .iter()
            .flat_map(|text| text.chars())
            .filter(|c| !c.is_whitespace())
            .count();
        if non_whitespace_chars == 0 {
            warn!(source_id, "PDF has no text layer");
            return Err(SourceError::Unreadable {
                source_id: source_id.to_string(),
                reason: "no text layer, OCR required".to_string(),
            });
        }

        let pages: Vec<Page> = page_texts
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Page::new(idx as u32 + 1, text))
            .collect();
        debug!(source_id, pages = pages.len(), "extracted PDF text");
        Ok(pages)
    }
}

impl PageSource for PdfPageReader {
    fn read_pages(
        &self,
        source_id: &str,
        pages: Option<&[u32]>,
    ) -> Result<Vec<Page>, SourceError> {
        let bytes = read_source_bytes(source_id)?;
        let all = Self::extract_pages(source_id, &bytes)?;
        select_pages(source_id, all, pages)
    }

    fn content_id(&self, source_id: &str) -> Result<String, SourceError> {
        Ok(content_id_of(&read_source_bytes(source_id)?))
    }
}
