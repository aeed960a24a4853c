//! The page-reader interface consumed by the extraction pipeline

use minutes_types::Page;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading a source document
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Source unreadable: {source_id}: {reason}")]
    Unreadable { source_id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can turn a source identifier into page texts
pub trait PageSource {
    /// Read the pages of `source_id`, numbered from 1.
    ///
    /// When `pages` is given only those page numbers are returned, in the
    /// requested order.
    fn read_pages(&self, source_id: &str, pages: Option<&[u32]>)
        -> Result<Vec<Page>, SourceError>;

    /// Stable identifier of the source content, used for cache keys
    fn content_id(&self, source_id: &str) -> Result<String, SourceError>;
}

/// Split extracted text on form feeds into numbered pages
///
/// Empty pages are kept so later page numbers never shift. A single trailing
/// form feed (as emitted by most extractors) does not produce an extra page.
pub fn split_pages(text: &str) -> Vec<Page> {
    let body = text.strip_suffix('\x0C').unwrap_or(text);
    body.split('\x0C')
        .enumerate()
        .map(|(idx, page_text)| Page::new(idx as u32 + 1, page_text))
        .collect()
}

/// Restrict `pages` to the requested page numbers
pub(crate) fn select_pages(
    source_id: &str,
    pages: Vec<Page>,
    wanted: Option<&[u32]>,
) -> Result<Vec<Page>, SourceError> {
    let Some(wanted) = wanted else {
        return Ok(pages);
    };

    let total = pages.len() as u32;
    wanted
        .iter()
        .map(|&number| {
            if number == 0 || number > total {
                return Err(SourceError::Unreadable {
                    source_id: source_id.to_string(),
                    reason: format!("page {} out of range 1..={}", number, total),
                });
            }
            Ok(pages[number as usize - 1].clone())
        })
        .collect()
}

/// Read a whole source file, mapping a missing file to `NotFound`
pub(crate) fn read_source_bytes(source_id: &str) -> Result<Vec<u8>, SourceError> {
    let path = Path::new(source_id);
    if !path.exists() {
        return Err(SourceError::NotFound(source_id.to_string()));
    }
    Ok(std::fs::read(path)?)
}

/// Hex SHA-256 of raw source bytes
pub fn content_id_of(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
