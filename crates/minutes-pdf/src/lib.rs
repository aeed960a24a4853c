//! Page readers for meeting-minutes documents
//!
//! This crate turns a source document into an ordered list of page texts.
//! PDFs are read with `pdf-extract`; already extracted (or OCR'd) text can be
//! fed through the plain-text reader, one form feed per page break.

pub mod pdf;
pub mod source;
pub mod text;

pub use pdf::PdfPageReader;
pub use source::{content_id_of, split_pages, PageSource, SourceError};
pub use text::TextPageReader;
