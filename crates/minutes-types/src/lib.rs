pub mod date_format;
pub mod types;

pub use date_format::{format_date, parse_date};
pub use types::{ActionCell, CompressedAction, Page, ReportSpan, TableBlock};
