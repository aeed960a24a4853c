use minutes_pdf::SourceError;
use thiserror::Error;

use crate::cache::CacheError;

/// Errors that abort an extraction call
///
/// Heuristic misses are not errors; they are reported as
/// [`Diagnostic`](crate::diagnostics::Diagnostic) values instead.
#[derive(Error, Debug)]
pub enum ChronologyError {
    #[error("Source unreadable: {0}")]
    SourceUnreadable(#[from] SourceError),

    #[error("Subject filter matched nothing: {missing:?} (available: {available:?})")]
    SubjectNotFound {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Table error: {0}")]
    Table(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<csv::Error> for ChronologyError {
    fn from(err: csv::Error) -> Self {
        ChronologyError::Table(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChronologyError>;
