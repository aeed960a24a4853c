//! Soft classification misses collected during an extraction
//!
//! The input format is noisy, so none of these abort the pipeline. Each one
//! is logged when recorded and handed back to the caller with the results.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A page carried no recognizable report number
    UnmatchedReportNumber { page: u32 },
    /// No page of the document carried a report number
    NoReportBoundaryFound,
    /// Text accumulated before the first recognized subject header
    UnrecognizedTableHeader { report_number: u32, page_start: u32 },
    /// A `DD/MM/YY` token that is not a calendar date
    InvalidDate {
        report_number: u32,
        subject_title: String,
        token: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnmatchedReportNumber { page } => {
                write!(f, "page {} does not have a report number", page)
            }
            Diagnostic::NoReportBoundaryFound => write!(f, "no report number found in document"),
            Diagnostic::UnrecognizedTableHeader {
                report_number,
                page_start,
            } => write!(
                f,
                "dropped text without subject header (report {}, page {})",
                report_number, page_start
            ),
            Diagnostic::InvalidDate {
                report_number,
                subject_title,
                token,
            } => write!(
                f,
                "'{}' is not a date (report {}, subject '{}')",
                token, report_number, subject_title
            ),
        }
    }
}

/// Accumulates diagnostics across pipeline stages
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::UnrecognizedTableHeader { .. } => debug!("{}", diagnostic),
            _ => warn!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
