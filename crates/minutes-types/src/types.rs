use chrono::NaiveDate;
use std::collections::BTreeSet;

/// One page of the source document, as returned by the page reader
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Page {
    pub number: u32, // 1-based
    pub text: String,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Page range covered by one report
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReportSpan {
    pub report_number: u32,
    pub page_start: u32,
    pub page_end: u32,
    /// Alphabetic sub-type tags seen next to the report number (e.g. "OPC")
    pub type_tags: BTreeSet<String>,
}

impl ReportSpan {
    pub fn contains(&self, page: u32) -> bool {
        (self.page_start..=self.page_end).contains(&page)
    }

    pub fn page_count(&self) -> u32 {
        self.page_end + 1 - self.page_start
    }
}

/// Unsegmented body of one subject table inside one report
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TableBlock {
    pub report_number: u32,
    pub page_start: u32,
    pub page_end: u32,
    pub raw_text: String,
}

/// One dated (or undated) remark inside a subject table
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActionCell {
    pub report_number: u32,
    pub page_start: u32,
    pub page_end: u32,
    pub subject_title: String,
    pub company: String,
    #[serde(with = "crate::date_format::optional")]
    pub date: Option<NaiveDate>,
    pub text: String,
    /// Index of the body line that closed the cell
    pub order_in_table: usize,
}

/// A cluster of near-duplicate cells merged into one chronological entry
///
/// `dates`, `report_numbers` and `pages` are kept sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CompressedAction {
    pub subject_title: String,
    pub text: String,
    #[serde(with = "crate::date_format::list")]
    pub dates: Vec<NaiveDate>,
    pub report_numbers: Vec<u32>,
    pub pages: Vec<u32>,
    pub order_in_table: usize,
}

impl CompressedAction {
    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn earliest_report(&self) -> Option<u32> {
        self.report_numbers.first().copied()
    }

    /// Sort and deduplicate the occurrence lists in place
    pub fn normalize(&mut self) {
        self.dates.sort_unstable();
        self.dates.dedup();
        self.report_numbers.sort_unstable();
        self.report_numbers.dedup();
        self.pages.sort_unstable();
        self.pages.dedup();
    }
}
