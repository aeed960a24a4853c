//! Splits report pages into per-subject table blocks
//!
//! Only line-level heuristics are used: a line opening with a subject header
//! closes the table being accumulated and starts the next one. Page ranges
//! are page-granular, from the page holding the header to the page where the
//! scan moved on to the next table.

use minutes_types::{Page, ReportSpan, TableBlock};
use regex::Regex;
use tracing::info;

use crate::config::ChronologyConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Result;
use crate::patterns::SubjectHeaders;

pub struct TableSegmenter {
    headers: SubjectHeaders,
    boilerplate: Regex,
    header_pages_to_skip: u32,
}

/// Text accumulated for the table being scanned
struct Buffer {
    start_page: u32,
    text: String,
}

impl TableSegmenter {
    pub fn new(config: &ChronologyConfig) -> Result<Self> {
        Ok(Self {
            headers: config.subject_headers(),
            boilerplate: config.boilerplate_regex()?,
            header_pages_to_skip: config.header_pages_to_skip,
        })
    }

    pub fn segment(
        &self,
        pages: &[Page],
        spans: &[ReportSpan],
        diagnostics: &mut Diagnostics,
    ) -> Vec<TableBlock> {
        let mut blocks = Vec::new();
        for span in spans {
            self.segment_report(pages, span, &mut blocks, diagnostics);
        }
        info!(tables = blocks.len(), "segmented reports into tables");
        blocks
    }

    fn segment_report(
        &self,
        pages: &[Page],
        span: &ReportSpan,
        blocks: &mut Vec<TableBlock>,
        diagnostics: &mut Diagnostics,
    ) {
        let first_table_page = span.page_start + self.header_pages_to_skip;
        let mut body_pages = pages
            .iter()
            .filter(|p| p.number >= first_table_page && p.number <= span.page_end)
            .peekable();

        let Some(first) = body_pages.peek() else {
            return;
        };
        let mut buffer = Buffer {
            start_page: first.number,
            text: String::new(),
        };
        let mut current_page = first.number;

        for page in body_pages {
            current_page = page.number;
            let text = self.boilerplate.replace_all(&page.text, "");

            for line in text.split('\n') {
                if self.headers.is_table_start(line) {
                    let finished = std::mem::replace(
                        &mut buffer,
                        Buffer {
                            start_page: current_page,
                            text: line.to_string(),
                        },
                    );
                    self.close(span, finished, current_page, blocks, diagnostics);
                } else {
                    buffer.text.push('\n');
                    buffer.text.push_str(line);
                }
            }
        }

        self.close(span, buffer, current_page, blocks, diagnostics);
    }

    fn close(
        &self,
        span: &ReportSpan,
        buffer: Buffer,
        page_end: u32,
        blocks: &mut Vec<TableBlock>,
        diagnostics: &mut Diagnostics,
    ) {
        if self.headers.is_table_start(&buffer.text) {
            blocks.push(TableBlock {
                report_number: span.report_number,
                page_start: buffer.start_page,
                page_end,
                raw_text: buffer.text,
            });
        } else if !buffer.text.trim().is_empty() {
            diagnostics.record(Diagnostic::UnrecognizedTableHeader {
                report_number: span.report_number,
                page_start: buffer.start_page,
            });
        }
    }
}
