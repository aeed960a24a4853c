//! Cell extraction from a subject table
//!
//! Table layout, line by line:
//! - line 0: subject title
//! - line 1: company / responsible party
//! - then cells: a `DD/MM/YY` line opens a dated cell, following non-empty
//!   lines continue it, and a blank line closes it.

use chrono::NaiveDate;
use minutes_types::{ActionCell, TableBlock};
use tracing::info;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::patterns::{DATE_TOKEN_LEN, DATE_TOKEN_PATTERN};

pub struct CellExtractor;

/// Outcome of matching a line against the date token pattern
enum DateToken {
    Valid(NaiveDate),
    Invalid(String),
}

/// Cell accumulator threaded through the body lines
struct CellState {
    date: Option<NaiveDate>,
    buffer: String,
    closed: Vec<(Option<NaiveDate>, String, usize)>,
}

impl CellState {
    fn close(&mut self, line_order: usize) {
        let text = std::mem::take(&mut self.buffer);
        self.closed.push((self.date, text, line_order));
    }

    fn append(&mut self, line: &str) {
        if !self.buffer.trim().is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);
    }
}

impl CellExtractor {
    pub fn extract_all(blocks: &[TableBlock], diagnostics: &mut Diagnostics) -> Vec<ActionCell> {
        let cells: Vec<ActionCell> = blocks
            .iter()
            .flat_map(|block| Self::extract(block, diagnostics))
            .collect();
        info!(cells = cells.len(), "extracted action cells");
        cells
    }

    pub fn extract(block: &TableBlock, diagnostics: &mut Diagnostics) -> Vec<ActionCell> {
        let lines: Vec<&str> = block.raw_text.split('\n').collect();
        let subject_title = lines.first().map(|l| l.trim_matches(' ')).unwrap_or_default();
        let company = lines.get(1).copied().unwrap_or_default();
        let body = lines.get(2..).unwrap_or_default();

        let mut state = CellState {
            date: None,
            buffer: String::new(),
            closed: Vec::new(),
        };

        for (line_order, line) in body.iter().enumerate() {
            if line.trim().is_empty() {
                state.close(line_order);
                continue;
            }

            match Self::date_token(line) {
                Some(DateToken::Valid(date)) => {
                    state.close(line_order);
                    state.date = Some(date);
                    state.buffer = line[DATE_TOKEN_LEN..].trim_matches(' ').to_string();
                }
                Some(DateToken::Invalid(token)) => {
                    diagnostics.record(Diagnostic::InvalidDate {
                        report_number: block.report_number,
                        subject_title: subject_title.to_string(),
                        token,
                    });
                    state.append(line);
                }
                None => state.append(line),
            }
        }
        state.close(body.len());

        state
            .closed
            .into_iter()
            .filter(|(_, text, _)| !text.trim().is_empty())
            .map(|(date, text, order_in_table)| ActionCell {
                report_number: block.report_number,
                page_start: block.page_start,
                page_end: block.page_end,
                subject_title: subject_title.to_string(),
                company: company.to_string(),
                date,
                text,
                order_in_table,
            })
            .collect()
    }

    /// Parse a leading `DD/MM/YY` token, years offset by 2000
    fn date_token(line: &str) -> Option<DateToken> {
        let caps = DATE_TOKEN_PATTERN.captures(line)?;
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;

        Some(match NaiveDate::from_ymd_opt(2000 + year, month, day) {
            Some(date) => DateToken::Valid(date),
            None => DateToken::Invalid(line[..DATE_TOKEN_LEN].to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(raw_text: &str) -> TableBlock {
        TableBlock {
            report_number: 4,
            page_start: 10,
            page_end: 11,
            raw_text: raw_text.to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_two_dated_cells() {
        let cells = CellExtractor::extract(
            &block("Lot 2 \nCompany X\n01/01/20 Issue raised\n\n02/01/20 Issue raised again\n"),
            &mut Diagnostics::new(),
        );

        assert_eq!(
            cells,
            vec![
                ActionCell {
                    report_number: 4,
                    page_start: 10,
                    page_end: 11,
                    subject_title: "Lot 2".to_string(),
                    company: "Company X".to_string(),
                    date: Some(date(2020, 1, 1)),
                    text: "Issue raised".to_string(),
                    order_in_table: 1,
                },
                ActionCell {
                    report_number: 4,
                    page_start: 10,
                    page_end: 11,
                    subject_title: "Lot 2".to_string(),
                    company: "Company X".to_string(),
                    date: Some(date(2020, 1, 2)),
                    text: "Issue raised again".to_string(),
                    order_in_table: 3,
                },
            ]
        );
    }

    #[test]
    fn test_continuation_lines_join_with_newline() {
        let cells = CellExtractor::extract(
            &block("SPS\nCabinet S\n03/04/12 Scaffold\nmissing guard rail\non north face\n"),
            &mut Diagnostics::new(),
        );
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].text, "Scaffold\nmissing guard rail\non north face");
        assert_eq!(cells[0].date, Some(date(2012, 4, 3)));
    }

    #[test]
    fn test_date_line_closes_cell_under_previous_date() {
        let cells = CellExtractor::extract(
            &block("Lot 5\nSociete E\nundated note\n05/06/12 dated note\nmore\n07/06/12 next"),
            &mut Diagnostics::new(),
        );
        let summary: Vec<_> = cells
            .iter()
            .map(|c| (c.date, c.text.as_str(), c.order_in_table))
            .collect();
        assert_eq!(
            summary,
            vec![
                (None, "undated note", 1),
                (Some(date(2012, 6, 5)), "dated note\nmore", 3),
                // Flushed at end of table
                (Some(date(2012, 6, 7)), "next", 4),
            ]
        );
    }

    #[test]
    fn test_invalid_calendar_date_is_continuation_text() {
        let mut diagnostics = Diagnostics::new();
        let cells = CellExtractor::extract(
            &block("Lot 5\nSociete E\n01/02/12 first\n31/02/12 not a date\n"),
            &mut diagnostics,
        );
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].text, "first\n31/02/12 not a date");
        assert_eq!(
            diagnostics.entries(),
            &[Diagnostic::InvalidDate {
                report_number: 4,
                subject_title: "Lot 5".to_string(),
                token: "31/02/12".to_string(),
            }]
        );
    }

    #[test]
    fn test_loose_date_formats_are_continuation_text() {
        let cells = CellExtractor::extract(
            &block("Lot 5\nSociete E\n01/02/12 first\n1/3/12 second\n01/03/2012 third\n"),
            &mut Diagnostics::new(),
        );
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].text, "first\n1/3/12 second\n01/03/2012 third");
    }

    #[test]
    fn test_whitespace_only_cells_are_dropped() {
        let cells = CellExtractor::extract(
            &block("Lot 5\nSociete E\n01/02/12   \n   \n\n"),
            &mut Diagnostics::new(),
        );
        assert!(cells.is_empty());
    }

    #[test]
    fn test_header_only_blocks() {
        let mut diagnostics = Diagnostics::new();
        assert!(CellExtractor::extract(&block("Lot 5"), &mut diagnostics).is_empty());
        assert!(CellExtractor::extract(&block("Lot 5\nSociete E"), &mut diagnostics).is_empty());
    }

    #[test]
    fn test_extract_all_preserves_block_order() {
        let blocks = vec![
            block("Lot 1\nA\n01/01/20 one\n"),
            block("Lot 2\nB\n02/01/20 two\n"),
        ];
        let cells = CellExtractor::extract_all(&blocks, &mut Diagnostics::new());
        let titles: Vec<_> = cells.iter().map(|c| c.subject_title.as_str()).collect();
        assert_eq!(titles, vec!["Lot 1", "Lot 2"]);
    }
}
