//! Report boundary detection
//!
//! Every page of a report repeats the report number in its banner
//! (`CR 04`, `CR OPC N° 04`, ...). Consecutive pages sharing a number form
//! one report span; a change of number closes the span on the previous page.

use minutes_types::{Page, ReportSpan};
use std::collections::BTreeSet;
use tracing::info;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::patterns::REPORT_NUMBER_PATTERN;

/// Report number found on a page, with its optional sub-type tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReportNumber {
    pub type_tag: Option<String>,
    pub number: u32,
}

pub struct ReportBoundaryDetector;

impl ReportBoundaryDetector {
    /// Extract the report number printed on a page
    ///
    /// When several tokens on the page disagree, tokens without a sub-type
    /// tag are discarded; body text quoting an older report rarely carries
    /// the tag while the page banner does.
    pub fn report_number_of(text: &str) -> Option<PageReportNumber> {
        let matches: Vec<PageReportNumber> = REPORT_NUMBER_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let number = caps.get(2)?.as_str().parse().ok()?;
                Some(PageReportNumber {
                    type_tag: caps.get(1).map(|m| m.as_str().to_string()),
                    number,
                })
            })
            .collect();

        let first = matches.first()?;
        if matches.iter().all(|m| m.number == first.number) {
            return Some(first.clone());
        }

        matches
            .iter()
            .find(|m| m.type_tag.is_some())
            .or(Some(first))
            .cloned()
    }

    /// Compute the page span of every report
    ///
    /// Pages without a report number are recorded as diagnostics and never
    /// open or close a span. A page range running up to the next report
    /// still covers them.
    pub fn detect(pages: &[Page], diagnostics: &mut Diagnostics) -> Vec<ReportSpan> {
        let mut spans = Vec::new();
        let mut current: Option<ReportSpan> = None;
        let mut last_matched_page = 0;

        for page in pages {
            let Some(found) = Self::report_number_of(&page.text) else {
                diagnostics.record(Diagnostic::UnmatchedReportNumber { page: page.number });
                continue;
            };
            last_matched_page = page.number;

            if let Some(span) = current
                .as_mut()
                .filter(|span| span.report_number == found.number)
            {
                span.type_tags.extend(found.type_tag);
                continue;
            }

            if let Some(mut span) = current.take() {
                span.page_end = page.number.saturating_sub(1).max(span.page_start);
                spans.push(span);
            }
            current = Some(ReportSpan {
                report_number: found.number,
                page_start: page.number,
                page_end: page.number,
                type_tags: found.type_tag.into_iter().collect::<BTreeSet<_>>(),
            });
        }

        match current {
            Some(mut span) => {
                span.page_end = last_matched_page;
                spans.push(span);
            }
            None => diagnostics.record(Diagnostic::NoReportBoundaryFound),
        }

        info!(reports = spans.len(), "detected report boundaries");
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn span(report_number: u32, page_start: u32, page_end: u32, tags: &[&str]) -> ReportSpan {
        ReportSpan {
            report_number,
            page_start,
            page_end,
            type_tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_consecutive_pages_extend_span() {
        let mut pages: Vec<Page> = (1..10).map(|n| Page::new(n, "cover")).collect();
        pages.push(Page::new(10, "Compte rendu CR 04"));
        pages.push(Page::new(11, "CR 04 suite"));
        pages.push(Page::new(12, "CR 04 fin"));
        pages.push(Page::new(13, "CR 05"));

        let mut diagnostics = Diagnostics::new();
        let spans = ReportBoundaryDetector::detect(&pages, &mut diagnostics);

        assert_eq!(spans, vec![span(4, 10, 12, &[]), span(5, 13, 13, &[])]);
        assert_eq!(diagnostics.len(), 9);
    }

    #[test]
    fn test_inconsistent_numbers_prefer_tagged_match() {
        let found =
            ReportBoundaryDetector::report_number_of("voir CR 03 page 2\nCR OPC N° 04").unwrap();
        assert_eq!(
            found,
            PageReportNumber {
                type_tag: Some("OPC".to_string()),
                number: 4
            }
        );
    }

    #[test]
    fn test_consistent_numbers_keep_first_match() {
        let found = ReportBoundaryDetector::report_number_of("CR 04 ... CR OPC 04").unwrap();
        assert_eq!(found.number, 4);
        assert_eq!(found.type_tag, None);
    }

    #[test]
    fn test_inconsistent_numbers_without_tags_fall_back_to_first() {
        let found = ReportBoundaryDetector::report_number_of("CR 03 et CR 04").unwrap();
        assert_eq!(found.number, 3);
    }

    #[test]
    fn test_type_tags_accumulate() {
        let pages = vec![
            Page::new(1, "CR 07"),
            Page::new(2, "CR OPC 07"),
            Page::new(3, "CR SPS 07"),
            Page::new(4, "CR OPC 08"),
        ];
        let spans = ReportBoundaryDetector::detect(&pages, &mut Diagnostics::new());
        assert_eq!(
            spans,
            vec![span(7, 1, 3, &["OPC", "SPS"]), span(8, 4, 4, &["OPC"])]
        );
    }

    #[test]
    fn test_unmatched_interior_page_stays_in_range() {
        let pages = vec![
            Page::new(1, "CR 01"),
            Page::new(2, "blank scan"),
            Page::new(3, "CR 02"),
            Page::new(4, "CR 02"),
            Page::new(5, "annex without banner"),
        ];
        let mut diagnostics = Diagnostics::new();
        let spans = ReportBoundaryDetector::detect(&pages, &mut diagnostics);

        // Trailing unmatched pages are dropped
        assert_eq!(spans, vec![span(1, 1, 2, &[]), span(2, 3, 4, &[])]);
        assert_eq!(
            diagnostics.entries(),
            &[
                Diagnostic::UnmatchedReportNumber { page: 2 },
                Diagnostic::UnmatchedReportNumber { page: 5 },
            ]
        );
    }

    #[test]
    fn test_no_report_number_yields_empty() {
        let pages = vec![Page::new(1, "hello"), Page::new(2, "world")];
        let mut diagnostics = Diagnostics::new();
        let spans = ReportBoundaryDetector::detect(&pages, &mut diagnostics);

        assert!(spans.is_empty());
        assert_eq!(
            diagnostics.entries().last(),
            Some(&Diagnostic::NoReportBoundaryFound)
        );
    }

    proptest! {
        /// Property: spans of a well-formed document are contiguous and,
        /// together with the unnumbered prefix, cover every page
        #[test]
        fn spans_partition_pages(
            prefix in 0u32..5,
            report_lengths in prop::collection::vec(1u32..6, 1..12),
        ) {
            let mut pages: Vec<Page> = (1..=prefix).map(|n| Page::new(n, "garde")).collect();
            let mut number = prefix + 1;
            for (idx, len) in report_lengths.iter().enumerate() {
                for _ in 0..*len {
                    pages.push(Page::new(number, format!("CR {:02}", idx + 1)));
                    number += 1;
                }
            }

            let spans = ReportBoundaryDetector::detect(&pages, &mut Diagnostics::new());

            prop_assert_eq!(spans.len(), report_lengths.len());
            prop_assert_eq!(spans[0].page_start, prefix + 1);
            for pair in spans.windows(2) {
                prop_assert_eq!(pair[0].page_end + 1, pair[1].page_start);
                prop_assert_eq!(pair[0].report_number + 1, pair[1].report_number);
            }
            let covered: u32 = spans.iter().map(|s| s.page_count()).sum();
            prop_assert_eq!(covered + prefix, pages.len() as u32);
        }
    }
}
