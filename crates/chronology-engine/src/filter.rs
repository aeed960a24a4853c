//! Query-time filtering of extracted records
//!
//! The same discipline applies at every granularity: subject substring,
//! date range and report-number range, each bound optional. Filtering only
//! ever subsets its input.

use chrono::NaiveDate;
use minutes_types::{ActionCell, CompressedAction, ReportSpan};
use serde::{Deserialize, Serialize};

/// Read-only query descriptor; `Filter::default()` matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Requested subject substrings, matched case-sensitively
    pub subjects: Option<Vec<String>>,
    #[serde(default, with = "minutes_types::date_format::optional")]
    pub date_min: Option<NaiveDate>,
    #[serde(default, with = "minutes_types::date_format::optional")]
    pub date_max: Option<NaiveDate>,
    pub report_num_min: Option<u32>,
    pub report_num_max: Option<u32>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = Some(subjects.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_date_bounds(mut self, min: Option<NaiveDate>, max: Option<NaiveDate>) -> Self {
        self.date_min = min;
        self.date_max = max;
        self
    }

    pub fn with_report_bounds(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.report_num_min = min;
        self.report_num_max = max;
        self
    }

    pub fn has_date_bounds(&self) -> bool {
        self.date_min.is_some() || self.date_max.is_some()
    }

    pub fn has_report_bounds(&self) -> bool {
        self.report_num_min.is_some() || self.report_num_max.is_some()
    }

    /// True when some requested substring occurs in `subject_title`
    pub fn accepts_subject(&self, subject_title: &str) -> bool {
        match &self.subjects {
            None => true,
            Some(requested) => requested.iter().any(|s| subject_title.contains(s.as_str())),
        }
    }

    /// Undated items fail any present date bound
    pub fn accepts_date(&self, date: Option<NaiveDate>) -> bool {
        if !self.has_date_bounds() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.date_min.map_or(true, |min| date >= min) && self.date_max.map_or(true, |max| date <= max)
    }

    pub fn accepts_report(&self, report_number: Option<u32>) -> bool {
        if !self.has_report_bounds() {
            return true;
        }
        let Some(number) = report_number else {
            return false;
        };
        self.report_num_min.map_or(true, |min| number >= min)
            && self.report_num_max.map_or(true, |max| number <= max)
    }
}

/// Records that can be narrowed by a [`Filter`]
pub trait Filterable {
    fn matches(&self, filter: &Filter) -> bool;
}

impl Filterable for CompressedAction {
    fn matches(&self, filter: &Filter) -> bool {
        filter.accepts_subject(&self.subject_title)
            && filter.accepts_date(self.earliest_date())
            && filter.accepts_report(self.earliest_report())
    }
}

impl Filterable for ActionCell {
    fn matches(&self, filter: &Filter) -> bool {
        filter.accepts_subject(&self.subject_title)
            && filter.accepts_date(self.date)
            && filter.accepts_report(Some(self.report_number))
    }
}

/// Spans carry no subject or date; only report bounds apply
impl Filterable for ReportSpan {
    fn matches(&self, filter: &Filter) -> bool {
        filter.accepts_report(Some(self.report_number))
    }
}

/// Subset of `items` matching `filter`, input order preserved
pub fn filter<T: Filterable + Clone>(items: &[T], filter: &Filter) -> Vec<T> {
    items.iter().filter(|item| item.matches(filter)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn action(subject: &str, reports: Vec<u32>, dates: Vec<NaiveDate>) -> CompressedAction {
        CompressedAction {
            subject_title: subject.to_string(),
            text: format!("{} action", subject),
            dates,
            pages: reports.iter().map(|r| r * 10).collect(),
            report_numbers: reports,
            order_in_table: 0,
        }
    }

    fn sample() -> Vec<CompressedAction> {
        vec![
            action("Lot 2 Gros oeuvre", vec![1, 4], vec![date(2011, 3, 15)]),
            action("Lot 14 Plomberie", vec![3], vec![date(2012, 6, 1)]),
            action("Lot 24 Espaces verts", vec![7, 8], vec![]),
            action("SPS Coordination", vec![5], vec![date(2011, 1, 1), date(2013, 1, 2)]),
        ]
    }

    #[test]
    fn test_default_filter_returns_input_unchanged() {
        let actions = sample();
        assert_eq!(filter(&actions, &Filter::default()), actions);
    }

    #[test]
    fn test_subject_substring_can_match_several_subjects() {
        let narrowed = filter(&sample(), &Filter::new().with_subjects(["Lot 2"]));
        let subjects: Vec<_> = narrowed.iter().map(|a| a.subject_title.as_str()).collect();
        // "Lot 2" is also a prefix of "Lot 24"
        assert_eq!(subjects, vec!["Lot 2 Gros oeuvre", "Lot 24 Espaces verts"]);

        let exact = filter(&sample(), &Filter::new().with_subjects(["Lot 2 "]));
        assert_eq!(exact.len(), 1);
    }

    #[test]
    fn test_subject_match_is_case_sensitive() {
        let narrowed = filter(&sample(), &Filter::new().with_subjects(["sps"]));
        assert!(narrowed.is_empty());
    }

    #[test]
    fn test_date_bounds_use_earliest_date() {
        let f = Filter::new().with_date_bounds(Some(date(2011, 1, 1)), Some(date(2011, 12, 31)));
        let narrowed = filter(&sample(), &f);
        let subjects: Vec<_> = narrowed.iter().map(|a| a.subject_title.as_str()).collect();
        // Undated actions fail a date bound
        assert_eq!(subjects, vec!["Lot 2 Gros oeuvre", "SPS Coordination"]);
    }

    #[test]
    fn test_report_bounds_on_spans_and_cells() {
        let spans: Vec<ReportSpan> = (1..=5)
            .map(|n| ReportSpan {
                report_number: n,
                page_start: n * 10,
                page_end: n * 10 + 9,
                type_tags: Default::default(),
            })
            .collect();
        let f = Filter::new().with_report_bounds(Some(2), Some(3));
        let kept: Vec<u32> = filter(&spans, &f).iter().map(|s| s.report_number).collect();
        assert_eq!(kept, vec![2, 3]);

        let cell = ActionCell {
            report_number: 4,
            page_start: 40,
            page_end: 40,
            subject_title: "Lot 2".to_string(),
            company: String::new(),
            date: None,
            text: "x".to_string(),
            order_in_table: 0,
        };
        assert!(!cell.matches(&f));
        assert!(cell.matches(&Filter::new().with_report_bounds(Some(4), None)));
    }

    #[test]
    fn test_filter_roundtrips_through_json() {
        let f = Filter::new()
            .with_subjects(["Lot 2 "])
            .with_date_bounds(Some(date(2011, 3, 15)), None)
            .with_report_bounds(None, Some(5));
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("15-03-2011"));
        assert_eq!(serde_json::from_str::<Filter>(&json).unwrap(), f);
    }

    proptest! {
        /// Property: report bounds keep exactly the actions whose earliest
        /// report number lies in [a, b]
        #[test]
        fn report_bounds_select_exact_subset(
            reports in prop::collection::vec(prop::collection::btree_set(1u32..60, 1..4), 0..30),
            a in 0u32..60,
            span in 0u32..30,
        ) {
            let b = a + span;
            let actions: Vec<CompressedAction> = reports
                .into_iter()
                .map(|set| action("Lot 1", set.into_iter().collect(), vec![]))
                .collect();

            let kept = filter(&actions, &Filter::new().with_report_bounds(Some(a), Some(b)));
            let expected: Vec<CompressedAction> = actions
                .iter()
                .filter(|x| (a..=b).contains(&x.report_numbers[0]))
                .cloned()
                .collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
