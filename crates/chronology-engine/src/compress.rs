//! Near-duplicate compression of recurring actions
//!
//! Recurring agenda items are restated report after report with small
//! wording drift. Compression runs in two phases per subject:
//!
//! 1. exact grouping on trimmed text, which collapses verbatim repeats;
//! 2. fuzzy linking of the remaining distinct texts: two texts are linked
//!    when their Levenshtein distance is at most `max_distance_percent` of
//!    the shorter text's length. Connected components of the link graph are
//!    the final clusters.
//!
//! Each cluster becomes one [`CompressedAction`] carrying every date, report
//! number and page it was seen on.

use chrono::NaiveDate;
use minutes_types::{ActionCell, CompressedAction};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// One source row contributing to a group
#[derive(Debug, Clone, Copy)]
struct Occurrence {
    report_number: u32,
    page: u32,
    line_order: usize,
}

/// Cells sharing an identical trimmed text
#[derive(Debug)]
struct ExactGroup<'a> {
    text: &'a str,
    dates: BTreeSet<NaiveDate>,
    occurrences: Vec<Occurrence>,
}

/// Union-find over group indices
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DuplicateCompressor {
    max_distance_percent: u32,
}

impl Default for DuplicateCompressor {
    fn default() -> Self {
        Self::new(10)
    }
}

impl DuplicateCompressor {
    pub fn new(max_distance_percent: u32) -> Self {
        Self {
            max_distance_percent,
        }
    }

    /// Relative edit-distance test between two distinct texts
    pub fn is_near_duplicate(&self, a: &str, b: &str) -> bool {
        let shorter = a.chars().count().min(b.chars().count());
        let distance = strsim::levenshtein(a, b);
        distance * 100 <= self.max_distance_percent as usize * shorter
    }

    /// Compress cells of every subject, subjects kept in appearance order
    pub fn compress(&self, cells: &[ActionCell]) -> Vec<CompressedAction> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut subjects: Vec<(&str, Vec<&ActionCell>)> = Vec::new();
        for cell in cells {
            let slot = *index.entry(cell.subject_title.as_str()).or_insert_with(|| {
                subjects.push((cell.subject_title.as_str(), Vec::new()));
                subjects.len() - 1
            });
            subjects[slot].1.push(cell);
        }

        let compressed: Vec<CompressedAction> = subjects
            .par_iter()
            .map(|(title, subject_cells)| self.compress_subject(title, subject_cells))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        info!(
            cells = cells.len(),
            subjects = subjects.len(),
            actions = compressed.len(),
            "compressed duplicate cells"
        );
        compressed
    }

    /// Compress the cells of a single subject
    pub fn compress_subject(
        &self,
        subject_title: &str,
        cells: &[&ActionCell],
    ) -> Vec<CompressedAction> {
        let groups = Self::group_exact(cells);
        let clusters = self.cluster(&groups);
        debug!(
            subject = subject_title,
            groups = groups.len(),
            clusters = clusters.len(),
            "clustered subject"
        );

        let mut actions: Vec<CompressedAction> = clusters
            .iter()
            .map(|members| Self::aggregate(subject_title, &groups, members))
            .collect();

        actions.sort_by(|a, b| {
            (a.earliest_report(), a.order_in_table, &a.text).cmp(&(
                b.earliest_report(),
                b.order_in_table,
                &b.text,
            ))
        });
        actions
    }

    /// Phase 1: group by trimmed text, groups ordered by text
    fn group_exact<'a>(cells: &[&'a ActionCell]) -> Vec<ExactGroup<'a>> {
        let mut by_text: BTreeMap<&'a str, ExactGroup<'a>> = BTreeMap::new();
        for &cell in cells {
            let text = cell.text.trim();
            let group = by_text.entry(text).or_insert_with(|| ExactGroup {
                text,
                dates: BTreeSet::new(),
                occurrences: Vec::new(),
            });
            group.dates.extend(cell.date);
            group.occurrences.push(Occurrence {
                report_number: cell.report_number,
                page: cell.page_start,
                line_order: cell.order_in_table,
            });
        }
        by_text.into_values().collect()
    }

    /// Phase 2: connected components of the near-duplicate graph
    ///
    /// Clusters are listed by their smallest member index, members ascending.
    fn cluster(&self, groups: &[ExactGroup<'_>]) -> Vec<Vec<usize>> {
        let n = groups.len();
        let edges: Vec<(usize, usize)> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                (i + 1..n)
                    .filter(move |&j| self.is_near_duplicate(groups[i].text, groups[j].text))
                    .map(move |j| (i, j))
            })
            .collect();

        let mut set = DisjointSet::new(n);
        for (a, b) in edges {
            set.union(a, b);
        }

        let mut cluster_of_root: HashMap<usize, usize> = HashMap::new();
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for node in 0..n {
            let root = set.find(node);
            let slot = *cluster_of_root.entry(root).or_insert_with(|| {
                clusters.push(Vec::new());
                clusters.len() - 1
            });
            clusters[slot].push(node);
        }
        clusters
    }

    /// Phase 3: merge the groups of one cluster
    fn aggregate(
        subject_title: &str,
        groups: &[ExactGroup<'_>],
        members: &[usize],
    ) -> CompressedAction {
        let mut dates = BTreeSet::new();
        let mut occurrences = Vec::new();
        for &member in members {
            dates.extend(groups[member].dates.iter().copied());
            occurrences.extend(groups[member].occurrences.iter().copied());
        }

        // The earliest report mentioning the action fixes its position
        let order_in_table = occurrences
            .iter()
            .min_by_key(|o| (o.report_number, o.line_order))
            .map(|o| o.line_order)
            .unwrap_or_default();

        let mut action = CompressedAction {
            subject_title: subject_title.to_string(),
            text: groups[members[0]].text.to_string(),
            dates: dates.into_iter().collect(),
            report_numbers: occurrences.iter().map(|o| o.report_number).collect(),
            pages: occurrences.iter().map(|o| o.page).collect(),
            order_in_table,
        };
        action.normalize();
        action
    }
}
