//! Extraction and compression of recurring actions from meeting minutes
//!
//! The pipeline runs left to right over immutable inputs:
//!
//! 1. [`ReportBoundaryDetector`] finds report spans in the page sequence;
//! 2. [`TableSegmenter`] cuts each report into per-subject table blocks;
//! 3. [`CellExtractor`] parses each block into dated action cells;
//! 4. [`DuplicateCompressor`] merges near-duplicate cells across reports.
//!
//! [`filter()`] narrows any stage's output at query time. [`ChronologyEngine`]
//! wires the stages to a page source and an optional cache.

pub mod boundaries;
pub mod cache;
pub mod cells;
pub mod compress;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod patterns;
pub mod render;
pub mod segmenter;
pub mod table;

pub use boundaries::ReportBoundaryDetector;
pub use cache::{CacheError, CacheKeys, FileStore, KeyValueStore, MemoryStore};
pub use cells::CellExtractor;
pub use compress::DuplicateCompressor;
pub use config::ChronologyConfig;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{ChronologyError, Result};
pub use filter::{filter, Filter, Filterable};
pub use render::ChronologyRenderer;
pub use segmenter::TableSegmenter;
pub use table::ActionTable;

use minutes_pdf::PageSource;
use minutes_types::{ActionCell, CompressedAction, Page, ReportSpan};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Everything one extraction call produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub spans: Vec<ReportSpan>,
    pub cells: Vec<ActionCell>,
    pub actions: Vec<CompressedAction>,
    pub diagnostics: Vec<Diagnostic>,
}

/// ChronologyEngine entry point
pub struct ChronologyEngine<S: PageSource> {
    config: ChronologyConfig,
    source: S,
    segmenter: TableSegmenter,
    compressor: DuplicateCompressor,
    store: Option<Box<dyn KeyValueStore>>,
}

impl<S: PageSource> ChronologyEngine<S> {
    /// Build an engine; a `cache_dir` in the config attaches a [`FileStore`]
    pub fn new(config: ChronologyConfig, source: S) -> Result<Self> {
        let store: Option<Box<dyn KeyValueStore>> = match &config.cache_dir {
            Some(dir) => Some(Box::new(FileStore::new(dir)?)),
            None => None,
        };
        Ok(Self {
            segmenter: TableSegmenter::new(&config)?,
            compressor: DuplicateCompressor::new(config.max_distance_percent),
            config,
            source,
            store,
        })
    }

    /// Replace the cache backend
    pub fn with_store(mut self, store: Box<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &ChronologyConfig {
        &self.config
    }

    /// All pages of `source_id`, through the cache when one is attached
    pub fn read_pages(&self, source_id: &str) -> Result<Vec<Page>> {
        let Some(store) = self.store.as_deref() else {
            return Ok(self.source.read_pages(source_id, None)?);
        };
        let content_id = self.source.content_id(source_id)?;
        self.read_cached_pages(store, source_id, &content_id)
    }

    /// An undecodable entry counts as a miss and is overwritten
    fn read_cached_pages(
        &self,
        store: &dyn KeyValueStore,
        source_id: &str,
        content_id: &str,
    ) -> Result<Vec<Page>> {
        let key = CacheKeys::pages(content_id);
        match cache::load_json::<Vec<Page>>(store, &key) {
            Ok(Some(pages)) => return Ok(pages),
            Ok(None) => {}
            Err(e @ CacheError::Encoding { .. }) => {
                warn!(key = key.as_str(), error = %e, "ignoring unreadable cache entry");
            }
            Err(e) => return Err(e.into()),
        }

        let pages = self.source.read_pages(source_id, None)?;
        cache::save_json(store, &key, &pages)?;
        Ok(pages)
    }

    /// Report spans of a source, without table extraction
    pub fn spans(&self, source_id: &str) -> Result<(Vec<ReportSpan>, Vec<Diagnostic>)> {
        let pages = self.read_pages(source_id)?;
        let mut diagnostics = Diagnostics::new();
        let spans = ReportBoundaryDetector::detect(&pages, &mut diagnostics);
        Ok((spans, diagnostics.into_vec()))
    }

    /// Run the full pipeline over a source
    ///
    /// # Errors
    ///
    /// `SourceUnreadable` when the page reader fails, `SubjectNotFound` when
    /// a requested subject matches no subject title.
    pub fn extract(&self, source_id: &str, filter: &Filter) -> Result<Extraction> {
        info!(source = source_id, "extracting chronology");
        let Some(store) = self.store.as_deref() else {
            let pages = self.source.read_pages(source_id, None)?;
            return self.extract_pages(&pages, filter);
        };

        let content_id = self.source.content_id(source_id)?;
        let pages = self.read_cached_pages(store, source_id, &content_id)?;

        // A corrupt table is recomputed and overwritten below
        let key = CacheKeys::compressed(&content_id, filter, &self.config);
        let cached = match store.load(&key)? {
            Some(bytes) => match ActionTable::from_bytes(&bytes) {
                Ok(actions) => Some(actions),
                Err(e) => {
                    warn!(key = key.as_str(), error = %e, "ignoring unreadable cache entry");
                    None
                }
            },
            None => None,
        };

        let hit = cached.is_some();
        let (extraction, compressed) = self.run(&pages, filter, cached)?;
        if !hit {
            store.save(&key, &ActionTable::to_bytes(&compressed)?)?;
        }
        Ok(extraction)
    }

    /// Run the full pipeline over pages already in memory
    pub fn extract_pages(&self, pages: &[Page], filter: &Filter) -> Result<Extraction> {
        self.run(pages, filter, None).map(|(extraction, _)| extraction)
    }

    /// Returns the extraction and the compressed actions before the final
    /// date/report narrowing, which is what the cache holds.
    fn run(
        &self,
        pages: &[Page],
        filter: &Filter,
        cached: Option<Vec<CompressedAction>>,
    ) -> Result<(Extraction, Vec<CompressedAction>)> {
        let mut diagnostics = Diagnostics::new();

        let spans = ReportBoundaryDetector::detect(pages, &mut diagnostics);
        let spans = filter::filter(&spans, filter);

        let blocks = self.segmenter.segment(pages, &spans, &mut diagnostics);
        let cells = CellExtractor::extract_all(&blocks, &mut diagnostics);

        let subject_cells = Self::select_subjects(&cells, filter)?;
        let compressed = match cached {
            Some(actions) => {
                info!(actions = actions.len(), "compressed actions loaded from cache");
                actions
            }
            None => self.compressor.compress(&subject_cells),
        };

        let extraction = Extraction {
            spans,
            cells: filter::filter(&subject_cells, filter),
            actions: filter::filter(&compressed, filter),
            diagnostics: diagnostics.into_vec(),
        };
        info!(
            spans = extraction.spans.len(),
            cells = extraction.cells.len(),
            actions = extraction.actions.len(),
            diagnostics = extraction.diagnostics.len(),
            "extraction complete"
        );
        Ok((extraction, compressed))
    }

    /// Keep the cells of requested subjects, failing on requests that
    /// match no subject title at all
    fn select_subjects(cells: &[ActionCell], filter: &Filter) -> Result<Vec<ActionCell>> {
        let Some(requested) = &filter.subjects else {
            return Ok(cells.to_vec());
        };

        let available: BTreeSet<&str> = cells.iter().map(|c| c.subject_title.as_str()).collect();
        let missing: Vec<String> = requested
            .iter()
            .filter(|s| !available.iter().any(|title| title.contains(s.as_str())))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ChronologyError::SubjectNotFound {
                missing,
                available: available.into_iter().map(String::from).collect(),
            });
        }

        Ok(cells
            .iter()
            .filter(|c| filter.accepts_subject(&c.subject_title))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minutes_pdf::SourceError;
    use pretty_assertions::assert_eq;

    /// Pages held in memory, one fixed document
    struct FixedPages(Vec<Page>);

    impl PageSource for FixedPages {
        fn read_pages(
            &self,
            source_id: &str,
            _pages: Option<&[u32]>,
        ) -> std::result::Result<Vec<Page>, SourceError> {
            if source_id != "fixed" {
                return Err(SourceError::NotFound(source_id.to_string()));
            }
            Ok(self.0.clone())
        }

        fn content_id(&self, _source_id: &str) -> std::result::Result<String, SourceError> {
            Ok("fixed-content".to_string())
        }
    }

    fn report(number: u32, first_page: u32, table: &str) -> Vec<Page> {
        let tag = format!("CR N° {:02}", number);
        let mut pages: Vec<Page> = (0..3)
            .map(|i| Page::new(first_page + i, format!("{}\nCover page {}", tag, i)))
            .collect();
        pages.push(Page::new(first_page + 3, format!("{}\n{}", tag, table)));
        pages
    }

    fn engine() -> ChronologyEngine<FixedPages> {
        let mut pages = report(1, 1, "Lot 2 Gros oeuvre\nSociete A\n01/02/11 Reprise des fissures\n");
        pages.extend(report(
            2,
            5,
            "Lot 2 Gros oeuvre\nSociete A\n01/03/11 Reprise des fisures\n\nSPS Visite\nCabinet S\n02/03/11 Garde-corps absent\n",
        ));
        ChronologyEngine::new(ChronologyConfig::default(), FixedPages(pages)).unwrap()
    }

    #[test]
    fn test_extract_compresses_across_reports() {
        let extraction = engine().extract("fixed", &Filter::default()).unwrap();

        assert_eq!(extraction.spans.len(), 2);
        assert_eq!(extraction.cells.len(), 3);
        let summary: Vec<_> = extraction
            .actions
            .iter()
            .map(|a| (a.subject_title.as_str(), a.report_numbers.clone(), a.pages.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Lot 2 Gros oeuvre", vec![1, 2], vec![4, 8]),
                ("SPS Visite", vec![2], vec![8]),
            ]
        );
    }

    #[test]
    fn test_report_bounds_apply_before_segmentation() {
        let f = Filter::new().with_report_bounds(Some(2), None);
        let extraction = engine().extract("fixed", &f).unwrap();

        assert_eq!(extraction.spans.iter().map(|s| s.report_number).collect::<Vec<_>>(), vec![2]);
        assert!(extraction.cells.iter().all(|c| c.report_number == 2));
        assert_eq!(extraction.actions[0].report_numbers, vec![2]);
    }

    #[test]
    fn test_unknown_subject_is_an_error() {
        let f = Filter::new().with_subjects(["SPS", "Lot 9"]);
        match engine().extract("fixed", &f) {
            Err(ChronologyError::SubjectNotFound { missing, available }) => {
                assert_eq!(missing, vec!["Lot 9".to_string()]);
                assert_eq!(available, vec!["Lot 2 Gros oeuvre".to_string(), "SPS Visite".to_string()]);
            }
            other => panic!("expected SubjectNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_source_propagates() {
        let err = engine().extract("other", &Filter::default()).unwrap_err();
        assert!(matches!(err, ChronologyError::SourceUnreadable(SourceError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_page_entry_is_reread() {
        let store = MemoryStore::new();
        store
            .save(&CacheKeys::pages("fixed-content"), b"{truncated")
            .unwrap();
        let cached = engine().with_store(Box::new(store));

        let extraction = cached.extract("fixed", &Filter::default()).unwrap();
        assert_eq!(extraction, engine().extract("fixed", &Filter::default()).unwrap());
        assert_eq!(cached.read_pages("fixed").unwrap().len(), 8);
    }

    #[test]
    fn test_memory_cache_is_filled_and_reused() {
        let engine = engine().with_store(Box::new(MemoryStore::new()));
        let first = engine.extract("fixed", &Filter::default()).unwrap();
        let second = engine.extract("fixed", &Filter::default()).unwrap();
        assert_eq!(first, second);
    }
}
