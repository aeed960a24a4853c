//! Configuration for the extraction heuristics
//!
//! The defaults describe the single report format the heuristics were built
//! for. A TOML file may override any of them:
//!
//! ```toml
//! header_pages_to_skip = 2
//! lot_prefix = "Lot"
//! section_titles = ["SPS", "OPC"]
//! max_distance_percent = 15
//! cache_dir = "./cache"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ChronologyError, Result};
use crate::patterns::{
    SubjectHeaders, DEFAULT_BOILERPLATE_PATTERN, DEFAULT_LOT_PREFIX, DEFAULT_SECTION_TITLES,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronologyConfig {
    /// Cover pages skipped at the start of each report
    pub header_pages_to_skip: u32,
    /// Page banner/footer stripped before line classification
    pub page_boilerplate_pattern: String,
    /// Any line starting with this prefix opens a lot table
    pub lot_prefix: String,
    /// Section titles that open a table when followed by a space
    pub section_titles: Vec<String>,
    /// Two texts merge when distance * 100 <= percent * shorter length
    pub max_distance_percent: u32,
    /// Directory of the file-backed cache, if any
    pub cache_dir: Option<PathBuf>,
}

impl Default for ChronologyConfig {
    fn default() -> Self {
        Self {
            header_pages_to_skip: 3,
            page_boilerplate_pattern: DEFAULT_BOILERPLATE_PATTERN.to_string(),
            lot_prefix: DEFAULT_LOT_PREFIX.to_string(),
            section_titles: DEFAULT_SECTION_TITLES.iter().map(|t| t.to_string()).collect(),
            max_distance_percent: 10,
            cache_dir: None,
        }
    }
}

impl ChronologyConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ChronologyError::Config` if the file cannot be read, the TOML
    /// is malformed, or the boilerplate pattern is not a valid regex.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ChronologyError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| ChronologyError::Config(e.to_string()))?;
        config.boilerplate_regex()?;
        Ok(config)
    }

    pub fn boilerplate_regex(&self) -> Result<Regex> {
        Regex::new(&self.page_boilerplate_pattern).map_err(|e| {
            ChronologyError::Config(format!("page_boilerplate_pattern: {}", e))
        })
    }

    pub fn subject_headers(&self) -> SubjectHeaders {
        SubjectHeaders::new(&self.lot_prefix, &self.section_titles)
    }
}
