//! Regex patterns and header vocabulary of the site-meeting report format

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Report number token: `CR`, optional sub-type tag, optional `N°`, two digits
    pub static ref REPORT_NUMBER_PATTERN: Regex =
        Regex::new(r"CR(?: ([A-Z]{1,3}))? (?:N° ?)?(\d\d)").unwrap();

    /// Leading `DD/MM/YY` token of a cell line, followed by a space or end of line
    pub static ref DATE_TOKEN_PATTERN: Regex =
        Regex::new(r"^(\d\d)/(\d\d)/(\d\d)(?: |$)").unwrap();
}

/// Byte length of a `DD/MM/YY` token
pub const DATE_TOKEN_LEN: usize = 8;

/// Recurring page banner and page counter printed on every report page
pub const DEFAULT_BOILERPLATE_PATTERN: &str =
    r"Communauté d’Agglomération des Portes du Hainaut.*\n Page \d* sur \d*";

/// Prefix of the per-lot tables
pub const DEFAULT_LOT_PREFIX: &str = "Lot";

/// Standard section titles that open a table of their own
pub const DEFAULT_SECTION_TITLES: &[&str] = &[
    "I – ORDRE DU JOUR DE LA PROCHAINE REUNION",
    "2 – OBSERVATIONS GENERALES",
    "3 – MAITRISE D'OUVRAGE",
    "4 – MAITRISE D'ŒUVRE",
    "OPC",
    "BET STRUCTURE",
    "BET FLUIDES",
    "BET VRD & PAYSAGES",
    "BET ACOUSTIQUE",
    "BUREAU DE CONTRÔLE",
    "SPS",
    "SSI",
    "6 – OBSERVATIONS PAR CORPS D'ÉTAT",
    "TOUS CORPS D’ETATS",
    "VI – ANNEXES",
];

/// Decides whether a line opens a new subject table
#[derive(Debug, Clone)]
pub struct SubjectHeaders {
    lot_prefix: String,
    section_prefixes: Vec<String>,
}

impl SubjectHeaders {
    pub fn new(lot_prefix: &str, section_titles: &[String]) -> Self {
        Self {
            lot_prefix: lot_prefix.to_string(),
            section_prefixes: section_titles.iter().map(|t| format!("{} ", t)).collect(),
        }
    }

    pub fn is_table_start(&self, line: &str) -> bool {
        if !self.lot_prefix.is_empty() && line.starts_with(&self.lot_prefix) {
            return true;
        }
        self.section_prefixes
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()))
    }
}

impl Default for SubjectHeaders {
    fn default() -> Self {
        let titles: Vec<String> = DEFAULT_SECTION_TITLES.iter().map(|t| t.to_string()).collect();
        Self::new(DEFAULT_LOT_PREFIX, &titles)
    }
}
