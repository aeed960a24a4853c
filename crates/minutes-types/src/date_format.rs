//! `DD-MM-YYYY` date codec shared by every persisted and serialized form
//!
//! The serde helpers are meant for `#[serde(with = "...")]` attributes on the
//! model types so JSON and CSV outputs agree on a single date representation.

use chrono::NaiveDate;

/// Persisted date layout
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Format a date as `DD-MM-YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `DD-MM-YYYY` date
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}

/// Serde helper for `Option<NaiveDate>`
pub mod optional {
    use super::{format_date, parse_date};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_some(&format_date(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse_date(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Serde helper for `Vec<NaiveDate>`
pub mod list {
    use super::{format_date, parse_date};
    use chrono::NaiveDate;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dates: &[NaiveDate], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(dates.len()))?;
        for date in dates {
            seq.serialize_element(&format_date(*date))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<String> = Vec::deserialize(deserializer)?;
        raw.iter()
            .map(|s| parse_date(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
