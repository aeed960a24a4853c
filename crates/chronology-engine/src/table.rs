//! Flat CSV persistence of compressed actions
//!
//! One row per action. The list columns (`dates`, `report_numbers`, `pages`)
//! hold JSON arrays, dates written as `DD-MM-YYYY` strings. Loading always
//! normalizes the lists back to sorted, deduplicated sets.

use minutes_types::{format_date, parse_date, CompressedAction};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{ChronologyError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct ActionRow {
    subject_title: String,
    text: String,
    dates: String,
    report_numbers: String,
    pages: String,
    order_in_table: usize,
}

impl ActionRow {
    fn encode(action: &CompressedAction) -> Result<Self> {
        let dates: Vec<String> = action.dates.iter().map(|d| format_date(*d)).collect();
        Ok(Self {
            subject_title: action.subject_title.clone(),
            text: action.text.clone(),
            dates: encode_list(&dates)?,
            report_numbers: encode_list(&action.report_numbers)?,
            pages: encode_list(&action.pages)?,
            order_in_table: action.order_in_table,
        })
    }

    fn decode(self) -> Result<CompressedAction> {
        let dates = decode_list::<String>("dates", &self.dates)?
            .iter()
            .map(|s| {
                parse_date(s)
                    .map_err(|e| ChronologyError::Table(format!("bad date '{}': {}", s, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut action = CompressedAction {
            subject_title: self.subject_title,
            text: self.text,
            dates,
            report_numbers: decode_list("report_numbers", &self.report_numbers)?,
            pages: decode_list("pages", &self.pages)?,
            order_in_table: self.order_in_table,
        };
        action.normalize();
        Ok(action)
    }
}

fn encode_list<T: Serialize>(values: &[T]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| ChronologyError::Table(e.to_string()))
}

fn decode_list<T: for<'de> Deserialize<'de>>(column: &str, raw: &str) -> Result<Vec<T>> {
    serde_json::from_str(raw)
        .map_err(|e| ChronologyError::Table(format!("column {}: {}", column, e)))
}

pub struct ActionTable;

impl ActionTable {
    pub fn write<W: Write>(actions: &[CompressedAction], writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for action in actions {
            csv_writer.serialize(ActionRow::encode(action)?)?;
        }
        csv_writer
            .flush()
            .map_err(|e| ChronologyError::Table(e.to_string()))
    }

    pub fn read<R: Read>(reader: R) -> Result<Vec<CompressedAction>> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        csv_reader
            .deserialize::<ActionRow>()
            .map(|row| row?.decode())
            .collect()
    }

    pub fn to_bytes(actions: &[CompressedAction]) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        Self::write(actions, &mut buffer)?;
        Ok(buffer)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Vec<CompressedAction>> {
        Self::read(bytes)
    }

    pub fn save<P: AsRef<Path>>(path: P, actions: &[CompressedAction]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            ChronologyError::Table(format!("cannot create {}: {}", path.display(), e))
        })?;
        Self::write(actions, file)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<CompressedAction>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ChronologyError::Table(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::read(file)
    }
}
