use crate::error::SchemaError;
use crate::loader::RawTable;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const TITLE: &str = "title";
pub const ABSTRACT: &str = "abstract";
pub const JOURNAL: &str = "journal";
pub const PUBLISH_TIME: &str = "publish_time";
pub const SOURCE_X: &str = "source_x";
pub const PUBLICATION_YEAR: &str = "publication_year";

/// Columns every metadata table must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = [TITLE, ABSTRACT, JOURNAL, PUBLISH_TIME, SOURCE_X];

/// Columns computed by the cleaner. Input columns with these names are overwritten.
pub const DERIVED_COLUMNS: [&str; 6] = [
    PUBLICATION_YEAR,
    "publication_month",
    "abstract_word_count",
    "title_word_count",
    "has_abstract",
    "source_type",
];

/// One row of the input, with the known fields typed and everything else kept aside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    pub publish_time: Option<String>,
    pub source_x: Option<String>,
    /// Year carried over from an earlier cleaning pass. Used only when
    /// `publish_time` does not parse.
    pub publication_year: Option<i32>,
    /// Values for `Dataset::extra_columns`, in the same order.
    pub extra: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Input column order, used when the cleaned table is written back out.
    pub columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub records: Vec<PaperRecord>,
}

impl Dataset {
    /// Validate the required columns and split each row into typed fields.
    pub fn from_raw(raw: &RawTable) -> Result<Self, SchemaError> {
        let mut required = [0usize; 5];
        for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = raw
                .column_index(name)
                .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;
        }
        let [title, abstract_text, journal, publish_time, source_x] = required;
        let publication_year = raw.column_index(PUBLICATION_YEAR);

        let extra_indices: Vec<usize> = raw
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                !REQUIRED_COLUMNS.contains(&name.as_str()) && !DERIVED_COLUMNS.contains(&name.as_str())
            })
            .map(|(idx, _)| idx)
            .collect();

        let cell = |row: &[Option<String>], idx: usize| row.get(idx).cloned().flatten();

        let records = raw
            .rows
            .iter()
            .map(|row| PaperRecord {
                title: cell(row, title),
                abstract_text: cell(row, abstract_text),
                journal: cell(row, journal),
                publish_time: cell(row, publish_time),
                source_x: cell(row, source_x),
                publication_year: publication_year
                    .and_then(|idx| cell(row, idx))
                    .and_then(|year| year.trim().parse().ok()),
                extra: extra_indices.iter().map(|&idx| cell(row, idx)).collect(),
            })
            .collect();

        Ok(Self {
            columns: raw
                .columns
                .iter()
                .filter(|name| !DERIVED_COLUMNS.contains(&name.as_str()))
                .cloned()
                .collect(),
            extra_columns: extra_indices.iter().map(|&idx| raw.columns[idx].clone()).collect(),
            records,
        })
    }

    /// Read and validate a CSV file in one step.
    pub fn from_path(path: &Path) -> crate::error::Result<Self> {
        let raw = RawTable::from_path(path)?;
        Ok(Self::from_raw(&raw)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
