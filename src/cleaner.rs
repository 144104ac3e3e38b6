use crate::dates::parse_date;
use crate::loader::percentage;
use crate::schema::{
    Dataset, PaperRecord, ABSTRACT, DERIVED_COLUMNS, JOURNAL, PUBLICATION_YEAR, PUBLISH_TIME,
    SOURCE_X, TITLE,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, info, warn};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_JOURNAL: &str = "Unknown Journal";
pub const UNKNOWN_SOURCE: &str = "Unknown";

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedPaper {
    pub title: String,
    pub abstract_text: String,
    pub journal: String,
    pub publish_time: Option<NaiveDate>,
    pub source_x: Option<String>,
    pub publication_year: Option<i32>,
    pub publication_month: Option<u32>,
    pub abstract_word_count: usize,
    pub title_word_count: usize,
    pub has_abstract: bool,
    pub source_type: String,
    pub extra: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedTable {
    pub columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub rows: Vec<CleanedPaper>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub original_shape: (usize, usize),
    pub cleaned_shape: (usize, usize),
    pub rows_removed: usize,
    pub columns: Vec<String>,
    pub year_range: Option<(i32, i32)>,
    pub mode_year: Option<i32>,
    pub unparseable_dates: usize,
    /// Percentage of missing values per key column after cleaning.
    pub missing_percentages: Vec<(String, f64)>,
}

impl CleaningReport {
    pub fn print_summary(&self) {
        println!("\n=== DATA CLEANING REPORT ===");
        println!("Original dataset size: {:?}", self.original_shape);
        println!("Cleaned dataset size: {:?}", self.cleaned_shape);
        println!("Rows removed: {}", self.rows_removed);
        println!("Columns in cleaned data: {:?}", self.columns);
        match self.year_range {
            Some((min, max)) => println!("Date range: {} - {}", min, max),
            None => println!("Date range: n/a"),
        }
        if let Some(year) = self.mode_year {
            println!("Missing years filled with: {}", year);
        }
        println!("Unparseable publish_time values: {}", self.unparseable_dates);
        for (column, pct) in &self.missing_percentages {
            println!("Missing values in {}: {:.2}%", column, pct);
        }
    }
}

/// Clean a dataset, discarding the report.
pub fn clean(dataset: &Dataset) -> CleanedTable {
    clean_with_report(dataset).0
}

/// Parse dates, impute years, fill defaults, drop empty rows and derive features.
pub fn clean_with_report(dataset: &Dataset) -> (CleanedTable, CleaningReport) {
    info!("Starting data cleaning process...");
    if dataset.is_empty() {
        warn!("Cleaning an empty dataset");
    }

    info!("Processing date columns...");
    let dates: Vec<Option<NaiveDate>> = dataset
        .records
        .iter()
        .map(|record| {
            let raw = record.publish_time.as_deref()?;
            let parsed = parse_date(raw);
            if parsed.is_none() {
                debug!("Unparseable publish_time {:?}", raw);
            }
            parsed
        })
        .collect();

    let unparseable_dates = dataset
        .records
        .iter()
        .zip(&dates)
        .filter(|(record, date)| record.publish_time.is_some() && date.is_none())
        .count();

    // rows carrying a year from an earlier pass keep it
    let needs_mode = dataset
        .records
        .iter()
        .zip(&dates)
        .any(|(record, date)| date.is_none() && record.publication_year.is_none());
    let mode_year = if needs_mode {
        mode_year(dates.iter().flatten().map(|d| d.year()))
    } else {
        None
    };
    if let Some(year) = mode_year {
        debug!("Filling missing publication years with {}", year);
    }

    info!("Handling missing values...");
    let mut rows = Vec::with_capacity(dataset.len());
    for (record, date) in dataset.records.iter().zip(&dates) {
        if record.title.is_none() && record.abstract_text.is_none() {
            continue;
        }
        rows.push(fill_record(record, *date, mode_year));
    }
    let rows_removed = dataset.len() - rows.len();
    info!("Removed {} rows with both title and abstract missing", rows_removed);

    info!("Creating new features...");
    for row in &mut rows {
        derive_features(row);
    }

    let table = CleanedTable {
        columns: dataset.columns.clone(),
        extra_columns: dataset.extra_columns.clone(),
        rows,
    };

    let report = CleaningReport {
        original_shape: (dataset.len(), dataset.columns.len()),
        cleaned_shape: (table.len(), table.column_names().len()),
        rows_removed,
        columns: table.column_names(),
        year_range: table.year_bounds(),
        mode_year,
        unparseable_dates,
        missing_percentages: table.key_missing_percentages(),
    };

    info!("Cleaned dataset shape: {:?}", report.cleaned_shape);
    (table, report)
}

/// Most frequent year; the smallest year wins a tie.
pub fn mode_year(years: impl Iterator<Item = i32>) -> Option<i32> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for year in years {
        *counts.entry(year).or_insert(0) += 1;
    }

    let mut best: Option<(i32, usize)> = None;
    for (year, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((year, count));
        }
    }
    best.map(|(year, _)| year)
}

fn fill_record(record: &PaperRecord, date: Option<NaiveDate>, mode_year: Option<i32>) -> CleanedPaper {
    CleanedPaper {
        title: record.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        abstract_text: record.abstract_text.clone().unwrap_or_default(),
        journal: record.journal.clone().unwrap_or_else(|| UNKNOWN_JOURNAL.to_string()),
        publish_time: date,
        source_x: record.source_x.clone(),
        publication_year: date.map(|d| d.year()).or(record.publication_year).or(mode_year),
        publication_month: date.map(|d| d.month()),
        abstract_word_count: 0,
        title_word_count: 0,
        has_abstract: false,
        source_type: String::new(),
        extra: record.extra.clone(),
    }
}

fn derive_features(row: &mut CleanedPaper) {
    row.abstract_word_count = word_count(&row.abstract_text);
    row.title_word_count = word_count(&row.title);
    row.has_abstract = !row.abstract_text.trim().is_empty();
    row.source_type = row.source_x.clone().unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Input columns followed by the derived ones.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .cloned()
            .chain(DERIVED_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let mut years = self.rows.iter().filter_map(|r| r.publication_year);
        let first = years.next()?;
        Some(years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }

    pub fn key_missing_percentages(&self) -> Vec<(String, f64)> {
        let total = self.len();
        // title, abstract and journal are filled by construction
        vec![
            (TITLE.to_string(), 0.0),
            (ABSTRACT.to_string(), 0.0),
            (JOURNAL.to_string(), 0.0),
            (
                PUBLICATION_YEAR.to_string(),
                percentage(self.rows.iter().filter(|r| r.publication_year.is_none()).count(), total),
            ),
        ]
    }

    pub fn extra_value(&self, row: &CleanedPaper, column: &str) -> Option<String> {
        let idx = self.extra_columns.iter().position(|c| c == column)?;
        row.extra.get(idx).cloned().flatten()
    }

    /// Turn the cleaned rows back into input records so they can be cleaned again.
    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            extra_columns: self.extra_columns.clone(),
            records: self
                .rows
                .iter()
                .map(|row| PaperRecord {
                    title: Some(row.title.clone()),
                    abstract_text: Some(row.abstract_text.clone()),
                    journal: Some(row.journal.clone()),
                    publish_time: row.publish_time.map(|d| d.format(DATE_FORMAT).to_string()),
                    source_x: row.source_x.clone(),
                    publication_year: row.publication_year,
                    extra: row.extra.clone(),
                })
                .collect(),
        }
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> crate::error::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.column_names())?;

        for row in &self.rows {
            let mut record: Vec<String> = self
                .columns
                .iter()
                .map(|column| match column.as_str() {
                    TITLE => row.title.clone(),
                    ABSTRACT => row.abstract_text.clone(),
                    JOURNAL => row.journal.clone(),
                    PUBLISH_TIME => row
                        .publish_time
                        .map(|d| d.format(DATE_FORMAT).to_string())
                        .unwrap_or_default(),
                    SOURCE_X => row.source_x.clone().unwrap_or_default(),
                    other => self.extra_value(row, other).unwrap_or_default(),
                })
                .collect();

            record.push(row.publication_year.map(|y| y.to_string()).unwrap_or_default());
            record.push(row.publication_month.map(|m| m.to_string()).unwrap_or_default());
            record.push(row.abstract_word_count.to_string());
            record.push(row.title_word_count.to_string());
            record.push(row.has_abstract.to_string());
            record.push(row.source_type.clone());

            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::RawTable;

    fn dataset(csv: &str) -> Dataset {
        let raw = RawTable::from_reader(csv.as_bytes()).unwrap();
        Dataset::from_raw(&raw).unwrap()
    }

    const SAMPLE: &str = "\
cord_uid,title,abstract,journal,publish_time,source_x
a1,Covid Study,Some abstract text,Lancet,2020-03-01,PMC
a2,,,,2020-05-02,
a3,Only Title,,,not-a-date,Medline
a4,,  An abstract  ,BMJ,2021,
a5,Third,Words here,Lancet,2020-12-31,PMC
";

    #[test]
    fn test_title_and_abstract_never_absent() {
        let table = clean(&dataset(SAMPLE));
        for row in &table.rows {
            assert!(!row.title.is_empty());
            assert_eq!(row.has_abstract, !row.abstract_text.trim().is_empty());
        }
        assert_eq!(table.rows[2].title, UNKNOWN_TITLE);
        assert_eq!(table.rows[1].abstract_text, "");
        assert_eq!(table.rows[1].journal, UNKNOWN_JOURNAL);
    }

    #[test]
    fn test_rows_with_no_title_and_no_abstract_are_dropped() {
        let input = dataset(SAMPLE);
        let (table, report) = clean_with_report(&input);
        assert_eq!(report.rows_removed, 1);
        assert_eq!(table.len(), input.len() - report.rows_removed);
        assert!(table.extra_value(&table.rows[1], "cord_uid").as_deref() == Some("a3"));
    }

    #[test]
    fn test_word_counts() {
        let table = clean(&dataset(SAMPLE));
        assert_eq!(table.rows[0].abstract_word_count, 3);
        assert_eq!(table.rows[0].title_word_count, 2);
        assert_eq!(table.rows[1].abstract_word_count, 0);
        assert_eq!(table.rows[2].abstract_word_count, 2);
        assert!(table.rows[2].has_abstract);
        assert_eq!(table.rows[2].title_word_count, 2);
    }

    #[test]
    fn test_unparseable_date_gets_mode_year() {
        let (table, report) = clean_with_report(&dataset(SAMPLE));
        // the dropped row still counts toward the mode: 2020 x3, 2021 x1
        assert_eq!(report.mode_year, Some(2020));
        assert_eq!(report.unparseable_dates, 1);
        let row = &table.rows[1];
        assert_eq!(row.publish_time, None);
        assert_eq!(row.publication_year, Some(2020));
        assert_eq!(row.publication_month, None);
    }

    #[test]
    fn test_unparseable_date_without_any_year_stays_absent() {
        let input = dataset("title,abstract,journal,publish_time,source_x\nT,A,J,not-a-date,\n");
        let (table, report) = clean_with_report(&input);
        assert_eq!(report.mode_year, None);
        assert_eq!(table.rows[0].publication_year, None);
        assert_eq!(report.year_range, None);
        assert_eq!(report.missing_percentages[3], ("publication_year".to_string(), 100.0));
    }

    #[test]
    fn test_mode_year_tie_takes_smallest() {
        assert_eq!(mode_year([2021, 2020, 2021, 2020].into_iter()), Some(2020));
        assert_eq!(mode_year([2019, 2021, 2021].into_iter()), Some(2021));
        assert_eq!(mode_year(std::iter::empty()), None);
    }

    #[test]
    fn test_source_type_defaults() {
        let table = clean(&dataset(SAMPLE));
        assert_eq!(table.rows[0].source_type, "PMC");
        assert_eq!(table.rows[1].source_type, "Medline");
        assert_eq!(table.rows[2].source_type, UNKNOWN_SOURCE);
    }

    #[test]
    fn test_report_shapes() {
        let (_, report) = clean_with_report(&dataset(SAMPLE));
        assert_eq!(report.original_shape, (5, 6));
        assert_eq!(report.cleaned_shape, (4, 12));
        assert_eq!(report.year_range, Some((2020, 2021)));
        assert_eq!(report.columns.last().map(String::as_str), Some("source_type"));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean(&dataset(SAMPLE));
        let twice = clean(&once.to_dataset());
        assert_eq!(once, twice);
    }

    // the dropped rows decide the mode year on the first pass
    const MODE_FROM_DROPPED: &str = "\
title,abstract,journal,publish_time,source_x
A,text,J,2020-01-01,PMC
,,J,2021-01-01,PMC
,,J,2021-02-01,PMC
D,text,J,not-a-date,PMC
";

    #[test]
    fn test_clean_is_idempotent_when_dropped_rows_set_the_mode() {
        let once = clean(&dataset(MODE_FROM_DROPPED));
        assert_eq!(once.rows[1].publication_year, Some(2021));
        let twice = clean(&once.to_dataset());
        assert_eq!(once, twice);

        let mut buffer = Vec::new();
        once.write_csv(&mut buffer).unwrap();
        let reloaded = RawTable::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(once, clean(&Dataset::from_raw(&reloaded).unwrap()));
    }

    #[test]
    fn test_parsed_date_wins_over_carried_year() {
        let input = dataset(
            "title,abstract,journal,publish_time,source_x,publication_year\nT,A,J,2019-04-01,,2021\n",
        );
        let (table, report) = clean_with_report(&input);
        assert_eq!(table.rows[0].publication_year, Some(2019));
        assert_eq!(report.mode_year, None);
    }

    #[test]
    fn test_clean_is_idempotent_through_csv() {
        let once = clean(&dataset(SAMPLE));
        let mut buffer = Vec::new();
        once.write_csv(&mut buffer).unwrap();
        let reloaded = RawTable::from_reader(buffer.as_slice()).unwrap();
        let twice = clean(&Dataset::from_raw(&reloaded).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_dataset() {
        let (table, report) = clean_with_report(&dataset("title,abstract,journal,publish_time,source_x\n"));
        assert!(table.is_empty());
        assert_eq!(report.rows_removed, 0);
        assert_eq!(report.missing_percentages[3].1, 0.0);
    }
}
