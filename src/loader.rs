use crate::error::{Error, Result};
use crate::stats::{self, ColumnSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info};

/// Type inferred for a raw column from its non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    /// Every value is missing.
    Empty,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Text => "text",
            ColumnType::Empty => "empty",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValue {
    pub column: String,
    pub count: usize,
    pub percentage: f64,
}

/// A CSV file as read from disk: header names plus rows of optional cells.
/// An empty field is stored as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;

        info!("Loading dataset from {}", path.display());
        let table = Self::from_reader(file)?;
        info!("Loaded {} rows x {} columns", table.rows.len(), table.columns.len());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.len() != width {
                debug!(
                    "Row {} has {} fields, expected {}",
                    rows.len() + 1,
                    record.len(),
                    width
                );
            }
            let row = (0..width)
                .map(|i| match record.get(i) {
                    Some(cell) if !cell.is_empty() => Some(cell.to_string()),
                    _ => None,
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows.iter().map(move |row| row.get(idx).and_then(|c| c.as_deref()))
    }

    pub fn dtypes(&self) -> Vec<(String, ColumnType)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), infer_type(self.column_values(idx).flatten())))
            .collect()
    }

    pub fn head(&self, n: usize) -> &[Vec<Option<String>>] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn missing_values(&self) -> Vec<MissingValue> {
        let total = self.rows.len();
        let mut report: Vec<MissingValue> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let count = self.column_values(idx).filter(|v| v.is_none()).count();
                MissingValue {
                    column: name.clone(),
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();

        // stable: equal counts keep column order
        report.sort_by(|a, b| b.count.cmp(&a.count));
        report
    }

    /// Descriptive statistics for every integer or float column.
    pub fn describe(&self) -> Vec<ColumnSummary> {
        self.dtypes()
            .into_iter()
            .enumerate()
            .filter(|(_, (_, kind))| kind.is_numeric())
            .filter_map(|(idx, (name, _))| {
                let values: Vec<f64> = self
                    .column_values(idx)
                    .flatten()
                    .filter_map(|v| v.trim().parse::<f64>().ok())
                    .collect();
                stats::describe(&name, &values)
            })
            .collect()
    }

    pub fn print_summary(&self, head_rows: usize, missing_rows: usize) {
        let (rows, cols) = self.shape();
        println!("\n=== DATASET BASIC INFORMATION ===");
        println!("Dataset shape: ({}, {})", rows, cols);
        println!("Number of rows: {}", rows);
        println!("Number of columns: {}", cols);

        println!("\n=== COLUMN DATA TYPES ===");
        for (name, kind) in self.dtypes() {
            println!("  {:<30} {}", name, kind);
        }

        println!("\n=== FIRST FEW ROWS ===");
        for (i, row) in self.head(head_rows).iter().enumerate() {
            println!("  [{}]", i);
            for (name, cell) in self.columns.iter().zip(row) {
                let shown = match cell {
                    Some(value) => truncate_chars(value, 60),
                    None => "<missing>",
                };
                println!("    {}: {}", name, shown);
            }
        }

        println!("\n=== MISSING VALUES ANALYSIS ===");
        println!("  {:<30} {:>13} {:>18}", "Column", "Missing Count", "Missing Percentage");
        for missing in self.missing_values().iter().take(missing_rows) {
            println!(
                "  {:<30} {:>13} {:>17.2}%",
                missing.column, missing.count, missing.percentage
            );
        }

        println!("\n=== BASIC STATISTICS ===");
        let summaries = self.describe();
        print_column_summaries(&summaries);
        println!(
            "\nNumerical columns: {:?}",
            summaries.iter().map(|s| s.column.as_str()).collect::<Vec<_>>()
        );
    }
}

pub fn print_column_summaries(summaries: &[ColumnSummary]) {
    if summaries.is_empty() {
        println!("  (no numeric columns)");
        return;
    }
    println!(
        "  {:<22} {:>8} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in summaries {
        let std = s.std.map_or_else(|| "NaN".to_string(), |v| format!("{:.3}", v));
        println!(
            "  {:<22} {:>8} {:>12.3} {:>12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            s.column, s.count, s.mean, std, s.min, s.q25, s.median, s.q75, s.max
        );
    }
}

pub(crate) fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Cut `s` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn infer_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut seen = false;
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;

    for value in values {
        seen = true;
        let v = value.trim();
        if all_int && v.parse::<i64>().is_err() {
            all_int = false;
        }
        if all_float && v.parse::<f64>().is_err() {
            all_float = false;
        }
        if all_bool && !matches!(v, "True" | "False" | "true" | "false") {
            all_bool = false;
        }
        if !all_int && !all_float && !all_bool {
            return ColumnType::Text;
        }
    }

    if !seen {
        ColumnType::Empty
    } else if all_int {
        ColumnType::Integer
    } else if all_float {
        ColumnType::Float
    } else if all_bool {
        ColumnType::Boolean
    } else {
        ColumnType::Text
    }
}
