use crate::cleaner::{CleanedPaper, CleanedTable, DATE_FORMAT};
use crate::stats::{self, ColumnSummary, HistogramBin};
use chrono::Datelike;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::warn;

/// Number of entries `word_frequency` returns.
pub const WORD_FREQUENCY_LIMIT: usize = 20;

pub const OTHERS_LABEL: &str = "Others";

const HISTOGRAM_BINS: usize = 50;

/// Stopwords dropped from title word counts in the analysis report.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "and", "of", "in", "to", "a", "for", "with", "on", "by", "from", "as", "an", "at",
    "that", "this", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "can",
];

/// A column of the cleaned table, addressed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Title,
    Abstract,
    Journal,
    PublishTime,
    SourceX,
    PublicationYear,
    PublicationMonth,
    AbstractWordCount,
    TitleWordCount,
    HasAbstract,
    SourceType,
    Extra(String),
}

impl FromStr for Column {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "title" => Column::Title,
            "abstract" => Column::Abstract,
            "journal" => Column::Journal,
            "publish_time" => Column::PublishTime,
            "source_x" => Column::SourceX,
            "publication_year" => Column::PublicationYear,
            "publication_month" => Column::PublicationMonth,
            "abstract_word_count" => Column::AbstractWordCount,
            "title_word_count" => Column::TitleWordCount,
            "has_abstract" => Column::HasAbstract,
            "source_type" => Column::SourceType,
            other => Column::Extra(other.to_string()),
        })
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Column::Title => "title",
            Column::Abstract => "abstract",
            Column::Journal => "journal",
            Column::PublishTime => "publish_time",
            Column::SourceX => "source_x",
            Column::PublicationYear => "publication_year",
            Column::PublicationMonth => "publication_month",
            Column::AbstractWordCount => "abstract_word_count",
            Column::TitleWordCount => "title_word_count",
            Column::HasAbstract => "has_abstract",
            Column::SourceType => "source_type",
            Column::Extra(name) => name,
        };
        f.write_str(name)
    }
}

impl CleanedTable {
    /// The value of `column` in `row` rendered as text; `None` when absent.
    pub fn value<'a>(&'a self, row: &'a CleanedPaper, column: &Column) -> Option<Cow<'a, str>> {
        match column {
            Column::Title => Some(Cow::Borrowed(row.title.as_str())),
            Column::Abstract => Some(Cow::Borrowed(row.abstract_text.as_str())),
            Column::Journal => Some(Cow::Borrowed(row.journal.as_str())),
            Column::PublishTime => row.publish_time.map(|d| Cow::Owned(d.format(DATE_FORMAT).to_string())),
            Column::SourceX => row.source_x.as_deref().map(Cow::Borrowed),
            Column::PublicationYear => row.publication_year.map(|y| Cow::Owned(y.to_string())),
            Column::PublicationMonth => row.publication_month.map(|m| Cow::Owned(m.to_string())),
            Column::AbstractWordCount => Some(Cow::Owned(row.abstract_word_count.to_string())),
            Column::TitleWordCount => Some(Cow::Owned(row.title_word_count.to_string())),
            Column::HasAbstract => Some(Cow::Owned(row.has_abstract.to_string())),
            Column::SourceType => Some(Cow::Borrowed(row.source_type.as_str())),
            Column::Extra(name) => {
                let idx = self.extra_columns.iter().position(|c| c == name)?;
                row.extra.get(idx)?.as_deref().map(Cow::Borrowed)
            }
        }
    }
}

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractSummary {
    pub total: usize,
    pub with_abstract: usize,
    /// Percentage of papers that have an abstract.
    pub abstract_rate: f64,
    /// Mean word count over papers whose abstract has at least one word.
    pub mean_abstract_words: Option<f64>,
    pub word_count_histogram: Vec<HistogramBin>,
}

fn warn_if_empty(table: &CleanedTable, operation: &str) {
    if table.is_empty() {
        warn!("EmptyInputWarning: {} over an empty table", operation);
    }
}

/// Papers per publication year, for years at or after `min_year`.
pub fn yearly_counts(table: &CleanedTable, min_year: i32) -> BTreeMap<i32, usize> {
    warn_if_empty(table, "yearly_counts");
    let mut counts = BTreeMap::new();
    for year in table.rows.iter().filter_map(|r| r.publication_year) {
        if year >= min_year {
            *counts.entry(year).or_insert(0) += 1;
        }
    }
    counts
}

/// Papers per month of `publish_time`, with empty months between the first
/// and last observed month reported as zero.
pub fn monthly_counts(table: &CleanedTable) -> Vec<(YearMonth, usize)> {
    warn_if_empty(table, "monthly_counts");
    let mut counts: BTreeMap<YearMonth, usize> = BTreeMap::new();
    for date in table.rows.iter().filter_map(|r| r.publish_time) {
        let key = YearMonth { year: date.year(), month: date.month() };
        *counts.entry(key).or_insert(0) += 1;
    }

    let (first, last) = match (counts.keys().next(), counts.keys().next_back()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Vec::new(),
    };

    let mut result = Vec::new();
    let mut current = first;
    while current <= last {
        result.push((current, counts.get(&current).copied().unwrap_or(0)));
        current = current.next();
    }
    result
}

/// Count items keeping first-seen order, then sort by count descending.
/// The sort is stable so equal counts stay in first-seen order.
fn count_stable<I, S>(items: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for item in items {
        let item = item.as_ref();
        match index.get(item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item.to_string(), counts.len());
                counts.push((item.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// The `n` most frequent non-missing values of `column`.
pub fn top_n(table: &CleanedTable, column: &Column, n: usize) -> Vec<(String, usize)> {
    warn_if_empty(table, "top_n");
    let mut counts = count_stable(table.rows.iter().filter_map(|row| table.value(row, column)));
    counts.truncate(n);
    counts
}

/// `top_n` plus an `Others` bucket holding the remaining rows, if any.
pub fn top_n_with_other(table: &CleanedTable, column: &Column, n: usize) -> Vec<(String, usize)> {
    warn_if_empty(table, "top_n_with_other");
    let mut counts = count_stable(table.rows.iter().filter_map(|row| table.value(row, column)));
    let rest: usize = counts.iter().skip(n).map(|(_, c)| c).sum();
    counts.truncate(n);
    if rest > 0 {
        counts.push((OTHERS_LABEL.to_string(), rest));
    }
    counts
}

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\p{Alphabetic}+").expect("static word pattern"))
}

/// Top `WORD_FREQUENCY_LIMIT` words of `text_column`.
pub fn word_frequency(
    table: &CleanedTable,
    text_column: &Column,
    stopwords: &HashSet<String>,
    min_len: usize,
) -> Vec<(String, usize)> {
    word_frequency_with_limit(table, text_column, stopwords, min_len, WORD_FREQUENCY_LIMIT)
}

pub fn word_frequency_with_limit(
    table: &CleanedTable,
    text_column: &Column,
    stopwords: &HashSet<String>,
    min_len: usize,
    limit: usize,
) -> Vec<(String, usize)> {
    warn_if_empty(table, "word_frequency");
    let text = table
        .rows
        .iter()
        .filter_map(|row| table.value(row, text_column))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let words = word_regex()
        .find_iter(&text)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() >= min_len && !stopwords.contains(*w));

    let mut counts = count_stable(words);
    counts.truncate(limit);
    counts
}

/// Numeric summaries of the derived columns and of numeric extra columns.
pub fn descriptive_stats(table: &CleanedTable) -> Vec<ColumnSummary> {
    warn_if_empty(table, "descriptive_stats");
    let rows = &table.rows;

    let mut columns: Vec<(String, Vec<f64>)> = vec![
        (
            "publication_year".to_string(),
            rows.iter().filter_map(|r| r.publication_year).map(f64::from).collect(),
        ),
        (
            "publication_month".to_string(),
            rows.iter().filter_map(|r| r.publication_month).map(f64::from).collect(),
        ),
        (
            "abstract_word_count".to_string(),
            rows.iter().map(|r| r.abstract_word_count as f64).collect(),
        ),
        (
            "title_word_count".to_string(),
            rows.iter().map(|r| r.title_word_count as f64).collect(),
        ),
    ];

    for (idx, name) in table.extra_columns.iter().enumerate() {
        let mut values = Vec::new();
        let mut numeric = true;
        for cell in rows.iter().filter_map(|r| r.extra.get(idx).and_then(|c| c.as_deref())) {
            match cell.trim().parse::<f64>() {
                Ok(v) => values.push(v),
                Err(_) => {
                    numeric = false;
                    break;
                }
            }
        }
        if numeric {
            columns.push((name.clone(), values));
        }
    }

    columns
        .iter()
        .filter_map(|(name, values)| stats::describe(name, values))
        .collect()
}

pub fn abstract_summary(table: &CleanedTable) -> AbstractSummary {
    warn_if_empty(table, "abstract_summary");
    let total = table.len();
    let with_abstract = table.rows.iter().filter(|r| r.has_abstract).count();
    let lengths: Vec<f64> = table
        .rows
        .iter()
        .filter(|r| r.abstract_word_count > 0)
        .map(|r| r.abstract_word_count as f64)
        .collect();

    let mean_abstract_words = if lengths.is_empty() {
        None
    } else {
        Some(lengths.iter().sum::<f64>() / lengths.len() as f64)
    };

    AbstractSummary {
        total,
        with_abstract,
        abstract_rate: crate::loader::percentage(with_abstract, total),
        mean_abstract_words,
        word_count_histogram: stats::histogram(&lengths, HISTOGRAM_BINS),
    }
}

pub fn stopword_set<S: AsRef<str>>(words: &[S]) -> HashSet<String> {
    words.iter().map(|w| w.as_ref().to_lowercase()).collect()
}
