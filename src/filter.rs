use crate::cleaner::{CleanedPaper, CleanedTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum AbstractFilter {
    #[default]
    All,
    With,
    Without,
}

/// Row selection for the explore view. An unset criterion matches every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Inclusive. Rows without a publication year never match a set range.
    pub year_range: Option<(i32, i32)>,
    pub journal: Option<String>,
    pub abstracts: AbstractFilter,
}

impl Filter {
    /// Year range for the explore view. Missing bounds default to the table's
    /// year bounds, so rows without a year are left out unless no row has one.
    pub fn year_range_for(table: &CleanedTable, from: Option<i32>, to: Option<i32>) -> Option<(i32, i32)> {
        match (from, to, table.year_bounds()) {
            (from, to, Some((min, max))) => Some((from.unwrap_or(min), to.unwrap_or(max))),
            (None, None, None) => None,
            (from, to, None) => Some((from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX))),
        }
    }

    pub fn matches(&self, row: &CleanedPaper) -> bool {
        if let Some((from, to)) = self.year_range {
            match row.publication_year {
                Some(year) if year >= from && year <= to => {}
                _ => return false,
            }
        }

        if let Some(ref journal) = self.journal {
            if &row.journal != journal {
                return false;
            }
        }

        match self.abstracts {
            AbstractFilter::All => true,
            AbstractFilter::With => row.has_abstract,
            AbstractFilter::Without => !row.has_abstract,
        }
    }

    /// A new table holding the matching rows in their original order.
    pub fn apply(&self, table: &CleanedTable) -> CleanedTable {
        CleanedTable {
            columns: table.columns.clone(),
            extra_columns: table.extra_columns.clone(),
            rows: table.rows.iter().filter(|row| self.matches(row)).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::clean;
    use crate::loader::RawTable;
    use crate::schema::Dataset;

    fn table() -> CleanedTable {
        let csv = "\
title,abstract,journal,publish_time,source_x
A,text,Lancet,2019-06-01,PMC
B,,BMJ,2020-01-01,PMC
C,more text,Lancet,2021-01-01,PMC
D,words,BMJ,2022-01-01,PMC
";
        let raw = RawTable::from_reader(csv.as_bytes()).unwrap();
        clean(&Dataset::from_raw(&raw).unwrap())
    }

    fn titles(t: &CleanedTable) -> Vec<&str> {
        t.rows.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let t = table();
        assert_eq!(Filter::default().apply(&t), t);
    }

    #[test]
    fn test_year_range_is_inclusive() {
        let filter = Filter { year_range: Some((2020, 2021)), ..Default::default() };
        assert_eq!(titles(&filter.apply(&table())), vec!["B", "C"]);
    }

    #[test]
    fn test_journal_and_abstract_filters_combine() {
        let filter = Filter {
            journal: Some("BMJ".to_string()),
            abstracts: AbstractFilter::With,
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(&table())), vec!["D"]);

        let without = Filter { abstracts: AbstractFilter::Without, ..Default::default() };
        assert_eq!(titles(&without.apply(&table())), vec!["B"]);
    }

    #[test]
    fn test_year_range_excludes_rows_without_year() {
        let csv = "title,abstract,journal,publish_time,source_x\nA,x,J,bad,\n";
        let raw = RawTable::from_reader(csv.as_bytes()).unwrap();
        let t = clean(&Dataset::from_raw(&raw).unwrap());
        let filter = Filter { year_range: Some((1900, 2100)), ..Default::default() };
        assert!(filter.apply(&t).is_empty());
        assert_eq!(Filter::default().apply(&t).len(), 1);
    }

    #[test]
    fn test_default_year_range_spans_table_and_drops_yearless_rows() {
        let csv = "title,abstract,journal,publish_time,source_x\nA,x,J,2019-01-01,\nB,x,J,2021-01-01,\n";
        let raw = RawTable::from_reader(csv.as_bytes()).unwrap();
        let mut t = clean(&Dataset::from_raw(&raw).unwrap());
        t.rows[1].publication_year = None;

        assert_eq!(Filter::year_range_for(&t, None, None), Some((2019, 2019)));
        assert_eq!(Filter::year_range_for(&table(), None, None), Some((2019, 2022)));
        assert_eq!(Filter::year_range_for(&table(), Some(2020), None), Some((2020, 2022)));

        let filter = Filter { year_range: Filter::year_range_for(&t, None, None), ..Default::default() };
        assert_eq!(titles(&filter.apply(&t)), vec!["A"]);
    }

    #[test]
    fn test_year_range_without_any_years() {
        let csv = "title,abstract,journal,publish_time,source_x\nA,x,J,bad,\n";
        let raw = RawTable::from_reader(csv.as_bytes()).unwrap();
        let t = clean(&Dataset::from_raw(&raw).unwrap());
        assert_eq!(Filter::year_range_for(&t, None, None), None);
        assert_eq!(Filter::year_range_for(&t, Some(2020), None), Some((2020, i32::MAX)));
    }
}
