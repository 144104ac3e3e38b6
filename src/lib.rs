pub mod config;
pub mod error;
pub mod loader;
pub mod schema;
pub mod dates;
pub mod cleaner;
pub mod stats;
pub mod analyzer;
pub mod filter;
pub mod reporter;

pub use config::Config;
pub use error::{Error, SchemaError};
pub use loader::RawTable;
pub use schema::{Dataset, PaperRecord};
pub use cleaner::{clean, clean_with_report, CleanedPaper, CleanedTable, CleaningReport};
pub use analyzer::Column;
pub use filter::{AbstractFilter, Filter};
pub use reporter::{AnalysisReport, Reporter};

pub type Result<T> = anyhow::Result<T>;
