use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading and validating a metadata table.
#[derive(Error, Debug)]
pub enum Error {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// The input table does not have the shape the cleaner needs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("missing required column `{0}`")]
    MissingColumn(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_path() {
        let err = Error::NotFound(PathBuf::from("metadata.csv"));
        assert_eq!(err.to_string(), "input file not found: metadata.csv");
    }

    #[test]
    fn test_schema_error_is_transparent() {
        let err: Error = SchemaError::MissingColumn("journal".to_string()).into();
        assert_eq!(err.to_string(), "missing required column `journal`");
    }
}
