use crate::analyzer::DEFAULT_STOPWORDS;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, path::{Path, PathBuf}};
use tracing::info;

/// Environment variable that overrides `input_path`.
pub const INPUT_ENV: &str = "PAPERSCOPE_INPUT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_path: PathBuf,
    pub head_rows: usize,
    pub missing_report_rows: usize,
    pub min_year: i32,
    pub top_journals: usize,
    pub top_sources: usize,
    pub word_min_len: usize,
    pub title_stopwords: Vec<String>,
    pub explore: ExploreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    pub top_n: usize,
    pub sample_rows: usize,
    pub stopwords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("metadata.csv"),
            head_rows: 5,
            missing_report_rows: 15,
            min_year: 2019,
            top_journals: 10,
            top_sources: 15,
            word_min_len: 3,
            title_stopwords: DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            explore: ExploreConfig::default(),
        }
    }
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            top_n: 15,
            sample_rows: 10,
            stopwords: ["the", "and", "of", "in", "to", "a", "for", "with", "on", "by"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Get the default config file path (~/.paperscope.toml)
    pub fn default_config_path() -> crate::Result<PathBuf> {
        let home_dir = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(PathBuf::from(home_dir).join(".paperscope.toml"))
    }

    /// Load config from the default location, falling back to defaults if the file doesn't exist
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::default_config_path()?;

        let config = if config_path.exists() {
            info!("Loading configuration from: {}", config_path.display());
            Self::from_file(&config_path)?
        } else {
            info!("No config file found at {}, using defaults", config_path.display());
            Self::default()
        };

        Ok(config.with_env_overrides())
    }

    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the documented default config to `path`, creating parent directories.
    pub fn write_documented(path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        std::fs::write(path, Self::create_documented_config())
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(input) = env::var(INPUT_ENV) {
            if !input.is_empty() {
                self.input_path = PathBuf::from(input);
            }
        }
        self
    }

    /// Create a config file with all available options documented
    pub fn create_documented_config() -> String {
        let defaults = Self::default();
        let quote = |words: &[String]| {
            words.iter().map(|w| format!("\"{}\"", w)).collect::<Vec<_>>().join(", ")
        };

        format!(r#"# paperscope configuration file
# Controls how the metadata table is loaded, cleaned and summarized.

# CSV file to analyze (overridden by --input or the {env} environment variable)
input_path = "metadata.csv"

# Number of rows shown in the "first few rows" preview
head_rows = {head_rows}

# Number of columns listed in the missing-value report
missing_report_rows = {missing_rows}

# Earliest publication year included in the yearly counts
min_year = {min_year}

# How many journals and sources to list in the analysis report
top_journals = {top_journals}
top_sources = {top_sources}

# Minimum token length for title word frequencies
word_min_len = {word_min_len}

# Words ignored when counting title words
title_stopwords = [{title_stopwords}]

[explore]
# Entries shown in each ranking of the explore view
top_n = {top_n}

# Rows shown in the sample table
sample_rows = {sample_rows}

# Words ignored when counting title words in the explore view
stopwords = [{explore_stopwords}]
"#,
            env = INPUT_ENV,
            head_rows = defaults.head_rows,
            missing_rows = defaults.missing_report_rows,
            min_year = defaults.min_year,
            top_journals = defaults.top_journals,
            top_sources = defaults.top_sources,
            word_min_len = defaults.word_min_len,
            title_stopwords = quote(&defaults.title_stopwords),
            top_n = defaults.explore.top_n,
            sample_rows = defaults.explore.sample_rows,
            explore_stopwords = quote(&defaults.explore.stopwords),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_config_parses_to_defaults() {
        let parsed: Config = toml::from_str(&Config::create_documented_config()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str("min_year = 2020\n[explore]\ntop_n = 5\n").unwrap();
        assert_eq!(parsed.min_year, 2020);
        assert_eq!(parsed.explore.top_n, 5);
        assert_eq!(parsed.top_journals, 10);
        assert_eq!(parsed.explore.sample_rows, 10);
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("paperscope.toml");
        Config::write_documented(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("# paperscope configuration file"));
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
