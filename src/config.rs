//! Configuration management and validation.
//!
//! Provides the resolved configuration consumed by the ingestion pipeline.
//! Flag parsing lives in the CLI layer; this module only validates the
//! resolved values.

use crate::constants::{DEFAULT_ABORT_FAILURE_COUNT, DEFAULT_DELIMITER, DEFAULT_MAX_IN_FLIGHT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolved configuration for one loading run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source file to read
    pub input_path: PathBuf,

    /// Directory the summary report is written into; created if missing
    pub report_dir: PathBuf,

    /// Destination table name
    pub table: String,

    /// Insertion operation name; defaults to `<TABLE>.insert` when unset
    pub procedure: Option<String>,

    /// Number of submission failures that triggers an early abort
    pub abort_failure_count: u64,

    /// Drop fully blank input lines instead of submitting them
    pub skip_empty_records: bool,

    /// Strip leading/trailing whitespace from fields before normalization
    pub trim_whitespace: bool,

    /// Maximum number of concurrently outstanding insertion requests
    pub max_in_flight: usize,

    /// Field delimiter
    pub delimiter: char,
}

impl Config {
    /// The insertion operation invoked for each row.
    ///
    /// A configured procedure name is a plain override; no special-casing
    /// beyond selecting which operation is invoked.
    pub fn procedure_name(&self) -> String {
        self.procedure
            .clone()
            .unwrap_or_else(|| format!("{}.insert", self.table))
    }

    /// Validate resolved values before the run starts
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(Error::configuration("target table name must not be empty"));
        }

        if self.abort_failure_count == 0 {
            return Err(Error::configuration(
                "abort-failure-count must be at least 1",
            ));
        }

        if self.max_in_flight == 0 {
            return Err(Error::configuration("max-in-flight must be at least 1"));
        }

        if !self.delimiter.is_ascii() {
            return Err(Error::configuration(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )));
        }

        if self.delimiter == crate::constants::QUOTE_CHAR {
            return Err(Error::configuration(
                "delimiter must differ from the quote character",
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            report_dir: PathBuf::from("."),
            table: String::new(),
            procedure: None,
            abort_failure_count: DEFAULT_ABORT_FAILURE_COUNT,
            skip_empty_records: false,
            trim_whitespace: false,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            input_path: PathBuf::from("input.csv"),
            table: "blah".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn default_procedure_is_table_insert() {
        let config = valid_config();
        assert_eq!(config.procedure_name(), "blah.insert");
    }

    #[test]
    fn configured_procedure_overrides_default() {
        let config = Config {
            procedure: Some("BLAH.customInsert".to_string()),
            ..valid_config()
        };
        assert_eq!(config.procedure_name(), "BLAH.customInsert");
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_table() {
        let config = Config {
            table: "  ".to_string(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_abort_count() {
        let config = Config {
            abort_failure_count: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_window() {
        let config = Config {
            max_in_flight: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_quote_delimiter() {
        let config = Config {
            delimiter: '"',
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }
}
