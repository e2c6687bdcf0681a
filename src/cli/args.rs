//! Command-line argument definitions for the CSV loader
//!
//! This module defines the CLI interface using the clap derive API. The
//! pipeline itself only consumes the resolved [`Config`]; everything here is
//! surface.

use crate::app::models::{Column, ColumnType, FieldValue, TableSchema};
use crate::config::Config;
use crate::constants::{DEFAULT_ABORT_FAILURE_COUNT, DEFAULT_DELIMITER, DEFAULT_MAX_IN_FLIGHT};
use crate::{Error, Result};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the CSV loader
///
/// Streams a delimited text file into a table of the target store through
/// its insertion interface, with bounded concurrency and an
/// abort-after-N-failures policy.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "csvloader",
    version,
    about = "Bulk-load a CSV file into a database table",
    long_about = "Streams a delimited text file into a database table through the store's \
                  client-facing insertion interface. Rows are submitted concurrently with a \
                  bounded in-flight window; every row's outcome is accounted exactly once, and \
                  the run aborts early after a configured number of submission failures. A \
                  summary report with the acknowledged-tuple count is written for operators \
                  and automation."
)]
pub struct Args {
    /// Source CSV file to load
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILE",
        help = "Source CSV file to load"
    )]
    pub input: PathBuf,

    /// Directory the summary report is written into
    ///
    /// Created if it does not exist. The report file is named
    /// csvloader_report.log.
    #[arg(
        long = "report-dir",
        value_name = "DIR",
        default_value = ".",
        help = "Directory the summary report is written into"
    )]
    pub report_dir: PathBuf,

    /// Destination table name
    #[arg(
        short = 't',
        long = "table",
        value_name = "NAME",
        help = "Destination table name"
    )]
    pub table: String,

    /// Destination table columns, in insertion order
    ///
    /// Comma-separated declarations of the form name:type with optional
    /// colon-separated modifiers. Types: integer, float, text. Modifiers:
    /// notnull, key (uniqueness constraint), default=<value>.
    #[arg(
        short = 'c',
        long = "columns",
        value_name = "LIST",
        help = "Destination table columns",
        long_help = "Destination table columns as a comma-separated list of declarations.\n\
                     Each declaration is name:type with optional colon-separated modifiers.\n  \
                     Types:     integer, float, text\n  \
                     Modifiers: notnull            column rejects empty fields without a default\n             \
                     key                column carries a uniqueness constraint\n             \
                     default=<value>    value applied when an input field is empty\n\n\
                     Example: --columns \"id:integer:key,name:text,qty:integer:default=0\""
    )]
    pub columns: ColumnList,

    /// Insertion operation name; defaults to <TABLE>.insert
    #[arg(
        long = "procedure",
        value_name = "NAME",
        help = "Insertion operation name (default: <TABLE>.insert)"
    )]
    pub procedure: Option<String>,

    /// Number of submission failures that aborts the run
    #[arg(
        long = "abort-failure-count",
        value_name = "COUNT",
        default_value_t = DEFAULT_ABORT_FAILURE_COUNT,
        help = "Number of submission failures that aborts the run"
    )]
    pub abort_failure_count: u64,

    /// Drop fully blank input lines instead of submitting them
    #[arg(
        long = "skip-empty-records",
        help = "Drop fully blank input lines instead of submitting them"
    )]
    pub skip_empty_records: bool,

    /// Strip leading/trailing whitespace from every field
    #[arg(
        long = "trim-whitespace",
        help = "Strip leading/trailing whitespace from every field"
    )]
    pub trim_whitespace: bool,

    /// Maximum number of concurrently outstanding insertion requests
    #[arg(
        long = "max-in-flight",
        value_name = "COUNT",
        default_value_t = DEFAULT_MAX_IN_FLIGHT,
        help = "Maximum number of concurrently outstanding insertion requests"
    )]
    pub max_in_flight: usize,

    /// Field delimiter
    #[arg(
        long = "delimiter",
        value_name = "CHAR",
        default_value_t = DEFAULT_DELIMITER,
        help = "Field delimiter"
    )]
    pub delimiter: char,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output and non-warning logs
    #[arg(short = 'q', long = "quiet", help = "Suppress progress output")]
    pub quiet: bool,
}

impl Args {
    /// Validate argument combinations before building the configuration
    pub fn validate(&self) -> Result<()> {
        if self.columns.0.is_empty() {
            return Err(Error::configuration(
                "at least one column declaration is required",
            ));
        }
        Ok(())
    }

    /// Resolved pipeline configuration
    pub fn to_config(&self) -> Config {
        Config {
            input_path: self.input.clone(),
            report_dir: self.report_dir.clone(),
            table: self.table.clone(),
            procedure: self.procedure.clone(),
            abort_failure_count: self.abort_failure_count,
            skip_empty_records: self.skip_empty_records,
            trim_whitespace: self.trim_whitespace,
            max_in_flight: self.max_in_flight,
            delimiter: self.delimiter,
        }
    }

    /// Destination table schema for the bundled in-memory backend
    pub fn schema(&self) -> TableSchema {
        TableSchema::new(self.table.clone(), self.columns.0.clone())
    }

    /// Log level derived from verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Whether to render the progress spinner
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Parsed column declarations from --columns
#[derive(Debug, Clone)]
pub struct ColumnList(pub Vec<Column>);

impl FromStr for ColumnList {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut columns = Vec::new();
        for decl in s.split(',').filter(|d| !d.trim().is_empty()) {
            columns.push(parse_column(decl.trim())?);
        }
        Ok(ColumnList(columns))
    }
}

fn parse_column(decl: &str) -> std::result::Result<Column, String> {
    let mut parts = decl.split(':');

    let name = parts
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| format!("missing column name in '{}'", decl))?;
    let type_name = parts
        .next()
        .ok_or_else(|| format!("missing type for column '{}'", name))?;

    let column_type = match type_name.to_ascii_lowercase().as_str() {
        "integer" | "int" | "bigint" => ColumnType::Integer,
        "float" | "double" => ColumnType::Float,
        "text" | "string" | "varchar" => ColumnType::Text,
        other => return Err(format!("unknown column type '{}'", other)),
    };

    let mut column = Column {
        name: name.to_string(),
        column_type,
        default: None,
        nullable: true,
        unique: false,
    };

    for modifier in parts {
        if let Some(value) = modifier.strip_prefix("default=") {
            column.default = Some(parse_default(value, column_type, name)?);
        } else {
            match modifier {
                "notnull" => column.nullable = false,
                "key" => column.unique = true,
                other => {
                    return Err(format!(
                        "unknown modifier '{}' for column '{}'",
                        other, name
                    ));
                }
            }
        }
    }

    Ok(column)
}

fn parse_default(
    value: &str,
    column_type: ColumnType,
    name: &str,
) -> std::result::Result<FieldValue, String> {
    match column_type {
        ColumnType::Integer => value
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| format!("invalid integer default '{}' for column '{}'", value, name)),
        ColumnType::Float => value
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|_| format!("invalid float default '{}' for column '{}'", value, name)),
        ColumnType::Text => Ok(FieldValue::Text(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_column_declarations() {
        let list: ColumnList = "id:integer:key,name:text,qty:integer:default=0"
            .parse()
            .unwrap();

        assert_eq!(list.0.len(), 3);
        assert_eq!(list.0[0].name, "id");
        assert!(list.0[0].unique);
        assert_eq!(list.0[1].column_type, ColumnType::Text);
        assert!(list.0[1].nullable);
        assert_eq!(list.0[2].default, Some(FieldValue::Integer(0)));
    }

    #[test]
    fn notnull_modifier_rejects_empty_fields() {
        let list: ColumnList = "val:float:notnull".parse().unwrap();
        assert!(!list.0[0].nullable);
        assert!(list.0[0].default.is_none());
    }

    #[test]
    fn rejects_unknown_type_and_modifier() {
        assert!("id:uuid".parse::<ColumnList>().is_err());
        assert!("id:integer:primary".parse::<ColumnList>().is_err());
        assert!("id:integer:default=abc".parse::<ColumnList>().is_err());
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::parse_from([
            "csvloader",
            "--input",
            "test.csv",
            "--table",
            "blah",
            "--columns",
            "id:integer",
        ]);

        assert_eq!(args.abort_failure_count, DEFAULT_ABORT_FAILURE_COUNT);
        assert_eq!(args.max_in_flight, DEFAULT_MAX_IN_FLIGHT);
        assert!(!args.skip_empty_records);
        assert_eq!(args.get_log_level(), "info");
        assert!(args.validate().is_ok());

        let config = args.to_config();
        assert_eq!(config.table, "blah");
        assert_eq!(config.procedure_name(), "blah.insert");
    }
}
