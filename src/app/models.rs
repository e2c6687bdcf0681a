//! Data models for CSV loading
//!
//! This module contains the core data structures moving through the ingestion
//! pipeline: raw parsed lines, typed field values, normalized rows, per-row
//! rejections and submission outcomes, and the final run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// =============================================================================
// Field Values and Table Schema
// =============================================================================

/// A typed value ready for submission as one column of an insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// 64-bit signed integer column value
    Integer(i64),

    /// 64-bit floating point column value
    Float(f64),

    /// Text column value
    Text(String),

    /// SQL NULL, only valid for nullable columns
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
            FieldValue::Null => write!(f, "NULL"),
        }
    }
}

/// Column data types understood by the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// Declaration of one destination table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as known to the store
    pub name: String,

    /// Declared data type
    pub column_type: ColumnType,

    /// Declared default value, applied when an input field is empty
    pub default: Option<FieldValue>,

    /// Whether the column accepts NULL
    pub nullable: bool,

    /// Whether the store enforces a uniqueness constraint on this column
    pub unique: bool,
}

impl Column {
    /// A NOT NULL column with a declared default
    pub fn with_default(name: impl Into<String>, column_type: ColumnType, default: FieldValue) -> Self {
        Self {
            name: name.into(),
            column_type,
            default: Some(default),
            nullable: false,
            unique: false,
        }
    }

    /// A NOT NULL column without a default; empty input fields are rejected
    pub fn required(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            default: None,
            nullable: false,
            unique: false,
        }
    }

    /// A nullable column without a default; empty input fields become NULL
    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            default: None,
            nullable: true,
            unique: false,
        }
    }

    /// Mark this column as carrying a uniqueness constraint
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Ordered column declarations of the destination table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Destination table name
    pub table: String,

    /// Columns in insertion order
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Number of columns, which every submitted row must match
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

// =============================================================================
// Pipeline Records
// =============================================================================

/// One logical record as split from the input file, before normalization.
///
/// The line number is the 1-based physical line on which the record starts;
/// quoted records spanning multiple physical lines keep their first line's
/// number. Line numbers strictly increase across produced records.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub line_number: u64,
    pub fields: Vec<String>,
}

/// A row that passed normalization and is ready for submission
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Originating physical line, retained for error reporting
    pub line_number: u64,
    pub values: Vec<FieldValue>,
}

/// Reason a row was rejected before submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Unterminated quote at end of stream swallowed the rest of the record
    MalformedQuoting,

    /// Record field count differs from the target column count
    FieldCountMismatch { expected: usize, found: usize },

    /// Empty field for a NOT NULL column with no declared default
    MissingRequiredValue { column: String },

    /// Field text could not be coerced to the column's declared type
    TypeMismatch { column: String, value: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MalformedQuoting => {
                write!(f, "malformed quoting: unterminated quote")
            }
            RejectReason::FieldCountMismatch { expected, found } => {
                write!(
                    f,
                    "field count mismatch: expected {} fields, found {}",
                    expected, found
                )
            }
            RejectReason::MissingRequiredValue { column } => {
                write!(f, "missing required value for column '{}'", column)
            }
            RejectReason::TypeMismatch { column, value } => {
                write!(f, "type mismatch for column '{}': '{}'", column, value)
            }
        }
    }
}

/// A row rejected at parse or normalization time; never fatal, always counted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Physical line the rejected record started on
    pub line_number: u64,

    /// Offending raw content, for the operator report
    pub raw: String,

    pub reason: RejectReason,
}

impl Rejection {
    pub fn new(line_number: u64, raw: impl Into<String>, reason: RejectReason) -> Self {
        Self {
            line_number,
            raw: raw.into(),
            reason,
        }
    }
}

/// Completion result of one issued insertion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// The store accepted the tuple
    Accepted,

    /// The store rejected the insertion (constraint violation, store-side
    /// type error); terminal for this row, counted toward the abort threshold
    Failed(String),
}

/// Outcome of one submitted row, produced exactly once per submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    /// Originating physical line of the submitted row
    pub line_number: u64,
    pub outcome: SubmitOutcome,
}

/// A submission the store refused, itemized for the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTuple {
    pub line_number: u64,
    pub reason: String,
}

// =============================================================================
// Run Summary
// =============================================================================

/// Finalized accounting of one loading run.
///
/// Built once the pipeline has drained and immutable afterwards; the sole
/// artifact consumed by the report writer. The acknowledged count equals the
/// number of tuples actually visible in the target table as a result of this
/// run, assuming no concurrent external writers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Source file path, echoed in the report header
    pub input_path: String,

    /// Destination table name
    pub table: String,

    /// Total physical input lines read, including blank and truncated ones
    pub lines_read: u64,

    /// Blank lines silently dropped under skip-empty-records
    pub blank_lines_skipped: u64,

    /// Rows rejected at parse or normalization time, before submission
    pub rows_rejected: u64,

    /// Tuples acknowledged by the store
    pub tuples_acknowledged: u64,

    /// Submissions the store refused
    pub tuples_failed: u64,

    /// Rows never attempted because the run aborted first
    pub rows_truncated: u64,

    /// Whether the run crossed the abort threshold and stopped early
    pub aborted: bool,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Completion timestamp
    pub completed_at: DateTime<Utc>,

    /// Itemized pre-submission rejections, capped for the report
    pub rejections: Vec<Rejection>,

    /// Itemized submission failures, capped for the report
    pub failures: Vec<FailedTuple>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_reason_display_is_operator_readable() {
        let reason = RejectReason::FieldCountMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(
            reason.to_string(),
            "field count mismatch: expected 3 fields, found 2"
        );

        let reason = RejectReason::TypeMismatch {
            column: "clm_integer".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(
            reason.to_string(),
            "type mismatch for column 'clm_integer': 'abc'"
        );
    }

    #[test]
    fn column_constructors_set_constraints() {
        let col = Column::with_default("id", ColumnType::Integer, FieldValue::Integer(0));
        assert_eq!(col.default, Some(FieldValue::Integer(0)));
        assert!(!col.nullable);
        assert!(!col.unique);

        let col = Column::required("id", ColumnType::Integer).unique();
        assert!(col.default.is_none());
        assert!(col.unique);

        let col = Column::nullable("name", ColumnType::Text);
        assert!(col.nullable);
    }

    #[test]
    fn field_value_display() {
        assert_eq!(FieldValue::Integer(42).to_string(), "42");
        assert_eq!(FieldValue::Text("foo".to_string()).to_string(), "foo");
        assert_eq!(FieldValue::Null.to_string(), "NULL");
    }
}
