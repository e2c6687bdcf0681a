//! Application constants for the CSV loader
//!
//! This module contains default values, limits, and fixed names
//! used throughout the loader.

// =============================================================================
// Pipeline Defaults
// =============================================================================

/// Default number of submission failures that triggers an early abort
pub const DEFAULT_ABORT_FAILURE_COUNT: u64 = 100;

/// Default maximum number of concurrently outstanding insertion requests
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Default field delimiter
pub const DEFAULT_DELIMITER: char = ',';

/// Quote character recognized by the line parser
pub const QUOTE_CHAR: char = '"';

// =============================================================================
// Report Constants
// =============================================================================

/// File name of the summary report written into the report directory
pub const REPORT_FILE_NAME: &str = "csvloader_report.log";

/// Prefix of the acknowledged-tuple line in the report.
///
/// Operators and automated checks match on this exact prefix, so it must
/// not change between releases.
pub const ACKNOWLEDGED_TUPLES_PREFIX: &str = "Number of acknowledged tuples:";

/// Maximum number of rejections and failures itemized in the report
pub const MAX_ITEMIZED_ERRORS: usize = 100;

// =============================================================================
// Process Exit Codes
// =============================================================================

/// Exit status codes reported by the binary
pub mod exit_codes {
    /// Run drained normally without hitting the abort threshold
    pub const SUCCESS: i32 = 0;

    /// Fatal setup failure (unreadable input, connection failure, bad config)
    pub const FATAL: i32 = 1;

    /// Run aborted early after crossing the failure threshold
    pub const ABORTED: i32 = 2;
}
