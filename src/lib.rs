//! CSV Loader Library
//!
//! A Rust library for bulk-loading delimited text files into a database table
//! through the database's client-facing insertion interface.
//!
//! This library provides tools for:
//! - Streaming, quote-aware CSV parsing with physical line tracking
//! - Per-row normalization (whitespace trimming, default coercion, typing)
//! - Bounded-concurrency submission of rows as asynchronous insertions
//! - Partial-failure accounting with an abort-after-N-failures policy
//! - A drained, exactly-once-accounted summary report for operators

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod line_parser;
        pub mod loader;
        pub mod normalizer;
        pub mod pipeline;
        pub mod report;
    }
    pub mod adapters {
        pub mod client;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::adapters::client::{MemoryClient, MemoryStore, TableClient};
pub use app::models::{Column, ColumnType, FieldValue, Summary, TableSchema};
pub use app::services::loader::CsvLoader;
pub use config::Config;

/// Result type alias for the CSV loader
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for loader setup and orchestration failures.
///
/// Row-level problems (malformed records, type mismatches, insertions the
/// store refuses) are never represented here; they are captured as
/// [`app::models::Rejection`] and failed-outcome data and folded into the
/// run's counters. Only setup-phase problems terminate a run abnormally.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Input file missing or unreadable
    #[error("Cannot read input file '{path}': {message}")]
    InputFile { path: String, message: String },

    /// Client connection could not be established or was lost
    #[error("Client connection error: {message}")]
    Connection { message: String },

    /// Target table is not known to the store
    #[error("Unknown table: {table}")]
    UnknownTable { table: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Report artifact could not be written
    #[error("Report writing error: {message}")]
    Report { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an input file error
    pub fn input_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a client connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create an unknown table error
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a report writing error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}
