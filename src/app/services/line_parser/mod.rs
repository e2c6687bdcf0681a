//! Quote-aware line parser for delimited input files
//!
//! This module turns raw file bytes into an ordered sequence of field-value
//! records with physical line tracking, the first stage of the ingestion
//! pipeline.
//!
//! ## Architecture
//!
//! - [`parser`] - Streaming record scanner with quoting and blank-line policy
//! - [`stats`] - Running parse statistics
//!
//! ## Usage
//!
//! ```rust
//! use csvloader::app::services::line_parser::{LineParser, ParserOptions, Record};
//!
//! let input = "1,foo,2\n2,bar,3\n";
//! let options = ParserOptions {
//!     expected_fields: 3,
//!     ..Default::default()
//! };
//! let mut parser = LineParser::new(input.as_bytes(), options);
//!
//! while let Some(record) = parser.next_record() {
//!     match record {
//!         Record::Row(raw) => println!("line {}: {:?}", raw.line_number, raw.fields),
//!         Record::Rejected(rejection) => println!("rejected: {}", rejection.reason),
//!     }
//! }
//! ```

pub mod parser;
pub mod stats;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use parser::{LineParser, ParserOptions, Record};
pub use stats::ParseStats;
