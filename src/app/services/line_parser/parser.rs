//! Core line parser implementation
//!
//! A lazy, single-pass scanner over a buffered reader that produces one
//! [`Record`] per logical input record. Double-quoted fields may contain the
//! delimiter, doubled quotes as escapes, and embedded newlines; a logical
//! record spanning several physical lines keeps the line number of its first
//! line.

use std::io::BufRead;
use tracing::error;

use super::stats::ParseStats;
use crate::app::models::{RawLine, RejectReason, Rejection};
use crate::constants::{DEFAULT_DELIMITER, QUOTE_CHAR};

/// Parser behavior knobs, resolved from configuration
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Field delimiter
    pub delimiter: char,

    /// Column count of the destination table; records with a different
    /// field count are rejected
    pub expected_fields: usize,

    /// Drop fully blank physical lines instead of expanding them into a
    /// row of empty fields
    pub skip_empty_records: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            expected_fields: 0,
            skip_empty_records: false,
        }
    }
}

/// One logical record pulled from the input
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A well-formed record with the expected field count
    Row(RawLine),

    /// A record rejected at parse time; row-local, never fatal
    Rejected(Rejection),
}

/// Streaming record scanner over any buffered reader.
///
/// Single-pass and non-restartable: records are produced lazily in file
/// order and line numbers strictly increase.
#[derive(Debug)]
pub struct LineParser<R> {
    reader: R,
    options: ParserOptions,
    line_number: u64,
    stats: ParseStats,
    io_error: Option<std::io::Error>,
}

impl<R: BufRead> LineParser<R> {
    pub fn new(reader: R, options: ParserOptions) -> Self {
        Self {
            reader,
            options,
            line_number: 0,
            stats: ParseStats::new(),
            io_error: None,
        }
    }

    /// Running statistics, valid after any number of pulls
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// The I/O error that ended the input early, if one occurred.
    ///
    /// When set, the record sequence ended at the error, not at end of
    /// file; the rows produced up to that point are valid but the input
    /// was not fully read.
    pub fn io_error(&self) -> Option<&std::io::Error> {
        self.io_error.as_ref()
    }

    /// Take ownership of the retained I/O error for propagation
    pub fn take_io_error(&mut self) -> Option<std::io::Error> {
        self.io_error.take()
    }

    /// Pull the next logical record, or `None` at end of input.
    ///
    /// Blank lines are dropped here (counted, never surfaced) when
    /// skip-empty-records is on; otherwise they surface as a row of empty
    /// fields, one per destination column.
    pub fn next_record(&mut self) -> Option<Record> {
        loop {
            let line = self.read_physical_line()?;

            if line.is_empty() {
                if self.options.skip_empty_records {
                    self.stats.blank_lines_skipped += 1;
                    continue;
                }
                return Some(Record::Row(RawLine {
                    line_number: self.line_number,
                    fields: vec![String::new(); self.options.expected_fields],
                }));
            }

            return Some(self.parse_record(line));
        }
    }

    /// Read one physical line, stripping the trailing newline (LF or CRLF).
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than failing the
    /// record; an I/O error mid-stream ends the input early and is retained
    /// for the caller, since the stream cannot be resynchronized.
    fn read_physical_line(&mut self) -> Option<String> {
        if self.io_error.is_some() {
            return None;
        }
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                self.stats.lines_read += 1;
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                Some(String::from_utf8_lossy(&buf).into_owned())
            }
            Err(e) => {
                error!("Read failed after line {}: {}", self.line_number, e);
                self.io_error = Some(e);
                None
            }
        }
    }

    /// Split one logical record into fields, consuming further physical
    /// lines while inside an open quote.
    fn parse_record(&mut self, first_line: String) -> Record {
        let start_line = self.line_number;
        let delimiter = self.options.delimiter;

        let mut raw = first_line.clone();
        let mut current_line = first_line;
        let mut fields: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;

        loop {
            let mut chars = current_line.chars().peekable();
            while let Some(c) = chars.next() {
                if c == QUOTE_CHAR {
                    if in_quotes {
                        // Doubled quote inside a quoted field is an escape
                        if chars.peek() == Some(&QUOTE_CHAR) {
                            current.push(QUOTE_CHAR);
                            chars.next();
                        } else {
                            in_quotes = false;
                        }
                    } else {
                        in_quotes = true;
                    }
                } else if c == delimiter && !in_quotes {
                    fields.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }

            if !in_quotes {
                break;
            }

            // Open quote at end of line: the field continues on the next
            // physical line
            match self.read_physical_line() {
                Some(next) => {
                    current.push('\n');
                    raw.push('\n');
                    raw.push_str(&next);
                    current_line = next;
                }
                None => {
                    return Record::Rejected(Rejection::new(
                        start_line,
                        raw,
                        RejectReason::MalformedQuoting,
                    ));
                }
            }
        }
        fields.push(current);

        if fields.len() != self.options.expected_fields {
            return Record::Rejected(Rejection::new(
                start_line,
                raw,
                RejectReason::FieldCountMismatch {
                    expected: self.options.expected_fields,
                    found: fields.len(),
                },
            ));
        }

        Record::Row(RawLine {
            line_number: start_line,
            fields,
        })
    }
}
