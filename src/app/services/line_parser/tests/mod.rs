//! Test helpers for line parser tests

use super::{LineParser, ParserOptions, Record};
use crate::app::models::RawLine;


/// Build a parser over in-memory input with the given column count
pub fn parser_for(input: &str, expected_fields: usize) -> LineParser<&[u8]> {
    LineParser::new(
        input.as_bytes(),
        ParserOptions {
            expected_fields,
            ..Default::default()
        },
    )
}

/// Drain a parser, panicking on any rejection
pub fn collect_rows<R: std::io::BufRead>(parser: &mut LineParser<R>) -> Vec<RawLine> {
    let mut rows = Vec::new();
    while let Some(record) = parser.next_record() {
        match record {
            Record::Row(raw) => rows.push(raw),
            Record::Rejected(rejection) => {
                panic!("unexpected rejection at line {}: {}", rejection.line_number, rejection.reason)
            }
        }
    }
    rows
}
