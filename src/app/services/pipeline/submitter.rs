//! The submission loop
//!
//! Pulls records from the parser, routes rejections straight to the tracker,
//! and submits normalized rows with a bounded in-flight window. The window
//! gives backpressure: the producer is only polled for the next row when a
//! submission slot is free, so nothing buffers unboundedly. Every submitted
//! row resolves to exactly one recorded outcome, including while draining
//! after an abort.

use futures::stream::{self, StreamExt};
use std::io::BufRead;

use super::tracker::FailureTracker;
use crate::app::adapters::client::TableClient;
use crate::app::models::SubmissionOutcome;
use crate::app::services::line_parser::{LineParser, Record};
use crate::app::services::normalizer::RowNormalizer;

/// Run the pipeline until the input ends or the tracker stops accepting.
///
/// On return, every issued request has resolved and been recorded; rows the
/// tracker refused are left unread in the parser for the caller to account
/// as truncated.
pub async fn run_submissions<R: BufRead>(
    parser: &mut LineParser<R>,
    normalizer: &RowNormalizer,
    client: &dyn TableClient,
    tracker: &FailureTracker,
    table: &str,
    procedure: &str,
    max_in_flight: usize,
) {
    // The producer: sequential, in file order. Rejections are folded into
    // the tracker here and never submitted; the abort check happens at pull
    // time, so a row read before the transition is still submitted and a
    // row after it never is.
    let rows = std::iter::from_fn(|| {
        while tracker.is_accepting() {
            match parser.next_record()? {
                Record::Rejected(rejection) => tracker.record_rejection(rejection),
                Record::Row(raw) => match normalizer.normalize(raw) {
                    Ok(row) => return Some(row),
                    Err(rejection) => tracker.record_rejection(rejection),
                },
            }
        }
        None
    });

    stream::iter(rows)
        .map(|row| async move {
            let outcome = client.submit(table, procedure, row.values).await;
            SubmissionOutcome {
                line_number: row.line_number,
                outcome,
            }
        })
        .buffer_unordered(max_in_flight)
        .for_each(|outcome| {
            tracker.record_outcome(outcome);
            futures::future::ready(())
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adapters::client::{MemoryClient, MemoryStore};
    use crate::app::models::{Column, ColumnType, FieldValue, SubmitOutcome, TableSchema};
    use crate::app::services::line_parser::ParserOptions;
    use std::sync::Arc;

    fn schema() -> TableSchema {
        TableSchema::new(
            "blah",
            vec![
                Column::required("id", ColumnType::Integer).unique(),
                Column::nullable("name", ColumnType::Text),
            ],
        )
    }

    async fn run(
        input: &str,
        abort_threshold: u64,
        max_in_flight: usize,
    ) -> (Arc<MemoryStore>, FailureTracker) {
        let store = Arc::new(MemoryStore::new(schema()).unwrap());
        let client = MemoryClient::connect(Arc::clone(&store));
        let tracker = FailureTracker::new(abort_threshold);
        let normalizer = RowNormalizer::new(Arc::new(schema()), false);
        let mut parser = LineParser::new(
            input.as_bytes(),
            ParserOptions {
                expected_fields: 2,
                ..Default::default()
            },
        );

        run_submissions(
            &mut parser,
            &normalizer,
            &client,
            &tracker,
            "blah",
            "blah.insert",
            max_in_flight,
        )
        .await;
        tracker.mark_drained();
        (store, tracker)
    }

    #[tokio::test]
    async fn submits_every_row_and_records_every_outcome() {
        let (store, tracker) = run("1,foo\n2,bar\n3,baz\n", 100, 4).await;

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.acknowledged, 3);
        assert_eq!(snapshot.failed, 0);
        assert_eq!(store.row_count().await, 3);
    }

    #[tokio::test]
    async fn rejections_bypass_submission() {
        let (store, tracker) = run("1,foo\nnot-a-number,bar\n2,baz\n", 100, 4).await;

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.acknowledged, 2);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(store.row_count().await, 2);
    }

    #[tokio::test]
    async fn abort_stops_the_producer() {
        // Window of 1 makes completion order deterministic: two duplicates
        // of id 1 cross the threshold before line 5 is ever pulled
        let (store, tracker) = run("1,a\n2,b\n1,c\n1,d\n99,sentinel\n", 2, 1).await;

        let snapshot = tracker.snapshot();
        assert!(snapshot.aborted);
        assert_eq!(snapshot.acknowledged, 2);
        assert_eq!(snapshot.failed, 2);

        // The sentinel row after the abort point was never submitted
        let rows = store.rows().await;
        assert!(
            !rows
                .iter()
                .any(|row| row[0] == FieldValue::Integer(99)),
            "row after abort must not reach the store"
        );
    }

    #[tokio::test]
    async fn abort_counts_outcomes_of_rows_already_in_flight() {
        let store = Arc::new(MemoryStore::new(schema()).unwrap());
        let client = MemoryClient::connect(Arc::clone(&store));

        // Seed the unique key so every row in the input fails at the store
        let seeded = client
            .submit(
                "blah",
                "blah.insert",
                vec![FieldValue::Integer(1), FieldValue::Null],
            )
            .await;
        assert_eq!(seeded, SubmitOutcome::Accepted);

        let tracker = FailureTracker::new(1);
        let normalizer = RowNormalizer::new(Arc::new(schema()), false);
        let mut parser = LineParser::new(
            "1,a\n1,b\n1,c\n1,d\n99,sentinel\n".as_bytes(),
            ParserOptions {
                expected_fields: 2,
                ..Default::default()
            },
        );

        // The window admits four duplicates before any outcome resolves;
        // the first recorded failure crosses the threshold of one
        run_submissions(
            &mut parser,
            &normalizer,
            &client,
            &tracker,
            "blah",
            "blah.insert",
            4,
        )
        .await;
        tracker.mark_drained();

        let snapshot = tracker.snapshot();
        assert!(snapshot.aborted);
        // All four outstanding outcomes are counted, not just the one
        // that triggered the transition
        assert_eq!(snapshot.failed, 4);
        assert_eq!(snapshot.acknowledged, 0);

        let rows = store.rows().await;
        assert_eq!(rows.len(), 1, "only the seed row is stored");
        assert!(!rows.iter().any(|row| row[0] == FieldValue::Integer(99)));
    }
}
