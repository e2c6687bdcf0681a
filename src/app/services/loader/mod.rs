//! Loader orchestration
//!
//! Ties the pipeline stages together for one run: open the input, fetch the
//! destination schema from the client, stream parse → normalize → submit,
//! drain, and finalize the summary. The client connection is released when
//! the run reaches its end, on the abort path included.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::app::adapters::client::TableClient;
use crate::app::models::Summary;
use crate::app::services::line_parser::{LineParser, ParserOptions};
use crate::app::services::normalizer::RowNormalizer;
use crate::app::services::pipeline::{FailureTracker, run_submissions};
use crate::config::Config;
use crate::{Error, Result};

/// One-shot CSV loading run against a connected client
pub struct CsvLoader {
    config: Config,
    client: Arc<dyn TableClient>,
}

impl CsvLoader {
    pub fn new(config: Config, client: Arc<dyn TableClient>) -> Self {
        Self { config, client }
    }

    /// Run the full pipeline and return the finalized summary.
    ///
    /// Setup problems (unreadable input, unknown table) return an error
    /// before any row is processed; row-level problems are accounted in the
    /// summary and never surface here.
    pub async fn run(&self) -> Result<Summary> {
        let result = self.run_inner().await;
        if let Err(e) = self.client.close().await {
            warn!("Failed to close client connection: {}", e);
        }
        result
    }

    async fn run_inner(&self) -> Result<Summary> {
        let started = Instant::now();
        let input_path = self.config.input_path.display().to_string();

        info!(
            "Loading '{}' into table '{}'",
            input_path, self.config.table
        );

        let file = File::open(&self.config.input_path)
            .map_err(|e| Error::input_file(&input_path, e.to_string()))?;

        let schema = self.client.table_schema(&self.config.table).await?;
        let procedure = self.config.procedure_name();

        let mut parser = LineParser::new(
            BufReader::new(file),
            ParserOptions {
                delimiter: self.config.delimiter,
                expected_fields: schema.column_count(),
                skip_empty_records: self.config.skip_empty_records,
            },
        );
        let normalizer = RowNormalizer::new(Arc::new(schema), self.config.trim_whitespace);
        let tracker = FailureTracker::new(self.config.abort_failure_count);

        run_submissions(
            &mut parser,
            &normalizer,
            self.client.as_ref(),
            &tracker,
            &self.config.table,
            &procedure,
            self.config.max_in_flight,
        )
        .await;

        // After an abort the rest of the input is read for accounting only;
        // none of it is submitted
        if tracker.was_aborted() {
            let mut truncated = 0u64;
            while parser.next_record().is_some() {
                truncated += 1;
            }
            tracker.record_truncated(truncated);
        }
        tracker.mark_drained();

        // A mid-stream read failure truncated the input; the counters do
        // not cover the unread rows, so the run is fatal, not a summary
        if let Some(e) = parser.take_io_error() {
            return Err(Error::io(
                format!("reading '{}' failed mid-stream", input_path),
                e,
            ));
        }

        let counts = tracker.snapshot();
        let stats = parser.stats();

        info!(
            "Run complete: {} acknowledged, {} failed, {} rejected{}",
            counts.acknowledged,
            counts.failed,
            counts.rejected,
            if counts.aborted { " (aborted early)" } else { "" }
        );

        Ok(Summary {
            input_path,
            table: self.config.table.clone(),
            lines_read: stats.lines_read,
            blank_lines_skipped: stats.blank_lines_skipped,
            rows_rejected: counts.rejected,
            tuples_acknowledged: counts.acknowledged,
            tuples_failed: counts.failed,
            rows_truncated: counts.truncated,
            aborted: counts.aborted,
            duration: started.elapsed(),
            completed_at: chrono::Utc::now(),
            rejections: counts.rejections,
            failures: counts.failures,
        })
    }
}
