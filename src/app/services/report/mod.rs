//! Summary report writing
//!
//! Renders a finalized [`Summary`] into a human-readable report file in the
//! configured directory. The acknowledged-tuple line uses a fixed prefix
//! that operators and automated checks match on.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::app::models::Summary;
use crate::constants::{ACKNOWLEDGED_TUPLES_PREFIX, REPORT_FILE_NAME};
use crate::{Error, Result};

/// Writes the run report into a directory, creating it if missing
#[derive(Debug, Clone)]
pub struct ReportWriter {
    report_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(report_dir: impl AsRef<Path>) -> Self {
        Self {
            report_dir: report_dir.as_ref().to_path_buf(),
        }
    }

    /// Write the report file and return its path
    pub fn write(&self, summary: &Summary) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.report_dir).map_err(|e| {
            Error::report(format!(
                "cannot create report directory '{}': {}",
                self.report_dir.display(),
                e
            ))
        })?;

        let path = self.report_dir.join(REPORT_FILE_NAME);
        let content = render(summary);
        std::fs::write(&path, content)
            .map_err(|e| Error::report(format!("cannot write '{}': {}", path.display(), e)))?;

        info!("Report written to {}", path.display());
        Ok(path)
    }
}

fn render(summary: &Summary) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let w = &mut out;
    writeln!(w, "CSV Loading Report").unwrap();
    writeln!(w, "==================").unwrap();
    writeln!(w, "Input file:   {}", summary.input_path).unwrap();
    writeln!(w, "Target table: {}", summary.table).unwrap();
    writeln!(
        w,
        "Completed at: {}",
        summary.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
    .unwrap();
    writeln!(w, "Elapsed time: {:.3}s", summary.duration.as_secs_f64()).unwrap();
    writeln!(w).unwrap();
    writeln!(w, "Number of input lines read: {}", summary.lines_read).unwrap();
    writeln!(
        w,
        "Number of blank lines skipped: {}",
        summary.blank_lines_skipped
    )
    .unwrap();
    writeln!(
        w,
        "Number of rows rejected before submission: {}",
        summary.rows_rejected
    )
    .unwrap();
    writeln!(
        w,
        "{} {}",
        ACKNOWLEDGED_TUPLES_PREFIX, summary.tuples_acknowledged
    )
    .unwrap();
    writeln!(w, "Number of failed tuples: {}", summary.tuples_failed).unwrap();
    writeln!(
        w,
        "Number of rows not attempted after abort: {}",
        summary.rows_truncated
    )
    .unwrap();
    writeln!(
        w,
        "Run aborted early: {}",
        if summary.aborted { "yes" } else { "no" }
    )
    .unwrap();

    if !summary.rejections.is_empty() {
        writeln!(w).unwrap();
        writeln!(w, "Rejected rows:").unwrap();
        for rejection in &summary.rejections {
            writeln!(
                w,
                "  line {}: {} (content: \"{}\")",
                rejection.line_number, rejection.reason, rejection.raw
            )
            .unwrap();
        }
        if (summary.rejections.len() as u64) < summary.rows_rejected {
            writeln!(
                w,
                "  ... and {} more",
                summary.rows_rejected - summary.rejections.len() as u64
            )
            .unwrap();
        }
    }

    if !summary.failures.is_empty() {
        writeln!(w).unwrap();
        writeln!(w, "Failed tuples:").unwrap();
        for failure in &summary.failures {
            writeln!(w, "  line {}: {}", failure.line_number, failure.reason).unwrap();
        }
        if (summary.failures.len() as u64) < summary.tuples_failed {
            writeln!(
                w,
                "  ... and {} more",
                summary.tuples_failed - summary.failures.len() as u64
            )
            .unwrap();
        }
    }

    out
}
