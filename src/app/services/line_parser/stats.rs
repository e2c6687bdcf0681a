//! Running statistics for the line parser

use serde::{Deserialize, Serialize};

/// Simple parsing statistics, updated as records are pulled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseStats {
    /// Total physical input lines read, including blank lines and the
    /// physical lines of multi-line quoted records
    pub lines_read: u64,

    /// Blank lines silently dropped under skip-empty-records
    pub blank_lines_skipped: u64,
}

impl ParseStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self {
            lines_read: 0,
            blank_lines_skipped: 0,
        }
    }
}

impl Default for ParseStats {
    fn default() -> Self {
        Self::new()
    }
}
