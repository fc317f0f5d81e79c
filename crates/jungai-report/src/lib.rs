//! Durable JSONL output for brand archetype verdicts.

pub mod report;
pub mod writer;

pub use report::{Report, ReportSource};
pub use writer::{read_reports, ReportWriter};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// The report could not be serialized or appended; nothing was written.
    #[error("failed to write report to {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("failed to read reports from {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
