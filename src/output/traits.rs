//! Persistence seam for crawl results
//!
//! The crawl engine never writes files itself; it hands a finished (or
//! interrupted) report to a `ResultSink`.

use crate::crawler::CrawlReport;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for result persistence
///
/// Called once per crawl, either at normal completion or on interrupt.
/// Implementations must leave no partially written document behind.
pub trait ResultSink {
    /// Persists every enabled result category and, if requested, the visited URLs
    fn persist(&self, report: &CrawlReport) -> OutputResult<()>;
}
