//! Output module for crawl results and summaries
//!
//! This module handles:
//! - Aggregating extraction results from concurrent workers
//! - Writing result categories as JSON documents
//! - Recording and printing crawl statistics

mod aggregator;
mod json;
pub mod stats;
mod traits;

pub use aggregator::{Findings, FindingsSnapshot, ResultAggregator, ResultStore};
pub use json::{JsonOutput, URLS_FILE};
pub use stats::{print_statistics, CrawlStatistics, StatsSnapshot};
pub use traits::{OutputError, OutputResult, ResultSink};
