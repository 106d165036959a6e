//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `JobState`: Tracks the lifecycle of a single crawl job (queued, fetching,
//!   extracting, expanding, done or failed)

mod job_state;

// Re-export main types
pub use job_state::JobState;
