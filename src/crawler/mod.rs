//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with User-Agent rotation and custom headers
//! - The shared job queue and outstanding-work accounting
//! - The visited set that gates all fan-out
//! - Overall crawl coordination and termination

mod coordinator;
mod fetcher;
mod job;
mod scheduler;
mod visited;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{
    build_header_map, fetch_url, random_user_agent, FetchResult, HttpClient, PROBE_TIMEOUT,
    USER_AGENTS,
};
pub use job::{Job, JobProgress};
pub use scheduler::{CompletionGuard, Scheduler};
pub use visited::VisitedSet;
