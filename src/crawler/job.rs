//! Crawl jobs and their per-job lifecycle tracking

use crate::state::JobState;
use crate::CrawlError;
use url::Url;

/// One unit of crawl work: a URL plus the remaining depth budget
///
/// Jobs are immutable once created and consumed exactly once by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    url: Url,
    depth: u32,
}

impl Job {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Remaining depth budget
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns true if links found on this page should be followed
    pub fn expands(&self) -> bool {
        self.depth > 1
    }

    /// Depth assigned to jobs discovered on this page
    pub fn child_depth(&self) -> u32 {
        self.depth.saturating_sub(1)
    }
}

/// Tracks the state of a job as a worker processes it
#[derive(Debug)]
pub struct JobProgress<'a> {
    job: &'a Job,
    state: JobState,
}

impl<'a> JobProgress<'a> {
    /// Starts tracking a job that was just dequeued
    pub fn start(job: &'a Job) -> Self {
        Self {
            job,
            state: JobState::Queued,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Moves the job to `next`
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::InvalidTransition` if the move is not part of the
    /// job lifecycle; the state is left unchanged.
    pub fn advance(&mut self, next: JobState) -> Result<(), CrawlError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::trace!("{} {} -> {}", self.job.url(), self.state, next);
        self.state = next;
        Ok(())
    }
}
