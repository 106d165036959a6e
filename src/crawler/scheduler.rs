//! Job queue and outstanding-work accounting
//!
//! This module handles:
//! - The shared FIFO queue every worker pulls jobs from
//! - Counting jobs that were submitted but have not completed yet
//! - Waking idle workers when work arrives or the crawl drains
//!
//! The crawl is finished when the outstanding count reaches zero. A worker
//! submits the children of a page before it completes the page itself, so the
//! count can only reach zero once no job is queued or running.

use super::job::Job;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Shared job queue with an outstanding-work counter
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Jobs waiting for a worker, in arrival order
    queue: Mutex<VecDeque<Job>>,

    /// Jobs submitted but not yet completed (queued or in progress)
    outstanding: AtomicUsize,

    /// Wakes workers parked in `next_job`
    notify: Notify,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job to the queue and counts it as outstanding
    pub fn submit(&self, job: Job) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().push_back(job);
        self.notify.notify_waiters();
    }

    /// Marks one previously dequeued job as finished
    ///
    /// Must be called exactly once per job returned by `next_job`, after any
    /// children of that job have been submitted.
    pub fn complete(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "complete() called without outstanding work");
        if previous == 1 {
            tracing::debug!("Outstanding work drained");
            self.notify.notify_waiters();
        }
    }

    /// Returns a guard that calls `complete` when dropped
    ///
    /// Holding the guard for the duration of a job keeps the count correct
    /// even if processing panics.
    pub fn completion_guard(&self) -> CompletionGuard<'_> {
        CompletionGuard { scheduler: self }
    }

    /// Waits for the next job
    ///
    /// # Returns
    ///
    /// * `Some(Job)` - A job this caller now owns
    /// * `None` - The queue is empty and no work is outstanding; the crawl is over
    pub async fn next_job(&self) -> Option<Job> {
        loop {
            // Register interest before checking, so a submit or drain that
            // lands between the check and the await still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let job = self.queue.lock().pop_front();
            if job.is_some() {
                return job;
            }

            if self.outstanding.load(Ordering::SeqCst) == 0 {
                return None;
            }

            notified.await;
        }
    }

    /// Number of jobs submitted but not yet completed
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Number of jobs waiting in the queue
    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }
}

/// Completes one job on drop
#[must_use = "dropping the guard immediately completes the job"]
pub struct CompletionGuard<'a> {
    scheduler: &'a Scheduler,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.scheduler.complete();
    }
}
