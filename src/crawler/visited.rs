//! Dedup/visited set gating all fan-out

use parking_lot::Mutex;
use std::collections::HashSet;

/// Set of every URL the crawl has decided to schedule
///
/// The set only grows. Membership check and insertion happen under one lock,
/// so exactly one caller ever owns a given URL.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for scheduling
    ///
    /// Returns true only to the first caller for a given URL; every later or
    /// concurrent caller receives false.
    pub fn try_visit(&self, url: &str) -> bool {
        self.urls.lock().insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.lock().is_empty()
    }

    /// Returns every visited URL, sorted
    pub fn snapshot(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.urls.lock().iter().cloned().collect();
        urls.sort();
        urls
    }
}
