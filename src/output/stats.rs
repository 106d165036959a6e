//! Crawl statistics counters
//!
//! Workers bump these counters as they go; a snapshot is taken when the crawl
//! finishes (or is interrupted) and printed as a summary.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by every worker
#[derive(Debug, Default)]
pub struct CrawlStatistics {
    pages_fetched: AtomicU64,
    pages_failed: AtomicU64,
    rate_limited: AtomicU64,
    non_html: AtomicU64,
    links_discovered: AtomicU64,
    probes_sent: AtomicU64,
    probes_flagged: AtomicU64,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    /// Network errors, non-2xx statuses and unprocessable documents
    pub fn record_page_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_non_html(&self) {
        self.non_html.fetch_add(1, Ordering::Relaxed);
    }

    /// An in-scope link was accepted by the visited set and scheduled
    pub fn record_link_discovered(&self) {
        self.links_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe_sent(&self) {
        self.probes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe_flagged(&self) {
        self.probes_flagged.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            non_html: self.non_html.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            probes_sent: self.probes_sent.load(Ordering::Relaxed),
            probes_flagged: self.probes_flagged.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the crawl counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// HTML pages fetched successfully
    pub pages_fetched: u64,

    /// Pages dropped after a network error, HTTP error or parse failure
    pub pages_failed: u64,

    /// Pages dropped after HTTP 429
    pub rate_limited: u64,

    /// Pages skipped because the response was not HTML
    pub non_html: u64,

    /// In-scope links scheduled as new jobs
    pub links_discovered: u64,

    /// Probe requests issued for NonOkProbe extractors
    pub probes_sent: u64,

    /// Probed values recorded as non-200 or unreachable
    pub probes_flagged: u64,
}

impl StatsSnapshot {
    /// Total number of jobs that reached a terminal state
    pub fn pages_attempted(&self) -> u64 {
        self.pages_fetched + self.pages_failed + self.rate_limited + self.non_html
    }

    /// Share of attempted pages that were fetched, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_attempted();
        if attempted == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / attempted as f64) * 100.0
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `visited` - Number of URLs in the visited set
pub fn print_statistics(stats: &StatsSnapshot, visited: usize) {
    eprintln!("=== Crawl Statistics ===\n");

    eprintln!("Pages:");
    eprintln!("  Visited URLs: {}", visited);
    eprintln!("  Fetched: {}", stats.pages_fetched);
    eprintln!("  Failed: {}", stats.pages_failed);
    eprintln!("  Rate limited (429): {}", stats.rate_limited);
    eprintln!("  Non-HTML: {}", stats.non_html);
    eprintln!();

    eprintln!("Links:");
    eprintln!("  In-scope links scheduled: {}", stats.links_discovered);
    eprintln!();

    if stats.probes_sent > 0 {
        eprintln!("Probes:");
        eprintln!("  Sent: {}", stats.probes_sent);
        eprintln!("  Non-200 or unreachable: {}", stats.probes_flagged);
        eprintln!();
    }

    eprintln!(
        "Success Rate: {:.1}% ({} / {} pages fetched)",
        stats.success_rate(),
        stats.pages_fetched,
        stats.pages_attempted()
    );
}
