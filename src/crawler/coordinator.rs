//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl engine and its termination handling:
//! - Seeding the job queue and spawning the worker pool
//! - Fetching pages, running the extraction pipeline, merging results
//! - Scheduling in-scope, unvisited links as child jobs
//! - Probing harvested values for non-200 responses
//! - Stopping when outstanding work drains or an interrupt arrives

use super::fetcher::{fetch_url, FetchResult, HttpClient, PROBE_TIMEOUT};
use super::job::{Job, JobProgress};
use super::scheduler::Scheduler;
use super::visited::VisitedSet;
use crate::config::{compile_exclusions, Config, CrawlSettings};
use crate::extract::{extract_page, ExtractedBatch, ExtractorKind, ExtractorSet, PageExtraction, Prober};
use crate::output::{CrawlStatistics, Findings, FindingsSnapshot, ResultSink, StatsSnapshot};
use crate::state::JobState;
use crate::url::{in_scope_url, resolve};
use crate::CrawlError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Everything a crawl produced, handed to the persistence layer
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Results of every enabled category
    pub findings: FindingsSnapshot,

    /// Every URL accepted by the visited set, sorted
    pub visited: Vec<String>,

    /// Counters at the time the report was taken
    pub stats: StatsSnapshot,

    /// True if the crawl was stopped by an interrupt
    pub interrupted: bool,
}

/// State shared by every worker
struct CrawlContext {
    seed: Url,
    client: HttpClient,
    prober: Prober,
    extractors: ExtractorSet,
    scheduler: Scheduler,
    visited: VisitedSet,
    findings: Findings,
    stats: CrawlStatistics,
    permits: Arc<Semaphore>,
    log_crawled_urls: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<CrawlContext>,
    depth: u32,
    threads: usize,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `settings` - Seed URL, crawl budget, TLS toggle and merged headers
    /// * `config` - Extractor tables and probe exclusions
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - An extractor, exclusion pattern or header was invalid
    pub fn new(settings: &CrawlSettings, config: &Config) -> Result<Self, CrawlError> {
        let threads = settings.threads.max(1);
        let permits = Arc::new(Semaphore::new(threads));

        let extractors = ExtractorSet::from_config(config)?;
        let client = HttpClient::new(settings, None)?;
        let prober = Prober::new(
            HttpClient::new(settings, Some(PROBE_TIMEOUT))?,
            compile_exclusions(&config.excluded_url_regex)?,
            &config.excluded_status_codes,
            Arc::clone(&permits),
        );

        tracing::debug!(
            "Configured {} extractor(s) across {} output categories",
            extractors.len(),
            extractors.enabled_kinds().len()
        );

        let findings = Findings::new(extractors.enabled_kinds());

        // Child links are deduplicated without fragments, so the seed is too
        let mut seed = settings.target.clone();
        seed.set_fragment(None);

        Ok(Self {
            context: Arc::new(CrawlContext {
                seed,
                client,
                prober,
                extractors,
                scheduler: Scheduler::new(),
                visited: VisitedSet::new(),
                findings,
                stats: CrawlStatistics::new(),
                permits,
                log_crawled_urls: config.log_crawled_urls,
            }),
            depth: settings.depth,
            threads,
        })
    }

    /// Runs the crawl until outstanding work drains
    pub async fn run(self) -> CrawlReport {
        self.run_until(std::future::pending()).await
    }

    /// Runs the crawl until outstanding work drains or `shutdown` resolves
    ///
    /// On shutdown the workers are aborted without waiting for in-flight
    /// requests, and the report holds everything merged up to that point.
    pub async fn run_until<F>(self, shutdown: F) -> CrawlReport
    where
        F: Future<Output = ()>,
    {
        let context = self.context;
        let start_time = std::time::Instant::now();

        tracing::info!(
            "Starting crawl of {} (depth {}, {} workers)",
            context.seed,
            self.depth,
            self.threads
        );
        context.schedule(context.seed.clone(), self.depth);

        let mut workers = JoinSet::new();
        for id in 0..self.threads {
            let context = Arc::clone(&context);
            workers.spawn(worker_loop(id, context));
        }

        let interrupted = tokio::select! {
            _ = drain(&mut workers) => false,
            _ = shutdown => true,
        };

        if interrupted {
            tracing::warn!(
                "Interrupted with {} job(s) outstanding, flushing partial results",
                context.scheduler.outstanding()
            );
            workers.abort_all();
        }

        let report = CrawlReport {
            findings: context.findings.snapshot(),
            visited: context.visited.snapshot(),
            stats: context.stats.snapshot(),
            interrupted,
        };

        tracing::info!(
            "Crawl {}: {} page(s) fetched, {} URL(s) visited in {:?}",
            if interrupted { "interrupted" } else { "completed" },
            report.stats.pages_fetched,
            report.visited.len(),
            start_time.elapsed()
        );

        report
    }
}

/// Runs a complete crawl and persists its results
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP clients and extractor set
/// 2. Crawl from the seed until work drains or `shutdown` resolves
/// 3. Hand the report to `sink`
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished (or was interrupted) and results were persisted
/// * `Err(CrawlError)` - Setup or persistence failed
pub async fn run_crawl<F>(
    settings: &CrawlSettings,
    config: &Config,
    sink: &dyn ResultSink,
    shutdown: F,
) -> Result<CrawlReport, CrawlError>
where
    F: Future<Output = ()>,
{
    let coordinator = Coordinator::new(settings, config)?;
    let report = coordinator.run_until(shutdown).await;
    sink.persist(&report)?;
    Ok(report)
}

/// Waits for every worker to exit
async fn drain(workers: &mut JoinSet<()>) {
    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            if e.is_panic() {
                tracing::error!("Worker panicked: {}", e);
            }
        }
    }
}

async fn worker_loop(id: usize, context: Arc<CrawlContext>) {
    while let Some(job) = context.scheduler.next_job().await {
        let _done = context.scheduler.completion_guard();

        if let Err(e) = context.process_job(&job).await {
            tracing::error!("Worker {}: error processing {}: {}", id, job.url(), e);
            context.stats.record_page_failed();
        }
    }

    tracing::trace!("Worker {} exiting", id);
}

impl CrawlContext {
    /// Claims `url` in the visited set and queues it
    ///
    /// Returns false if the depth budget is exhausted or another caller
    /// already owns the URL.
    fn schedule(&self, url: Url, depth: u32) -> bool {
        if depth == 0 {
            return false;
        }

        if !self.visited.try_visit(url.as_str()) {
            return false;
        }

        if self.log_crawled_urls {
            tracing::info!("Discovered {}", url);
        } else {
            tracing::debug!("Discovered {}", url);
        }

        self.scheduler.submit(Job::new(url, depth));
        true
    }

    /// Processes a single job
    ///
    /// Per-job failures are logged and counted here; only a broken job
    /// lifecycle is returned as an error.
    async fn process_job(&self, job: &Job) -> Result<(), CrawlError> {
        let mut progress = JobProgress::start(job);
        let page_url = job.url().as_str();

        progress.advance(JobState::Fetching)?;
        tracing::debug!("Fetching {} (depth {})", page_url, job.depth());

        let fetched = {
            let _permit = match self.permits.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    progress.advance(JobState::Failed)?;
                    return Ok(());
                }
            };
            fetch_url(&self.client, page_url).await
        };

        let (final_url, body) = match fetched {
            FetchResult::Success {
                final_url,
                status_code,
                body,
            } => {
                tracing::debug!("Fetched {} ({}, {} bytes)", page_url, status_code, body.len());
                self.stats.record_page_fetched();
                (final_url, body)
            }
            FetchResult::RateLimited => {
                tracing::warn!("Rate limited (429) on {}, dropping", page_url);
                self.stats.record_rate_limited();
                progress.advance(JobState::Failed)?;
                return Ok(());
            }
            FetchResult::ContentMismatch { content_type } => {
                tracing::debug!("Skipping non-HTML {} ({})", page_url, content_type);
                self.stats.record_non_html();
                progress.advance(JobState::Failed)?;
                return Ok(());
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("HTTP {} for {}", status_code, page_url);
                self.stats.record_page_failed();
                progress.advance(JobState::Failed)?;
                return Ok(());
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Failed to fetch {}: {}", page_url, error);
                self.stats.record_page_failed();
                progress.advance(JobState::Failed)?;
                return Ok(());
            }
        };

        progress.advance(JobState::Extracting)?;
        let page = match extract_page(&body, &self.extractors) {
            Ok(page) => page,
            Err(message) => {
                let error = CrawlError::HtmlParse {
                    url: page_url.to_string(),
                    message,
                };
                tracing::warn!("{}", error);
                self.stats.record_page_failed();
                progress.advance(JobState::Failed)?;
                return Ok(());
            }
        };

        let PageExtraction {
            batches,
            probe_candidates,
            links,
            base_href,
        } = page;

        for batch in batches {
            self.findings.merge(batch.kind, page_url, &batch.key, batch.values);
        }

        // Children are queued before probing so other workers can pick them
        // up while this one waits on probe responses.
        progress.advance(JobState::Expanding)?;
        if job.expands() {
            let base = base_href
                .and_then(|href| resolve(&href, &final_url).ok())
                .unwrap_or(final_url);
            self.expand(job, &base, &links);
        }

        self.probe_candidates(job.url(), probe_candidates).await;

        progress.advance(JobState::Done)?;
        Ok(())
    }

    /// Schedules every in-scope link found on a page
    fn expand(&self, job: &Job, base: &Url, links: &[String]) {
        let child_depth = job.child_depth();
        let mut scheduled = 0;

        for href in links {
            let mut url = match resolve(href, base) {
                Ok(url) => url,
                Err(e) => {
                    tracing::trace!("Skipping link {:?} on {}: {}", href, job.url(), e);
                    continue;
                }
            };
            url.set_fragment(None);

            if !in_scope_url(&url, &self.seed) {
                tracing::trace!("Out of scope: {}", url);
                continue;
            }

            if self.schedule(url, child_depth) {
                self.stats.record_link_discovered();
                scheduled += 1;
            }
        }

        tracing::debug!(
            "{}: {} link(s), {} new job(s) at depth {}",
            job.url(),
            links.len(),
            scheduled,
            child_depth
        );
    }

    /// Probes NonOkProbe harvests one value at a time and records the hits
    async fn probe_candidates(&self, page_url: &Url, candidates: Vec<ExtractedBatch>) {
        let page_scheme = page_url.scheme();
        for batch in candidates {
            let mut flagged = Vec::new();

            for value in batch.values {
                let outcome = match self.prober.probe(&value, page_scheme).await {
                    Some(outcome) => outcome,
                    None => continue,
                };
                self.stats.record_probe_sent();

                if outcome.is_interesting() {
                    tracing::info!("Non-200 resource on {}: {} ({:?})", page_url, value, outcome);
                    self.stats.record_probe_flagged();
                    flagged.push(value);
                }
            }

            self.findings
                .merge(ExtractorKind::NonOkProbe, page_url.as_str(), &batch.key, flagged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn settings(depth: u32) -> CrawlSettings {
        CrawlSettings::new(Url::parse("https://example.com/").unwrap()).with_depth(depth)
    }

    #[test]
    fn test_new_rejects_bad_exclusion() {
        let config = Config {
            excluded_url_regex: vec!["(".to_string()],
            ..Config::default()
        };
        assert!(Coordinator::new(&settings(1), &config).is_err());
    }

    #[tokio::test]
    async fn test_depth_zero_fetches_nothing() {
        let config = parse_config(r#"{ "LogQueries": { "img": "src" } }"#).unwrap();
        let report = Coordinator::new(&settings(0), &config).unwrap().run().await;

        assert!(report.visited.is_empty());
        assert_eq!(report.stats.pages_attempted(), 0);
        assert!(!report.interrupted);
        assert!(report.findings.is_empty());
    }

    #[tokio::test]
    async fn test_schedule_dedups_and_drops_depth_zero() {
        let coordinator = Coordinator::new(&settings(2), &Config::default()).unwrap();
        let context = &coordinator.context;
        let url = Url::parse("https://example.com/page").unwrap();

        assert!(!context.schedule(url.clone(), 0));
        assert!(context.schedule(url.clone(), 1));
        assert!(!context.schedule(url, 1));

        assert_eq!(context.visited.len(), 1);
        assert_eq!(context.scheduler.outstanding(), 1);
    }

    #[tokio::test]
    async fn test_expand_filters_scope_and_fragments() {
        let coordinator = Coordinator::new(&settings(3), &Config::default()).unwrap();
        let context = &coordinator.context;
        let job = Job::new(Url::parse("https://example.com/docs/").unwrap(), 3);
        let links: Vec<String> = [
            "guide#intro",
            "guide#setup",
            "https://blog.example.com/post",
            "https://example.org/elsewhere",
            "mailto:team@example.com",
            "javascript:void(0)",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        context.expand(&job, job.url(), &links);

        assert_eq!(
            context.visited.snapshot(),
            vec!["https://blog.example.com/post", "https://example.com/docs/guide"]
        );
        assert_eq!(context.stats.snapshot().links_discovered, 2);

        let child = context.scheduler.next_job().await.unwrap();
        assert_eq!(child.depth(), 2);
    }
}
