//! JSON and plain-text result files
//!
//! One pretty-printed JSON document is written per enabled category, plus
//! `urls.txt` when crawled-URL logging is on. Each file is written to a
//! sibling temp file and renamed into place.

use super::traits::{OutputResult, ResultSink};
use crate::crawler::CrawlReport;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File holding the newline-joined visited URLs
pub const URLS_FILE: &str = "urls.txt";

/// Writes crawl results into an output directory
#[derive(Debug, Clone)]
pub struct JsonOutput {
    dir: PathBuf,
    write_urls: bool,
}

impl JsonOutput {
    /// Creates a writer for `dir`
    ///
    /// # Arguments
    ///
    /// * `dir` - Output directory; created on first write
    /// * `write_urls` - Also write `urls.txt` with every visited URL
    pub fn new(dir: impl Into<PathBuf>, write_urls: bool) -> Self {
        Self {
            dir: dir.into(),
            write_urls,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResultSink for JsonOutput {
    fn persist(&self, report: &CrawlReport) -> OutputResult<()> {
        fs::create_dir_all(&self.dir)?;

        for (kind, store) in report.findings.iter() {
            let path = self.dir.join(kind.output_file());
            let contents = serde_json::to_vec_pretty(store)?;
            write_atomic(&path, &contents)?;
            tracing::info!("Wrote {} page(s) to {}", store.len(), path.display());
        }

        if self.write_urls {
            let path = self.dir.join(URLS_FILE);
            write_atomic(&path, report.visited.join("\n").as_bytes())?;
            tracing::info!("Wrote {} URL(s) to {}", report.visited.len(), path.display());
        }

        Ok(())
    }
}

/// Writes `contents` to `path` through a temp file in the same directory
fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}
