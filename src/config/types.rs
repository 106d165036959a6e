use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use url::Url;

/// Default crawl depth when neither the CLI nor the config file sets one
pub const DEFAULT_DEPTH: u32 = 1;

/// Default number of concurrent in-flight fetches
pub const DEFAULT_THREADS: usize = 10;

/// Default directory results are written to
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Extraction configuration decoded from the JSON config file
///
/// Every field is optional. A missing extractor table disables that output
/// category entirely; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Attribute harvest: written to `attributes.json`
    #[serde(rename = "LogQueries", default)]
    pub log_queries: Option<BTreeMap<String, SelectorSpec>>,

    /// Attribute harvest probed for non-200 responses
    #[serde(rename = "LogNon200Queries", default)]
    pub log_non_200_queries: Option<BTreeMap<String, SelectorSpec>>,

    /// Tags whose inner text is harvested
    #[serde(rename = "LogInline", default)]
    pub log_inline: Option<Vec<String>>,

    /// Extra request headers sent with every request
    #[serde(rename = "Headers", default)]
    pub headers: BTreeMap<String, String>,

    /// Crawl depth, overridden by the `--depth` flag
    #[serde(rename = "Depth", default)]
    pub depth: Option<u32>,

    /// Probe values matching any of these patterns are never recorded
    #[serde(rename = "ExcludedUrlRegex", default)]
    pub excluded_url_regex: Vec<String>,

    /// Probe responses with these status codes are not interesting
    #[serde(rename = "ExcludedStatusCodes", default)]
    pub excluded_status_codes: Vec<u16>,

    /// Write every visited URL to `urls.txt`
    #[serde(rename = "LogCrawledURLs", default)]
    pub log_crawled_urls: bool,

    /// Harvest the bodies of inline `<script>` elements
    #[serde(rename = "LogInlineJS", default)]
    pub log_inline_js: bool,
}

/// One entry of `LogQueries` / `LogNon200Queries`
///
/// Two shapes are accepted:
/// - `"img": "src"`: the key is the tag, the value the attribute
/// - `"images": { "tag": "img", "attribute": "src" }`: the key names the extractor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SelectorSpec {
    Attribute(String),
    Named { tag: String, attribute: String },
}

/// Runtime settings supplied on the command line
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// The seed URL; its registrable domain defines the crawl scope
    pub target: Url,

    /// Directory results are written to
    pub output_dir: PathBuf,

    /// Accept untrusted TLS certificates
    pub insecure: bool,

    /// Maximum traversal depth; the seed page itself counts as depth 1
    pub depth: u32,

    /// Maximum number of concurrent in-flight fetches
    pub threads: usize,

    /// Headers sent with every request (config headers merged with CLI headers)
    pub headers: BTreeMap<String, String>,
}

impl CrawlSettings {
    /// Creates settings for a target with default budget values
    pub fn new(target: Url) -> Self {
        Self {
            target,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            insecure: false,
            depth: DEFAULT_DEPTH,
            threads: DEFAULT_THREADS,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}
