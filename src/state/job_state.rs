/// Job state definitions for tracking crawl progress
///
/// Every job walks `Queued -> Fetching -> Extracting -> Expanding -> Done`.
/// A fetch that fails, is rate limited, or returns non-HTML content ends in
/// `Failed`, as does a page whose document cannot be processed.
use std::fmt;

/// Represents the current state of a job in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    // ===== Active States =====
    /// Job has been accepted by the visited set and sits in the queue
    Queued,

    /// The page is being fetched
    Fetching,

    /// Extractors are running against the fetched document
    Extracting,

    /// Discovered links are being scheduled as child jobs
    Expanding,

    // ===== Terminal States =====
    /// Job was fully processed
    Done,

    /// Job was dropped (network error, HTTP 429, non-HTML content, bad document)
    Failed,
}

impl JobState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Fetching)
                | (Self::Fetching, Self::Extracting)
                | (Self::Fetching, Self::Failed)
                | (Self::Extracting, Self::Expanding)
                | (Self::Extracting, Self::Failed)
                | (Self::Expanding, Self::Done)
        )
    }

    /// Short lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Expanding => "expanding",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible job states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Fetching,
            Self::Extracting,
            Self::Expanding,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
