//! Thread-safe accumulation of extraction results

use crate::extract::ExtractorKind;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Page URL -> extractor key -> values in extraction order
pub type ResultStore = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Accumulates the results of one output category
///
/// Every mutation goes through `merge`, which holds the lock for the whole
/// append, so concurrent merges never lose or interleave values.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    store: Mutex<ResultStore>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `values` to the batch for (`page_url`, `extractor_key`)
    ///
    /// An empty batch is not recorded.
    pub fn merge(&self, page_url: &str, extractor_key: &str, values: Vec<String>) {
        if values.is_empty() {
            return;
        }

        self.store
            .lock()
            .entry(page_url.to_string())
            .or_default()
            .entry(extractor_key.to_string())
            .or_default()
            .extend(values);
    }

    /// Returns a consistent copy of everything merged so far
    pub fn snapshot(&self) -> ResultStore {
        self.store.lock().clone()
    }

    /// Number of pages with at least one recorded value
    pub fn page_count(&self) -> usize {
        self.store.lock().len()
    }
}

/// One aggregator per configured output category
#[derive(Debug, Default)]
pub struct Findings {
    categories: BTreeMap<ExtractorKind, ResultAggregator>,
}

impl Findings {
    /// Creates aggregators for the given categories only
    pub fn new(enabled: &[ExtractorKind]) -> Self {
        Self {
            categories: enabled
                .iter()
                .map(|kind| (*kind, ResultAggregator::new()))
                .collect(),
        }
    }

    /// Records values under `kind`; ignored if the category is not enabled
    pub fn merge(&self, kind: ExtractorKind, page_url: &str, extractor_key: &str, values: Vec<String>) {
        match self.categories.get(&kind) {
            Some(aggregator) => aggregator.merge(page_url, extractor_key, values),
            None => tracing::trace!("Dropping {:?} values for disabled category", kind),
        }
    }

    pub fn snapshot(&self) -> FindingsSnapshot {
        FindingsSnapshot(
            self.categories
                .iter()
                .map(|(kind, aggregator)| (*kind, aggregator.snapshot()))
                .collect(),
        )
    }
}

/// Point-in-time copy of every enabled category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindingsSnapshot(BTreeMap<ExtractorKind, ResultStore>);

impl FindingsSnapshot {
    /// Results of one category; `None` if it was not enabled
    pub fn get(&self, kind: ExtractorKind) -> Option<&ResultStore> {
        self.0.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExtractorKind, &ResultStore)> {
        self.0.iter().map(|(kind, store)| (*kind, store))
    }

    /// Returns true if no category holds any value
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|store| store.is_empty())
    }
}
