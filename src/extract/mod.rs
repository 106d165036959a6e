//! Extraction pipeline for fetched pages
//!
//! This module contains:
//! - Extractor descriptors built from the JSON configuration
//! - The one-pass document pipeline (attributes, inner text, links)
//! - The non-200 prober used by `LogNon200Queries`

mod descriptor;
mod pipeline;
mod probe;

pub use descriptor::{
    compile_selector, ExtractorDescriptor, ExtractorKind, ExtractorSet, INLINE_SCRIPT_KEY,
    LINK_SELECTOR,
};
pub use pipeline::{extract_page, ExtractedBatch, PageExtraction};
pub use probe::{probe_target, ProbeOutcome, Prober};
