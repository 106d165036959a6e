//! One-pass extraction over a fetched document
//!
//! The document is parsed once; every configured extractor and the built-in
//! link selector then run against the same tree. `scraper::Html` is not
//! `Send`, so everything returned here is owned data that can cross an
//! `.await` in the worker.

use super::descriptor::{ExtractorKind, ExtractorSet};
use scraper::{Html, Selector};

/// Values one extractor produced for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBatch {
    pub kind: ExtractorKind,
    pub key: String,
    pub values: Vec<String>,
}

/// Everything harvested from a single page
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// AttributeValue and ElementText batches, ready to be recorded
    pub batches: Vec<ExtractedBatch>,

    /// NonOkProbe harvests that still have to be probed
    pub probe_candidates: Vec<ExtractedBatch>,

    /// Raw `href` values of every `<a href>` on the page
    pub links: Vec<String>,

    /// Value of the document's `<base href>`, if any
    pub base_href: Option<String>,
}

/// Runs every extractor against an HTML document
///
/// Extractors whose selector matches nothing produce no batch.
///
/// # Errors
///
/// Returns an error message if the body cannot be treated as an HTML
/// document (binary content served with an HTML content type).
///
/// # Example
///
/// ```
/// use second_order::extract::{extract_page, ExtractorDescriptor, ExtractorKind, ExtractorSet};
///
/// let set = ExtractorSet::new(vec![
///     ExtractorDescriptor::attribute("img[src]", "img", "src", ExtractorKind::AttributeValue).unwrap(),
/// ]).unwrap();
/// let html = r#"<html><body><img src="/logo.png"><a href="/about">About</a></body></html>"#;
///
/// let page = extract_page(html, &set).unwrap();
/// assert_eq!(page.batches[0].values, vec!["/logo.png"]);
/// assert_eq!(page.links, vec!["/about"]);
/// ```
pub fn extract_page(html: &str, extractors: &ExtractorSet) -> Result<PageExtraction, String> {
    if html.contains('\0') {
        return Err("document contains NUL bytes".to_string());
    }

    let document = Html::parse_document(html);
    let mut page = PageExtraction {
        links: select_attribute(&document, extractors.link_selector(), "href"),
        base_href: extract_base_href(&document),
        ..PageExtraction::default()
    };

    for extractor in extractors.iter() {
        let values = match &extractor.attribute {
            Some(attribute) => select_attribute(&document, extractor.selector(), attribute),
            None => select_text(&document, extractor.selector()),
        };

        if values.is_empty() {
            continue;
        }

        let batch = ExtractedBatch {
            kind: extractor.kind,
            key: extractor.key.clone(),
            values,
        };

        match extractor.kind {
            ExtractorKind::NonOkProbe => page.probe_candidates.push(batch),
            ExtractorKind::AttributeValue | ExtractorKind::ElementText => page.batches.push(batch),
        }
    }

    Ok(page)
}

fn select_attribute(document: &Html, selector: &Selector, attribute: &str) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr(attribute))
        .map(str::to_string)
        .collect()
}

fn select_text(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(|element| element.text().collect::<String>())
        .collect()
}

fn extract_base_href(document: &Html) -> Option<String> {
    let selector = Selector::parse("base[href]").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}
