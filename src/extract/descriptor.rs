use crate::config::{Config, SelectorSpec};
use crate::ConfigError;
use scraper::Selector;
use std::collections::BTreeMap;

/// Output key of the inline-script extractor enabled by `LogInlineJS`
pub const INLINE_SCRIPT_KEY: &str = "inline-js";

/// Selector matching `<script>` elements that carry their body inline
const INLINE_SCRIPT_SELECTOR: &str = "script:not([src])";

/// Built-in selector used for link discovery on every page
pub const LINK_SELECTOR: &str = "a[href]";

/// What an extractor harvests from a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtractorKind {
    /// Value of a named attribute on every matching element
    AttributeValue,
    /// Inner text of every matching element
    ElementText,
    /// Attribute values that point at a non-200 or unreachable resource
    NonOkProbe,
}

impl ExtractorKind {
    /// File the persistence layer writes this category to
    pub fn output_file(&self) -> &'static str {
        match self {
            Self::AttributeValue => "attributes.json",
            Self::ElementText => "inline.json",
            Self::NonOkProbe => "non-200-url-attributes.json",
        }
    }

    /// Returns all extractor kinds in output order
    pub fn all() -> [Self; 3] {
        [Self::AttributeValue, Self::NonOkProbe, Self::ElementText]
    }
}

/// A configured rule for harvesting data from a fetched page
#[derive(Debug, Clone)]
pub struct ExtractorDescriptor {
    /// Key the results are stored under for each page
    pub key: String,
    /// Tag (or CSS selector) the extractor matches
    pub tag: String,
    /// Attribute read from matching elements; `None` for text extractors
    pub attribute: Option<String>,
    pub kind: ExtractorKind,
    selector: Selector,
}

impl ExtractorDescriptor {
    /// Builds an attribute-reading extractor (AttributeValue or NonOkProbe)
    pub fn attribute(
        key: impl Into<String>,
        tag: impl Into<String>,
        attribute: impl Into<String>,
        kind: ExtractorKind,
    ) -> Result<Self, ConfigError> {
        let tag = tag.into();
        let attribute = attribute.into();
        let selector = compile_selector(&format!("{}[{}]", tag, attribute))?;
        Ok(Self {
            key: key.into(),
            tag,
            attribute: Some(attribute),
            kind,
            selector,
        })
    }

    /// Builds an inner-text extractor
    pub fn text(key: impl Into<String>, tag: impl Into<String>) -> Result<Self, ConfigError> {
        let tag = tag.into();
        let selector = compile_selector(&tag)?;
        Ok(Self {
            key: key.into(),
            tag,
            attribute: None,
            kind: ExtractorKind::ElementText,
            selector,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// The ordered list of extractors applied to every page
#[derive(Debug, Clone)]
pub struct ExtractorSet {
    extractors: Vec<ExtractorDescriptor>,
    link_selector: Selector,
    enabled: Vec<ExtractorKind>,
}

impl ExtractorSet {
    /// Creates a set from explicit descriptors
    ///
    /// Every kind that appears in `descriptors` is considered enabled.
    pub fn new(extractors: Vec<ExtractorDescriptor>) -> Result<Self, ConfigError> {
        let mut enabled: Vec<ExtractorKind> = extractors.iter().map(|e| e.kind).collect();
        enabled.sort();
        enabled.dedup();
        Ok(Self {
            extractors,
            link_selector: compile_selector(LINK_SELECTOR)?,
            enabled,
        })
    }

    /// Builds the extractor list from the JSON configuration
    ///
    /// Extractors are ordered attributes, probes, then inline text; within a
    /// table they follow key order. A category is enabled when its table is
    /// present in the config, even if empty.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut extractors = Vec::new();
        let mut enabled = Vec::new();

        if let Some(queries) = &config.log_queries {
            enabled.push(ExtractorKind::AttributeValue);
            push_attribute_table(&mut extractors, queries, ExtractorKind::AttributeValue)?;
        }

        if let Some(queries) = &config.log_non_200_queries {
            enabled.push(ExtractorKind::NonOkProbe);
            push_attribute_table(&mut extractors, queries, ExtractorKind::NonOkProbe)?;
        }

        if config.log_inline.is_some() || config.log_inline_js {
            enabled.push(ExtractorKind::ElementText);
        }
        for tag in config.log_inline.iter().flatten() {
            extractors.push(ExtractorDescriptor::text(tag.clone(), tag.clone())?);
        }
        if config.log_inline_js {
            extractors.push(ExtractorDescriptor::text(
                INLINE_SCRIPT_KEY,
                INLINE_SCRIPT_SELECTOR,
            )?);
        }

        Ok(Self {
            extractors,
            link_selector: compile_selector(LINK_SELECTOR)?,
            enabled,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractorDescriptor> {
        self.extractors.iter()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Output categories that were configured
    pub fn enabled_kinds(&self) -> &[ExtractorKind] {
        &self.enabled
    }

    pub fn is_enabled(&self, kind: ExtractorKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn link_selector(&self) -> &Selector {
        &self.link_selector
    }
}

fn push_attribute_table(
    extractors: &mut Vec<ExtractorDescriptor>,
    table: &BTreeMap<String, SelectorSpec>,
    kind: ExtractorKind,
) -> Result<(), ConfigError> {
    for (key, spec) in table {
        let descriptor = match spec {
            SelectorSpec::Attribute(attribute) => ExtractorDescriptor::attribute(
                format!("{}[{}]", key, attribute),
                key.clone(),
                attribute.clone(),
                kind,
            )?,
            SelectorSpec::Named { tag, attribute } => {
                ExtractorDescriptor::attribute(key.clone(), tag.clone(), attribute.clone(), kind)?
            }
        };
        extractors.push(descriptor);
    }
    Ok(())
}

/// Parses a CSS selector, mapping failures to a configuration error
pub fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector(selector.to_string()))
}
