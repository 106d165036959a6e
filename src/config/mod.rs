//! Configuration module for Second-Order
//!
//! Extraction rules come from a JSON file; the crawl budget, target and
//! transport options come from the command line and are collected into
//! [`CrawlSettings`].
//!
//! # Example
//!
//! ```no_run
//! use second_order::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.json")).unwrap();
//! println!("Probing {:?}", config.log_non_200_queries);
//! ```

mod headers;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlSettings, SelectorSpec, DEFAULT_DEPTH, DEFAULT_OUTPUT_DIR, DEFAULT_THREADS,
};

// Re-export parser and validation functions
pub use headers::{merge_headers, parse_header_flag};
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{compile_exclusions, parse_target, validate_settings};
