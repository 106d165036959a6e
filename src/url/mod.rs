//! URL handling module for Second-Order
//!
//! This module provides reference resolution for discovered links and the
//! origin scope filter that keeps the crawl on the seed's site.

mod domain;
mod resolve;
mod scope;

// Re-export main functions
pub use domain::{extract_host, registrable_domain};
pub use resolve::resolve;
pub use scope::{in_scope, in_scope_url};
