//! URL handling module
//!
//! This module provides URL normalization, host comparison and ignore-pattern
//! matching for the crawler and the analyzer.

mod domain;
mod matcher;
mod normalize;

pub use domain::same_host;
pub use matcher::{regex_body, IgnoreMatcher};
pub use normalize::{normalize_str, normalize_url};
