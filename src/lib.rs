//! Translation backporting for release branches
//!
//! This library re-applies upstream changes to identifier-keyed language
//! files while reverting every entry whose source-language text changed in
//! the same range.
pub mod backport;
pub mod blacklist;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod git;
pub mod style;
pub mod types;

// Re-export commonly used types
pub use blacklist::Blacklist;
pub use config::BackportConfig;
pub use error::{BackportError, Result};
pub use filter::{FilteredDiff, filter_diff};
