//! Sandboxed filesystem access.
//!
//! This module provides the building blocks behind every gateway request:
//! - Path resolution confined to the sandbox root
//! - Allow-list filtering, binary classification and path protection
//! - A cached recursive index and single-level lazy listings
//! - Parallel search and replace over a bounded worker pool
//! - Zip archive creation and extraction
//!
//! # Security
//!
//! No operation touches the filesystem before its path has been resolved
//! by [`PathResolver`]. Resolution follows symlinks, so a link pointing
//! outside the root is rejected like any other escaping path.

pub mod archive;
pub mod cache;
pub mod filter;
pub mod lister;
pub mod operations;
pub mod pool;
pub mod replace;
pub mod resolver;
pub mod search;
pub mod walker;

pub use archive::ArchiveBuilder;
pub use cache::DirectoryCache;
pub use filter::AllowListFilter;
pub use lister::LazyLister;
pub use operations::{write_atomic, FileOperations};
pub use replace::ReplaceEngine;
pub use resolver::PathResolver;
pub use search::{SearchEngine, SearchQuery};
pub use walker::{TreeWalker, WalkError, WalkOutcome};
