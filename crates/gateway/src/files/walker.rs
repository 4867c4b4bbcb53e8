//! Bounded recursive scan of the sandbox.
//!
//! The walker produces the flat, path-sorted entry list served by the
//! directory cache. Depth and entry count are capped; hidden names and
//! excluded directories are pruned before they are descended into.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use protocol::Entry;
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::filter::AllowListFilter;
use super::resolver::to_slash;
use crate::config::IndexConfig;

/// Failure to scan the sandbox root itself.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The root directory could not be read.
    #[error("cannot read {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scan failed at the root level.
    #[error("scan failed: {0}")]
    Scan(#[from] walkdir::Error),
}

/// Result of a completed walk.
#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    /// Entries sorted by relative path.
    pub entries: Vec<Entry>,
    /// Whether the entry limit stopped the scan early.
    pub truncated: bool,
}

/// Recursive scanner with depth and count limits.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    filter: Arc<AllowListFilter>,
    max_depth: usize,
    max_files: usize,
}

impl TreeWalker {
    /// Create a walker over the canonical `root`.
    pub fn new(root: impl Into<PathBuf>, filter: Arc<AllowListFilter>, limits: &IndexConfig) -> Self {
        Self {
            root: root.into(),
            filter,
            max_depth: limits.max_depth,
            max_files: limits.max_files,
        }
    }

    /// Scan the tree.
    ///
    /// Unreadable descendants are skipped; only a failure to read the root
    /// is reported as an error.
    pub fn walk(&self, show_hidden: bool) -> Result<WalkOutcome, WalkError> {
        fs::read_dir(&self.root).map_err(|source| WalkError::Root {
            path: self.root.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        let mut truncated = false;

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(e.file_type().is_dir()
                        && self
                            .filter
                            .prunes_dir(&e.file_name().to_string_lossy(), show_hidden))
            });

        for item in walker {
            let dent = match item {
                Ok(dent) => dent,
                Err(e) if e.depth() == 0 => return Err(WalkError::Scan(e)),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if entries.len() >= self.max_files {
                truncated = true;
                break;
            }

            if let Some(entry) = self.classify(&dent, show_hidden) {
                entries.push(entry);
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(WalkOutcome { entries, truncated })
    }

    fn classify(&self, dent: &DirEntry, show_hidden: bool) -> Option<Entry> {
        let path = dent.path();
        let name = dent.file_name().to_string_lossy().into_owned();
        let relative = to_slash(path.strip_prefix(&self.root).ok()?);
        let file_type = dent.file_type();

        if file_type.is_dir() {
            return Some(Entry::folder(relative, name, dir_size(path)));
        }

        if !show_hidden && AllowListFilter::is_hidden(&name) {
            return None;
        }

        if file_type.is_symlink() {
            let target = fs::read_link(path)
                .ok()
                .map(|t| t.to_string_lossy().into_owned());

            return match fs::metadata(path) {
                Ok(meta) if meta.is_dir() => {
                    if self.filter.is_excluded_dir(&name) {
                        None
                    } else {
                        Some(Entry::folder(relative, name, 0).with_symlink(target))
                    }
                }
                Ok(meta) => self
                    .filter
                    .is_visible(path)
                    .then(|| Entry::file(relative, name, meta.len()).with_symlink(target)),
                Err(_) => self
                    .filter
                    .is_visible(path)
                    .then(|| Entry::file(relative, name, 0).with_symlink(target).broken()),
            };
        }

        if !file_type.is_file() || !self.filter.is_visible(path) {
            return None;
        }

        let size = dent.metadata().map(|m| m.len()).unwrap_or(0);
        Some(Entry::file(relative, name, size))
    }
}

/// Total size of the regular files below `path`, without following links.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}
