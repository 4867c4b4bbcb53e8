//! Single-level directory listing.
//!
//! Lists only the immediate children of one directory so a client can
//! expand the tree incrementally. Folders carry a cheap child count instead
//! of a recursive size.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use protocol::messages::DirectoryListing;
use protocol::Entry;
use tracing::debug;

use super::filter::AllowListFilter;
use super::resolver::PathResolver;
use crate::error::GatewayResult;

/// Lists one directory level at a time.
#[derive(Debug, Clone)]
pub struct LazyLister {
    resolver: Arc<PathResolver>,
    filter: Arc<AllowListFilter>,
}

impl LazyLister {
    /// Create a lister sharing the gateway's resolver and filter.
    pub fn new(resolver: Arc<PathResolver>, filter: Arc<AllowListFilter>) -> Self {
        Self { resolver, filter }
    }

    /// List the direct children of `path` (empty for the root).
    ///
    /// Escaping paths fail with `PathDenied`. A missing directory or a path
    /// that is not a directory yields a listing with `error` set.
    pub fn list(&self, path: &str, show_hidden: bool) -> GatewayResult<DirectoryListing> {
        let dir = self.resolver.resolve(path)?;

        let metadata = match fs::metadata(&dir) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(DirectoryListing::failed(path, "Directory not found"));
            }
            Err(e) => return Ok(DirectoryListing::failed(path, e.to_string())),
        };
        if !metadata.is_dir() {
            return Ok(DirectoryListing::failed(path, "Not a directory"));
        }

        let reader = match fs::read_dir(&dir) {
            Ok(reader) => reader,
            Err(e) => return Ok(DirectoryListing::failed(path, e.to_string())),
        };

        let base = self.resolver.relative(&dir).unwrap_or_default();
        let mut folders = Vec::new();
        let mut files = Vec::new();

        for child in reader {
            let child = match child {
                Ok(c) => c,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            let name = child.file_name().to_string_lossy().into_owned();
            if !show_hidden && AllowListFilter::is_hidden(&name) {
                continue;
            }

            let relative = if base.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", base, name)
            };

            match self.describe(&child.path(), relative, name) {
                Some(entry) if entry.is_folder() => folders.push(entry),
                Some(entry) => files.push(entry),
                None => {}
            }
        }

        folders.sort_by_key(|e| e.name.to_lowercase());
        files.sort_by_key(|e| e.name.to_lowercase());

        Ok(DirectoryListing {
            path: path.to_string(),
            folders,
            files,
            error: None,
        })
    }

    fn describe(&self, path: &Path, relative: String, name: String) -> Option<Entry> {
        let link_meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping entry");
                return None;
            }
        };
        let is_symlink = link_meta.file_type().is_symlink();
        let target = if is_symlink {
            fs::read_link(path)
                .ok()
                .map(|t| t.to_string_lossy().into_owned())
        } else {
            None
        };

        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(_) if is_symlink => {
                return Some(Entry::file(relative, name, 0).with_symlink(target).broken());
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping entry");
                return None;
            }
        };

        let entry = if metadata.is_dir() {
            if self.filter.is_excluded_dir(&name) {
                return None;
            }
            let children = fs::read_dir(path).map(|it| it.count()).unwrap_or(0);
            Entry::folder(relative, name, 0).with_child_count(children as u64)
        } else if metadata.is_file() {
            if !is_symlink && !self.filter.is_visible(path) {
                return None;
            }
            Entry::file(relative, name, metadata.len())
        } else {
            return None;
        };

        Some(if is_symlink {
            entry.with_symlink(target)
        } else {
            entry
        })
    }
}
