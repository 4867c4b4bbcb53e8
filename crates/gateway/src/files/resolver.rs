//! Sandbox path resolution.
//!
//! Every client-supplied path is resolved here before the filesystem is
//! touched. Resolution canonicalizes the path (following symlinks) and
//! rejects anything that does not end up at or below the sandbox root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::{GatewayError, GatewayResult};

/// Resolves relative request paths against a fixed sandbox root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Canonical sandbox root.
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> GatewayResult<Self> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|e| GatewayError::from_io(e, root))?;

        if !canonical.is_dir() {
            return Err(GatewayError::NotADirectory(root.display().to_string()));
        }

        Ok(Self { root: canonical })
    }

    /// The canonical sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` to an absolute path inside the sandbox.
    ///
    /// A leading separator is ignored and the empty string names the root.
    /// Paths that do not exist yet are resolved through their longest
    /// existing ancestor, so targets of create operations are checked too.
    pub fn resolve(&self, relative: &str) -> GatewayResult<PathBuf> {
        if relative.contains('\0') {
            warn!(path = %relative.escape_debug(), "Rejected path containing NUL");
            return Err(GatewayError::PathDenied(relative.escape_debug().to_string()));
        }

        let trimmed = relative.trim_start_matches('/');
        let candidate = Path::new(trimmed);

        if candidate
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        {
            warn!(path = %relative, "Rejected absolute path");
            return Err(GatewayError::PathDenied(relative.to_string()));
        }

        let resolved = canonicalize_lenient(&self.root.join(candidate))
            .map_err(|e| GatewayError::from_io(e, candidate))?;

        if !resolved.starts_with(&self.root) {
            warn!(path = %relative, resolved = %resolved.display(), "Blocked path outside sandbox");
            return Err(GatewayError::PathDenied(relative.to_string()));
        }

        Ok(resolved)
    }

    /// Path of `absolute` relative to the root, `/`-separated.
    ///
    /// Returns `None` for paths outside the sandbox; the root itself maps to
    /// the empty string.
    pub fn relative(&self, absolute: &Path) -> Option<String> {
        let stripped = absolute.strip_prefix(&self.root).ok()?;
        Some(to_slash(stripped))
    }
}

/// Join the normal components of `path` with `/`.
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Canonicalize `path`, tolerating a missing tail.
///
/// The longest ancestor that can be canonicalized is resolved by the OS and
/// the remaining components are applied lexically.
fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let first_error = match fs::canonicalize(path) {
        Ok(canonical) => return Ok(canonical),
        Err(e) => e,
    };

    let components: Vec<Component<'_>> = path.components().collect();

    for split in (1..components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        let Ok(mut resolved) = fs::canonicalize(&prefix) else {
            continue;
        };

        for component in &components[split..] {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => resolved.push(part),
                Component::Prefix(_) | Component::RootDir => {}
            }
        }

        return Ok(resolved);
    }

    Err(first_error)
}
