//! Allow-list filtering.
//!
//! Decides which files are visible and editable, which are transferred as
//! binary, which directories are never descended into and which paths are
//! protected against deletion and renaming.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::config::FilterConfig;

/// Fallback MIME type for binary content.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Fallback MIME type for text content.
pub const PLAIN_TEXT: &str = "text/plain;charset=utf-8";

/// Immutable allow-list built from [`FilterConfig`].
#[derive(Debug, Clone)]
pub struct AllowListFilter {
    root: PathBuf,
    allowed_extensions: HashSet<String>,
    binary_extensions: HashSet<String>,
    allowed_filenames: HashSet<String>,
    excluded_dirs: HashSet<String>,
    protected_paths: HashSet<String>,
    always_visible_dirs: HashSet<String>,
}

fn lowercase_set(items: &[String]) -> HashSet<String> {
    items.iter().map(|s| s.to_ascii_lowercase()).collect()
}

fn exact_set(items: &[String]) -> HashSet<String> {
    items.iter().cloned().collect()
}

impl AllowListFilter {
    /// Build a filter for paths below `root`.
    pub fn new(config: &FilterConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            allowed_extensions: lowercase_set(&config.allowed_extensions),
            binary_extensions: lowercase_set(&config.binary_extensions),
            allowed_filenames: exact_set(&config.allowed_filenames),
            excluded_dirs: exact_set(&config.excluded_dirs),
            protected_paths: config
                .protected_paths
                .iter()
                .map(|p| p.trim_matches('/').to_string())
                .collect(),
            always_visible_dirs: exact_set(&config.always_visible_dirs),
        }
    }

    /// Whether a file may be listed, read or written.
    ///
    /// True under an always-visible directory, for an allowed extension, or
    /// for an allowed bare filename.
    pub fn is_visible(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        let under_visible_dir = relative.components().any(|c| match c {
            Component::Normal(part) => part
                .to_str()
                .is_some_and(|name| self.always_visible_dirs.contains(name)),
            _ => false,
        });
        if under_visible_dir {
            return true;
        }

        if let Some(ext) = extension_of(path) {
            if self.allowed_extensions.contains(&ext) {
                return true;
            }
        }

        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.allowed_filenames.contains(name))
    }

    /// Whether a file's content is transferred as base64.
    pub fn is_binary(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.binary_extensions.contains(&ext))
    }

    /// Whether a directory name is never descended into.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }

    /// Whether a root-relative path is protected against delete and rename.
    pub fn is_protected(&self, relative: &str) -> bool {
        let trimmed = relative.trim_matches('/');
        if trimmed.is_empty() {
            return false;
        }
        if self.protected_paths.contains(trimmed) {
            return true;
        }
        trimmed
            .split('/')
            .next()
            .is_some_and(|first| self.protected_paths.contains(first))
    }

    /// Whether a name is hidden (dot-prefixed).
    pub fn is_hidden(name: &str) -> bool {
        name.starts_with('.')
    }

    /// Whether a directory should be skipped by recursive scans.
    pub fn prunes_dir(&self, name: &str, show_hidden: bool) -> bool {
        self.is_excluded_dir(name) || (!show_hidden && Self::is_hidden(name))
    }

    /// MIME type for a file, falling back on its binary classification.
    pub fn mime_type(&self, path: &Path) -> &'static str {
        match extension_of(path).as_deref().and_then(known_mime_type) {
            Some(mime) => mime,
            None if self.is_binary(path) => OCTET_STREAM,
            None => PLAIN_TEXT,
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn known_mime_type(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "yaml" | "yml" => "application/yaml",
        "json" => "application/json",
        "js" => "text/javascript",
        "css" => "text/css",
        "html" => "text/html",
        "txt" | "log" | "conf" | "cfg" | "ini" => "text/plain",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "py" => "text/x-python",
        "sh" => "application/x-sh",
        "svg" => "image/svg+xml",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> AllowListFilter {
        AllowListFilter::new(&FilterConfig::default(), "/srv/config")
    }

    #[test]
    fn test_visible_by_extension() {
        let filter = filter();
        assert!(filter.is_visible(Path::new("/srv/config/automations.yaml")));
        assert!(filter.is_visible(Path::new("/srv/config/www/logo.PNG")));
        assert!(!filter.is_visible(Path::new("/srv/config/binary.exe")));
        assert!(!filter.is_visible(Path::new("/srv/config/Makefile")));
    }

    #[test]
    fn test_visible_by_filename() {
        let filter = filter();
        assert!(filter.is_visible(Path::new("/srv/config/.gitignore")));
        assert!(filter.is_visible(Path::new("/srv/config/.ha_run.lock")));
        assert!(!filter.is_visible(Path::new("/srv/config/.env")));
    }

    #[test]
    fn test_always_visible_subtree() {
        let filter = filter();
        assert!(filter.is_visible(Path::new("/srv/config/.storage/core.entity_registry")));
        assert!(filter.is_visible(Path::new("/srv/config/.storage/nested/anything")));
    }

    #[test]
    fn test_always_visible_ignores_root_components() {
        let filter = AllowListFilter::new(&FilterConfig::default(), "/data/.storage/root");
        assert!(!filter.is_visible(Path::new("/data/.storage/root/noext")));
    }

    #[test]
    fn test_binary_classification() {
        let filter = filter();
        assert!(filter.is_binary(Path::new("image.jpg")));
        assert!(filter.is_binary(Path::new("backup.TAR")));
        assert!(!filter.is_binary(Path::new("config.yaml")));
        assert!(!filter.is_binary(Path::new("no_extension")));
    }

    #[test]
    fn test_protected_paths() {
        let filter = filter();
        assert!(filter.is_protected("configuration.yaml"));
        assert!(filter.is_protected("/secrets.yaml"));
        assert!(filter.is_protected(".storage"));
        assert!(filter.is_protected(".storage/core.config"));
        assert!(!filter.is_protected("automations.yaml"));
        assert!(!filter.is_protected("packages/secrets.yaml"));
        assert!(!filter.is_protected(""));
    }

    #[test]
    fn test_excluded_and_hidden_dirs() {
        let filter = filter();
        assert!(filter.is_excluded_dir("__pycache__"));
        assert!(filter.is_excluded_dir(".git"));
        assert!(!filter.is_excluded_dir("packages"));

        assert!(filter.prunes_dir(".git", true));
        assert!(filter.prunes_dir(".hidden", false));
        assert!(!filter.prunes_dir(".hidden", true));
        assert!(!filter.prunes_dir("packages", false));
    }

    #[test]
    fn test_mime_type() {
        let filter = filter();
        assert_eq!(filter.mime_type(Path::new("a.png")), "image/png");
        assert_eq!(filter.mime_type(Path::new("a.json")), "application/json");
        assert_eq!(filter.mime_type(Path::new("a.ota")), OCTET_STREAM);
        assert_eq!(filter.mime_type(Path::new("a.j2")), PLAIN_TEXT);
    }

    #[test]
    fn test_custom_sets() {
        let config = FilterConfig {
            allowed_extensions: vec!["RS".to_string()],
            binary_extensions: Vec::new(),
            allowed_filenames: vec!["Cargo.lock".to_string()],
            excluded_dirs: vec!["target".to_string()],
            protected_paths: vec!["/Cargo.toml".to_string()],
            always_visible_dirs: Vec::new(),
        };
        let filter = AllowListFilter::new(&config, "/work");

        assert!(filter.is_visible(Path::new("/work/src/lib.rs")));
        assert!(filter.is_visible(Path::new("/work/Cargo.lock")));
        assert!(!filter.is_visible(Path::new("/work/config.yaml")));
        assert!(filter.is_protected("Cargo.toml"));
    }
}
