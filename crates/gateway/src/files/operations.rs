//! Single-item file operations.
//!
//! Every operation resolves its paths through the sandbox resolver first.
//! Reads and writes additionally require the allow-list; delete and rename
//! refuse the sandbox root and protected paths. Writes go through a
//! temporary sibling file and an atomic rename.

use std::fs::{self, Metadata, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use protocol::messages::{FileContent, FileStat, FileWritten};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::archive::ArchiveBuilder;
use super::filter::{AllowListFilter, OCTET_STREAM};
use super::resolver::PathResolver;
use crate::error::{GatewayError, GatewayResult};

/// Write `content` to `path` through a temporary sibling and a rename.
///
/// Permissions of an existing file are carried over.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    if let Ok(existing) = fs::metadata(path) {
        fs::set_permissions(temp.path(), existing.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Modification time in seconds since the Unix epoch.
pub fn mtime_secs(metadata: &Metadata) -> f64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn decode_content(content: &str, is_base64: bool) -> GatewayResult<Vec<u8>> {
    if is_base64 {
        BASE64
            .decode(content.trim())
            .map_err(|e| GatewayError::InvalidRequest(format!("invalid base64 content: {}", e)))
    } else {
        Ok(content.as_bytes().to_vec())
    }
}

/// File operations bound to one sandbox.
#[derive(Debug, Clone)]
pub struct FileOperations {
    resolver: Arc<PathResolver>,
    filter: Arc<AllowListFilter>,
}

impl FileOperations {
    /// Create operations sharing the gateway's resolver and filter.
    pub fn new(resolver: Arc<PathResolver>, filter: Arc<AllowListFilter>) -> Self {
        Self { resolver, filter }
    }

    fn relative(&self, path: &Path) -> String {
        self.resolver.relative(path).unwrap_or_default()
    }

    /// Resolve a path that must name a file the allow-list accepts.
    fn resolve_visible(&self, path: &str) -> GatewayResult<PathBuf> {
        let resolved = self.resolver.resolve(path)?;
        if !self.filter.is_visible(&resolved) {
            warn!(path = %path, "Blocked file outside allow-list");
            return Err(GatewayError::PathDenied(path.to_string()));
        }
        Ok(resolved)
    }

    /// Resolve an existing, visible regular file.
    fn resolve_existing_file(&self, path: &str) -> GatewayResult<(PathBuf, Metadata)> {
        let resolved = self.resolve_visible(path)?;
        let metadata = fs::metadata(&resolved).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;
        if metadata.is_dir() {
            return Err(GatewayError::InvalidRequest(format!("{} is a directory", path)));
        }
        Ok((resolved, metadata))
    }

    /// Resolve a path that may be deleted or renamed.
    fn resolve_mutable(&self, path: &str) -> GatewayResult<PathBuf> {
        let resolved = self.resolver.resolve(path)?;
        if resolved == self.resolver.root() {
            warn!(path = %path, "Refused to modify the sandbox root");
            return Err(GatewayError::PathDenied(path.to_string()));
        }
        if self.filter.is_protected(&self.relative(&resolved)) {
            warn!(path = %path, "Refused to modify a protected path");
            return Err(GatewayError::Protected(path.to_string()));
        }
        Ok(resolved)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read a file for editing or preview.
    ///
    /// Binary-classified and non-UTF-8 files are returned base64-encoded.
    pub fn read_file(&self, path: &str) -> GatewayResult<FileContent> {
        let (resolved, metadata) = self.resolve_existing_file(path)?;
        let mut bytes = fs::read(&resolved).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;
        let mtime = mtime_secs(&metadata);

        let mime_type = if self.filter.is_binary(&resolved) {
            self.filter.mime_type(&resolved)
        } else {
            match String::from_utf8(bytes) {
                Ok(text) => {
                    return Ok(FileContent {
                        content: text,
                        is_base64: false,
                        mime_type: self.filter.mime_type(&resolved).to_string(),
                        mtime,
                    });
                }
                Err(e) => {
                    debug!(path = %path, "Text file is not UTF-8, sending base64");
                    bytes = e.into_bytes();
                    OCTET_STREAM
                }
            }
        };

        Ok(FileContent {
            content: BASE64.encode(&bytes),
            is_base64: true,
            mime_type: mime_type.to_string(),
            mtime,
        })
    }

    /// Raw bytes and MIME type of a file.
    pub fn serve_file(&self, path: &str) -> GatewayResult<(Vec<u8>, &'static str)> {
        let (resolved, _) = self.resolve_existing_file(path)?;
        let bytes = fs::read(&resolved).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;
        Ok((bytes, self.filter.mime_type(&resolved)))
    }

    /// Size and modification time of a file.
    pub fn stat_file(&self, path: &str) -> GatewayResult<FileStat> {
        let (_, metadata) = self.resolve_existing_file(path)?;
        Ok(FileStat {
            success: true,
            mtime: mtime_secs(&metadata),
            size: metadata.len(),
        })
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Replace a file's content atomically, creating it when missing.
    pub fn write_file(&self, path: &str, content: &str) -> GatewayResult<FileWritten> {
        let resolved = self.resolve_visible(path)?;
        if resolved.is_dir() {
            return Err(GatewayError::InvalidRequest(format!("{} is a directory", path)));
        }

        write_atomic(&resolved, content.as_bytes())
            .map_err(|e| GatewayError::from_io(e, Path::new(path)))?;
        let metadata = fs::metadata(&resolved)?;

        info!(path = %self.relative(&resolved), bytes = content.len(), "File written");
        Ok(FileWritten {
            success: true,
            mtime: mtime_secs(&metadata),
        })
    }

    /// Create a new file, creating missing parent folders.
    pub fn create_file(&self, path: &str, content: &str, is_base64: bool) -> GatewayResult<String> {
        let resolved = self.resolve_visible(path)?;
        let bytes = decode_content(content, is_base64)?;

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&resolved)
            .map_err(|e| GatewayError::from_io(e, Path::new(path)))?;
        file.write_all(&bytes)?;

        let relative = self.relative(&resolved);
        info!(path = %relative, "File created");
        Ok(relative)
    }

    /// Create a new folder (and any missing parents).
    pub fn create_folder(&self, path: &str) -> GatewayResult<String> {
        let resolved = self.resolver.resolve(path)?;
        if resolved.exists() {
            return Err(GatewayError::AlreadyExists(path.to_string()));
        }

        fs::create_dir_all(&resolved).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;

        let relative = self.relative(&resolved);
        info!(path = %relative, "Folder created");
        Ok(relative)
    }

    /// Upload a file, replacing an existing one only with `overwrite`.
    pub fn upload_file(
        &self,
        path: &str,
        content: &str,
        overwrite: bool,
        is_base64: bool,
    ) -> GatewayResult<String> {
        let resolved = self.resolve_visible(path)?;
        if resolved.exists() && !overwrite {
            return Err(GatewayError::AlreadyExists(path.to_string()));
        }
        if resolved.is_dir() {
            return Err(GatewayError::InvalidRequest(format!("{} is a directory", path)));
        }

        let bytes = decode_content(content, is_base64)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;
        }
        write_atomic(&resolved, &bytes).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;

        let relative = self.relative(&resolved);
        info!(path = %relative, bytes = bytes.len(), "File uploaded");
        Ok(relative)
    }

    /// Extract a base64 zip archive into a folder, creating it if needed.
    pub fn upload_folder(
        &self,
        path: &str,
        zip_data: &str,
        archives: &ArchiveBuilder,
    ) -> GatewayResult<usize> {
        let resolved = self.resolver.resolve(path)?;
        let bytes = decode_content(zip_data, true)?;

        fs::create_dir_all(&resolved).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;
        let extracted = archives.extract_archive(&bytes, &resolved, &self.resolver)?;

        info!(path = %self.relative(&resolved), files = extracted, "Folder uploaded");
        Ok(extracted)
    }

    // ========================================================================
    // Delete, copy, move
    // ========================================================================

    /// Delete a file or folder.
    pub fn delete(&self, path: &str) -> GatewayResult<()> {
        let resolved = self.resolve_mutable(path)?;
        let metadata =
            fs::symlink_metadata(&resolved).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;

        if metadata.is_dir() {
            fs::remove_dir_all(&resolved)
        } else {
            fs::remove_file(&resolved)
        }
        .map_err(|e| GatewayError::from_io(e, Path::new(path)))?;

        info!(path = %self.relative(&resolved), "Deleted");
        Ok(())
    }

    /// Delete several items, skipping any that fail. Returns the count deleted.
    pub fn delete_many(&self, paths: &[String]) -> usize {
        paths
            .iter()
            .filter(|path| match self.delete(path) {
                Ok(()) => true,
                Err(e) => {
                    warn!(path = %path, error = %e, "Skipping item during bulk delete");
                    false
                }
            })
            .count()
    }

    /// Copy a file or folder to a new path.
    pub fn copy(&self, source: &str, destination: &str) -> GatewayResult<String> {
        let from = self.resolver.resolve(source)?;
        let to = self.resolver.resolve(destination)?;

        let metadata = fs::metadata(&from).map_err(|e| GatewayError::from_io(e, Path::new(source)))?;
        if to.exists() {
            return Err(GatewayError::AlreadyExists(destination.to_string()));
        }

        if metadata.is_dir() {
            if to.starts_with(&from) {
                return Err(GatewayError::InvalidRequest(
                    "cannot copy a folder into itself".to_string(),
                ));
            }
            copy_tree(&from, &to).map_err(|e| GatewayError::from_io(e, Path::new(destination)))?;
        } else {
            if !self.filter.is_visible(&from) || !self.filter.is_visible(&to) {
                warn!(source = %source, destination = %destination, "Blocked copy outside allow-list");
                return Err(GatewayError::PathDenied(destination.to_string()));
            }
            fs::copy(&from, &to).map_err(|e| GatewayError::from_io(e, Path::new(destination)))?;
        }

        let relative = self.relative(&to);
        info!(source = %self.relative(&from), destination = %relative, "Copied");
        Ok(relative)
    }

    /// Rename a file or folder.
    pub fn rename(&self, source: &str, destination: &str) -> GatewayResult<String> {
        let from = self.resolve_mutable(source)?;
        let to = self.resolver.resolve(destination)?;

        let metadata =
            fs::symlink_metadata(&from).map_err(|e| GatewayError::from_io(e, Path::new(source)))?;
        if to.exists() {
            return Err(GatewayError::AlreadyExists(destination.to_string()));
        }
        if to == self.resolver.root() {
            return Err(GatewayError::PathDenied(destination.to_string()));
        }
        if metadata.is_dir() && to.starts_with(&from) {
            return Err(GatewayError::InvalidRequest(
                "cannot move a folder into itself".to_string(),
            ));
        }
        if !metadata.is_dir() && !self.filter.is_visible(&to) {
            warn!(destination = %destination, "Blocked rename outside allow-list");
            return Err(GatewayError::PathDenied(destination.to_string()));
        }

        fs::rename(&from, &to).map_err(|e| GatewayError::from_io(e, Path::new(destination)))?;

        let relative = self.relative(&to);
        info!(source = %self.relative(&from), destination = %relative, "Renamed");
        Ok(relative)
    }

    /// Move several items into an existing folder.
    ///
    /// Protected items and name collisions are skipped. Returns the count
    /// moved.
    pub fn move_many(&self, paths: &[String], destination: &str) -> GatewayResult<usize> {
        let target_dir = self.resolver.resolve(destination)?;
        let metadata =
            fs::metadata(&target_dir).map_err(|e| GatewayError::from_io(e, Path::new(destination)))?;
        if !metadata.is_dir() {
            return Err(GatewayError::NotADirectory(destination.to_string()));
        }

        let mut moved = 0;
        for path in paths {
            match self.move_into(path, &target_dir) {
                Ok(()) => moved += 1,
                Err(e) => warn!(path = %path, error = %e, "Skipping item during bulk move"),
            }
        }

        info!(destination = %self.relative(&target_dir), moved, "Moved items");
        Ok(moved)
    }

    fn move_into(&self, path: &str, target_dir: &Path) -> GatewayResult<()> {
        let from = self.resolve_mutable(path)?;
        let name = from
            .file_name()
            .ok_or_else(|| GatewayError::InvalidRequest(format!("{} has no name", path)))?;
        let to = target_dir.join(name);

        if !from.exists() && fs::symlink_metadata(&from).is_err() {
            return Err(GatewayError::NotFound(path.to_string()));
        }
        if to.exists() {
            return Err(GatewayError::AlreadyExists(self.relative(&to)));
        }
        if target_dir.starts_with(&from) {
            return Err(GatewayError::InvalidRequest(
                "cannot move a folder into itself".to_string(),
            ));
        }

        fs::rename(&from, &to).map_err(|e| GatewayError::from_io(e, Path::new(path)))?;
        debug!(source = %self.relative(&from), destination = %self.relative(&to), "Moved");
        Ok(())
    }
}

/// Recursively copy a directory. Symbolic links are not copied.
fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    for dent in WalkDir::new(from).follow_links(false) {
        let dent = dent.map_err(io::Error::from)?;
        let Ok(relative) = dent.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);
        let file_type = dent.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(dent.path(), &target)?;
        } else {
            debug!(path = %dent.path().display(), "Skipping symlink during copy");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileOperations) {
        let dir = TempDir::new().unwrap();
        let resolver = Arc::new(PathResolver::new(dir.path()).unwrap());
        let filter = Arc::new(AllowListFilter::new(
            &FilterConfig::default(),
            resolver.root(),
        ));
        (dir, FileOperations::new(resolver, filter))
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.yaml");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        // No temporary files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.sh");
        fs::write(&path, "echo").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        write_atomic(&path, b"echo hi").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }

    #[test]
    fn test_read_text_and_binary() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("a.yaml"), "key: value").unwrap();
        fs::write(dir.path().join("img.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let text = ops.read_file("a.yaml").unwrap();
        assert!(!text.is_base64);
        assert_eq!(text.content, "key: value");
        assert_eq!(text.mime_type, "application/yaml");
        assert!(text.mtime > 0.0);

        let image = ops.read_file("img.png").unwrap();
        assert!(image.is_base64);
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(BASE64.decode(image.content).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_read_non_utf8_text_falls_back_to_base64() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("odd.txt"), b"\xff\xfe").unwrap();

        let content = ops.read_file("odd.txt").unwrap();
        assert!(content.is_base64);
        assert_eq!(content.mime_type, OCTET_STREAM);
    }

    #[test]
    fn test_read_denied_and_missing() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("tool.exe"), "MZ").unwrap();

        assert!(matches!(ops.read_file("tool.exe"), Err(GatewayError::PathDenied(_))));
        assert!(matches!(
            ops.read_file("../../etc/passwd"),
            Err(GatewayError::PathDenied(_))
        ));
        assert!(matches!(ops.read_file("missing.yaml"), Err(GatewayError::NotFound(_))));
    }

    #[test]
    fn test_stat_and_serve() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("notes.md"), "# hi").unwrap();

        let stat = ops.stat_file("notes.md").unwrap();
        assert_eq!(stat.size, 4);

        let (bytes, mime) = ops.serve_file("notes.md").unwrap();
        assert_eq!(bytes, b"# hi");
        assert_eq!(mime, "text/markdown");
    }

    #[test]
    fn test_write_file() {
        let (dir, ops) = setup();

        let written = ops.write_file("a.yaml", "one").unwrap();
        assert!(written.success);
        assert_eq!(fs::read_to_string(dir.path().join("a.yaml")).unwrap(), "one");

        ops.write_file("a.yaml", "two").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.yaml")).unwrap(), "two");

        assert!(matches!(
            ops.write_file("run.exe", "x"),
            Err(GatewayError::PathDenied(_))
        ));
    }

    #[test]
    fn test_create_file_no_overwrite() {
        let (dir, ops) = setup();

        assert_eq!(ops.create_file("x.yaml", "hi", false).unwrap(), "x.yaml");
        assert!(matches!(
            ops.create_file("x.yaml", "bye", false),
            Err(GatewayError::AlreadyExists(_))
        ));
        assert_eq!(fs::read_to_string(dir.path().join("x.yaml")).unwrap(), "hi");
    }

    #[test]
    fn test_create_file_base64_with_parents() {
        let (dir, ops) = setup();
        let encoded = BASE64.encode([1u8, 2, 3]);

        let path = ops.create_file("deep/nested/blob.bin", &encoded, true).unwrap();

        assert_eq!(path, "deep/nested/blob.bin");
        assert_eq!(fs::read(dir.path().join(&path)).unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            ops.create_file("bad.bin", "***", true),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_create_folder() {
        let (dir, ops) = setup();

        assert_eq!(ops.create_folder("/packages/lights").unwrap(), "packages/lights");
        assert!(dir.path().join("packages/lights").is_dir());
        assert!(matches!(
            ops.create_folder("packages"),
            Err(GatewayError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_delete_rules() {
        let (dir, ops) = setup();
        fs::create_dir_all(dir.path().join("folder/sub")).unwrap();
        fs::write(dir.path().join("folder/sub/a.yaml"), "").unwrap();
        fs::write(dir.path().join("secrets.yaml"), "").unwrap();

        ops.delete("folder").unwrap();
        assert!(!dir.path().join("folder").exists());

        assert!(matches!(ops.delete(""), Err(GatewayError::PathDenied(_))));
        assert!(matches!(ops.delete("secrets.yaml"), Err(GatewayError::Protected(_))));
        assert!(matches!(
            ops.delete("a/../secrets.yaml"),
            Err(GatewayError::Protected(_))
        ));
        assert!(matches!(ops.delete("gone.yaml"), Err(GatewayError::NotFound(_))));
    }

    #[test]
    fn test_delete_many_skips_failures() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("a.yaml"), "").unwrap();
        fs::write(dir.path().join("b.yaml"), "").unwrap();
        fs::write(dir.path().join("configuration.yaml"), "").unwrap();

        let deleted = ops.delete_many(&[
            "a.yaml".to_string(),
            "configuration.yaml".to_string(),
            "missing.yaml".to_string(),
            "b.yaml".to_string(),
        ]);

        assert_eq!(deleted, 2);
        assert!(dir.path().join("configuration.yaml").exists());
    }

    #[test]
    fn test_copy_file_and_folder() {
        let (dir, ops) = setup();
        fs::create_dir_all(dir.path().join("src/inner")).unwrap();
        fs::write(dir.path().join("src/inner/a.yaml"), "a").unwrap();
        fs::write(dir.path().join("one.yaml"), "1").unwrap();

        assert_eq!(ops.copy("one.yaml", "two.yaml").unwrap(), "two.yaml");
        assert_eq!(fs::read_to_string(dir.path().join("two.yaml")).unwrap(), "1");

        ops.copy("src", "dst").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("dst/inner/a.yaml")).unwrap(), "a");

        assert!(matches!(
            ops.copy("one.yaml", "two.yaml"),
            Err(GatewayError::AlreadyExists(_))
        ));
        assert!(matches!(
            ops.copy("src", "src/inner/copy"),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_rename_rules() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("old.yaml"), "x").unwrap();
        fs::write(dir.path().join("secrets.yaml"), "s").unwrap();

        assert_eq!(ops.rename("old.yaml", "new.yaml").unwrap(), "new.yaml");
        assert!(dir.path().join("new.yaml").exists());
        assert!(!dir.path().join("old.yaml").exists());

        assert!(matches!(
            ops.rename("secrets.yaml", "public.yaml"),
            Err(GatewayError::Protected(_))
        ));
        assert!(matches!(
            ops.rename("new.yaml", "new.exe"),
            Err(GatewayError::PathDenied(_))
        ));
    }

    #[test]
    fn test_move_many() {
        let (dir, ops) = setup();
        fs::create_dir(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("a.yaml"), "a").unwrap();
        fs::write(dir.path().join("b.yaml"), "b").unwrap();
        fs::write(dir.path().join("target/b.yaml"), "existing").unwrap();
        fs::write(dir.path().join("secrets.yaml"), "s").unwrap();

        let moved = ops
            .move_many(
                &[
                    "a.yaml".to_string(),
                    "b.yaml".to_string(),
                    "secrets.yaml".to_string(),
                ],
                "target",
            )
            .unwrap();

        assert_eq!(moved, 1);
        assert!(dir.path().join("target/a.yaml").exists());
        assert!(dir.path().join("b.yaml").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("target/b.yaml")).unwrap(),
            "existing"
        );

        assert!(matches!(
            ops.move_many(&["b.yaml".to_string()], "nowhere"),
            Err(GatewayError::NotFound(_))
        ));
    }

    #[test]
    fn test_upload_file_overwrite() {
        let (dir, ops) = setup();
        fs::write(dir.path().join("a.yaml"), "old").unwrap();

        assert!(matches!(
            ops.upload_file("a.yaml", "new", false, false),
            Err(GatewayError::AlreadyExists(_))
        ));
        ops.upload_file("a.yaml", "new", true, false).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.yaml")).unwrap(), "new");
    }
}
