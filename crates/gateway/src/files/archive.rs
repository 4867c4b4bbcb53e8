//! Zip archives of sandbox content.
//!
//! Builds in-memory archives of a folder or of an arbitrary set of paths,
//! applying the same hidden, excluded-directory and allow-list rules as the
//! tree index. Also extracts uploaded archives into a folder.

use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::filter::AllowListFilter;
use super::resolver::{to_slash, PathResolver};
use crate::error::GatewayResult;

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// In-memory zip that keeps only the first entry written under each name.
struct Writer {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    written: HashSet<String>,
}

impl Writer {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            written: HashSet::new(),
        }
    }

    fn add_file(&mut self, path: &Path, name: &str) -> GatewayResult<()> {
        if self.written.contains(name) {
            debug!(name, path = %path.display(), "Skipping duplicate archive entry");
            return Ok(());
        }

        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unreadable file");
                return Ok(());
            }
        };

        self.zip.start_file(name, file_options())?;
        self.zip.write_all(&content)?;
        self.written.insert(name.to_string());
        Ok(())
    }

    fn finish(self) -> GatewayResult<Vec<u8>> {
        Ok(self.zip.finish()?.into_inner())
    }
}

/// Packages sandbox files into zip archives.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    filter: Arc<AllowListFilter>,
}

impl ArchiveBuilder {
    /// Create a builder sharing the gateway's filter.
    pub fn new(filter: Arc<AllowListFilter>) -> Self {
        Self { filter }
    }

    /// Archive every qualifying file below `dir`, named relative to `dir`.
    pub fn build_folder_archive(&self, dir: &Path) -> GatewayResult<Vec<u8>> {
        let mut zip = Writer::new();
        self.add_tree(&mut zip, dir, dir)?;
        zip.finish()
    }

    /// Archive several files and folders.
    ///
    /// Each item is named relative to its own parent, so sibling folders keep
    /// their top-level names. When two items map to the same entry name the
    /// first one wins.
    pub fn build_multi_archive(&self, paths: &[PathBuf]) -> GatewayResult<Vec<u8>> {
        let mut zip = Writer::new();

        for path in paths {
            let base = path.parent().unwrap_or(path);
            let Ok(metadata) = fs::metadata(path) else {
                debug!(path = %path.display(), "Skipping missing archive item");
                continue;
            };

            if metadata.is_dir() {
                self.add_tree(&mut zip, path, base)?;
            } else if metadata.is_file() && self.filter.is_visible(path) {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                zip.add_file(path, &name)?;
            }
        }

        zip.finish()
    }

    fn add_tree(&self, zip: &mut Writer, dir: &Path, base: &Path) -> GatewayResult<()> {
        let files = WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(e.file_type().is_dir()
                        && self
                            .filter
                            .prunes_dir(&e.file_name().to_string_lossy(), false))
            })
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file());

        for dent in files {
            if AllowListFilter::is_hidden(&dent.file_name().to_string_lossy())
                || !self.filter.is_visible(dent.path())
            {
                continue;
            }
            let Ok(relative) = dent.path().strip_prefix(base) else {
                continue;
            };
            zip.add_file(dent.path(), &to_slash(relative))?;
        }

        Ok(())
    }

    /// Extract the visible files of a zip archive into `dest`.
    ///
    /// Entries that would land outside `dest` or outside the sandbox are
    /// skipped. Returns the number of files written.
    pub fn extract_archive(
        &self,
        bytes: &[u8],
        dest: &Path,
        resolver: &PathResolver,
    ) -> GatewayResult<usize> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut extracted = 0;

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }

            let Some(inner) = file.enclosed_name() else {
                debug!(name = %file.name(), "Skipping archive entry outside destination");
                continue;
            };
            let candidate = dest.join(inner);
            if !self.filter.is_visible(&candidate) {
                debug!(name = %file.name(), "Skipping filtered archive entry");
                continue;
            }

            let Some(target) = resolver
                .relative(&candidate)
                .and_then(|rel| resolver.resolve(&rel).ok())
            else {
                continue;
            };

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            fs::write(&target, content)?;
            extracted += 1;
        }

        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathResolver, ArchiveBuilder) {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        let filter = Arc::new(AllowListFilter::new(
            &FilterConfig::default(),
            resolver.root(),
        ));
        (dir, resolver, ArchiveBuilder::new(filter))
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    #[test]
    fn test_folder_archive_applies_filters() {
        let (_dir, resolver, builder) = setup();
        let root = resolver.root();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::create_dir_all(root.join("pkg/__pycache__")).unwrap();
        fs::write(root.join("pkg/a.yaml"), "a").unwrap();
        fs::write(root.join("pkg/sub/b.json"), "{}").unwrap();
        fs::write(root.join("pkg/.hidden.yaml"), "h").unwrap();
        fs::write(root.join("pkg/tool.exe"), "x").unwrap();
        fs::write(root.join("pkg/__pycache__/c.py"), "").unwrap();

        let bytes = builder.build_folder_archive(&root.join("pkg")).unwrap();

        assert_eq!(entry_names(&bytes), vec!["a.yaml", "sub/b.json"]);
    }

    #[test]
    fn test_multi_archive_names_relative_to_parent() {
        let (_dir, resolver, builder) = setup();
        let root = resolver.root();
        fs::create_dir_all(root.join("one")).unwrap();
        fs::create_dir_all(root.join("two")).unwrap();
        fs::write(root.join("one/x.yaml"), "x").unwrap();
        fs::write(root.join("two/x.yaml"), "y").unwrap();
        fs::write(root.join("top.yaml"), "t").unwrap();

        let bytes = builder
            .build_multi_archive(&[
                root.join("one"),
                root.join("two"),
                root.join("top.yaml"),
                root.join("missing.yaml"),
            ])
            .unwrap();

        assert_eq!(entry_names(&bytes), vec!["one/x.yaml", "top.yaml", "two/x.yaml"]);
    }

    #[test]
    fn test_multi_archive_skips_duplicate_names() {
        let (_dir, resolver, builder) = setup();
        let root = resolver.root();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("a/x.yaml"), "from a").unwrap();
        fs::write(root.join("b/x.yaml"), "from b").unwrap();

        let bytes = builder
            .build_multi_archive(&[root.join("a/x.yaml"), root.join("b/x.yaml")])
            .unwrap();
        assert_eq!(entry_names(&bytes), vec!["x.yaml"]);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name("x.yaml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "from a");
    }

    #[test]
    fn test_multi_archive_same_folder_twice() {
        let (_dir, resolver, builder) = setup();
        let root = resolver.root();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/x.yaml"), "x").unwrap();

        let bytes = builder
            .build_multi_archive(&[root.join("a"), root.join("a")])
            .unwrap();

        assert_eq!(entry_names(&bytes), vec!["a/x.yaml"]);
    }

    #[test]
    fn test_archive_content_roundtrip() {
        let (_dir, resolver, builder) = setup();
        let root = resolver.root();
        fs::create_dir(root.join("docs")).unwrap();
        fs::write(root.join("docs/readme.md"), "hello archive").unwrap();

        let bytes = builder.build_folder_archive(&root.join("docs")).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name("readme.md").unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();

        assert_eq!(content, "hello archive");
    }

    #[test]
    fn test_extract_skips_unsafe_and_filtered_entries() {
        let (_dir, resolver, builder) = setup();
        let dest = resolver.root().join("upload");
        fs::create_dir(&dest).unwrap();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in [
            ("ok.yaml", "ok"),
            ("nested/inner.json", "{}"),
            ("../escape.yaml", "bad"),
            ("program.exe", "bad"),
        ] {
            zip.start_file(name, file_options()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();

        let count = builder.extract_archive(&bytes, &dest, &resolver).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(dest.join("ok.yaml")).unwrap(), "ok");
        assert!(dest.join("nested/inner.json").exists());
        assert!(!resolver.root().join("escape.yaml").exists());
        assert!(!dest.join("program.exe").exists());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let (_dir, resolver, builder) = setup();
        let result = builder.extract_archive(b"not a zip", resolver.root(), &resolver);
        assert!(result.is_err());
    }
}
