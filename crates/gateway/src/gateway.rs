//! The filesystem gateway.
//!
//! `FileGateway` owns every component for one sandbox root and exposes the
//! request operations as async methods. Filesystem work runs on tokio's
//! blocking pool so slow storage never stalls the caller's executor.
//! Mutations invalidate the directory cache and then publish a
//! [`ChangeEvent`] on a broadcast channel.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use protocol::messages::{
    ArchiveData, ChangeAction, ChangeEvent, DirectoryListing, FileContent, FileStat, FileWritten,
    ReplaceSummary, SearchMatch,
};
use protocol::Entry;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{GatewayError, GatewayResult};
use crate::files::{
    AllowListFilter, ArchiveBuilder, DirectoryCache, FileOperations, LazyLister, PathResolver,
    ReplaceEngine, SearchEngine, SearchQuery, TreeWalker, WalkError,
};

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Archive name used when several paths are packaged together.
const MULTI_ARCHIVE_NAME: &str = "download.zip";

/// Components shared by every clone of a gateway.
struct GatewayCore {
    resolver: Arc<PathResolver>,
    cache: DirectoryCache,
    walker: TreeWalker,
    lister: LazyLister,
    search: SearchEngine,
    replace: ReplaceEngine,
    archives: ArchiveBuilder,
    ops: FileOperations,
}

impl GatewayCore {
    /// Root-relative form of a request path that already passed an operation.
    fn relative_path(&self, path: &str) -> String {
        self.resolver
            .resolve(path)
            .ok()
            .and_then(|resolved| self.resolver.relative(&resolved))
            .unwrap_or_else(|| path.trim_matches('/').to_string())
    }
}

/// Sandboxed filesystem gateway.
///
/// Cloning is cheap; clones share the cache and the change channel.
#[derive(Clone)]
pub struct FileGateway {
    core: Arc<GatewayCore>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl std::fmt::Debug for FileGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileGateway")
            .field("root", &self.core.resolver.root())
            .finish_non_exhaustive()
    }
}

impl FileGateway {
    /// Build a gateway from configuration.
    ///
    /// Fails when the configured root does not exist or is not a directory.
    pub fn new(config: &Config) -> GatewayResult<Self> {
        let resolver = Arc::new(PathResolver::new(&config.gateway.root)?);
        let root = resolver.root().to_path_buf();
        let filter = Arc::new(AllowListFilter::new(&config.filter, root.clone()));

        let core = GatewayCore {
            cache: DirectoryCache::new(Duration::from_secs(config.index.cache_ttl_secs)),
            walker: TreeWalker::new(root.clone(), Arc::clone(&filter), &config.index),
            lister: LazyLister::new(Arc::clone(&resolver), Arc::clone(&filter)),
            search: SearchEngine::new(root.clone(), Arc::clone(&filter), &config.search),
            replace: ReplaceEngine::new(root.clone(), Arc::clone(&filter), &config.search),
            archives: ArchiveBuilder::new(Arc::clone(&filter)),
            ops: FileOperations::new(Arc::clone(&resolver), filter),
            resolver,
        };
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        info!(root = %root.display(), "Gateway ready");
        Ok(Self {
            core: Arc::new(core),
            changes,
        })
    }

    /// Canonical sandbox root.
    pub fn root(&self) -> &Path {
        self.core.resolver.root()
    }

    /// Receive change notifications published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Invalidate the cache and publish a change event.
    fn notify(&self, action: ChangeAction, path: Option<String>) {
        self.core.cache.invalidate();

        let event = ChangeEvent {
            action,
            path,
            timestamp: now_millis(),
        };
        debug!(action = %event.action, path = ?event.path, "Publishing change");
        // No subscribers is fine.
        let _ = self.changes.send(event);
    }

    /// Run blocking filesystem work off the async executor.
    async fn offload<T, F>(&self, work: F) -> GatewayResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&GatewayCore) -> GatewayResult<T> + Send + 'static,
    {
        let core = Arc::clone(&self.core);
        tokio::task::spawn_blocking(move || work(&core)).await?
    }

    // ========================================================================
    // Listing
    // ========================================================================

    /// Recursive listing of the tree, served from the cache when fresh.
    pub async fn list_all(
        &self,
        show_hidden: bool,
        force_refresh: bool,
    ) -> GatewayResult<Arc<Vec<Entry>>> {
        self.offload(move |core| {
            Ok(core.cache.get_or_refresh(show_hidden, force_refresh, || {
                let outcome = core.walker.walk(show_hidden)?;
                if outcome.truncated {
                    warn!(
                        entries = outcome.entries.len(),
                        "Tree scan hit the file limit; listing is partial"
                    );
                }
                Ok::<_, WalkError>(outcome.entries)
            }))
        })
        .await
    }

    /// Immediate children of one directory.
    pub async fn list_directory(
        &self,
        path: &str,
        show_hidden: bool,
    ) -> GatewayResult<DirectoryListing> {
        let path = path.to_string();
        self.offload(move |core| core.lister.list(&path, show_hidden))
            .await
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Read a file's content.
    pub async fn read_file(&self, path: &str) -> GatewayResult<FileContent> {
        let path = path.to_string();
        self.offload(move |core| core.ops.read_file(&path)).await
    }

    /// Raw bytes and MIME type of a file.
    pub async fn serve_file(&self, path: &str) -> GatewayResult<(Vec<u8>, &'static str)> {
        let path = path.to_string();
        self.offload(move |core| core.ops.serve_file(&path)).await
    }

    /// Size and modification time of a file.
    pub async fn stat_file(&self, path: &str) -> GatewayResult<FileStat> {
        let path = path.to_string();
        self.offload(move |core| core.ops.stat_file(&path)).await
    }

    /// Overwrite a file atomically.
    pub async fn write_file(&self, path: &str, content: String) -> GatewayResult<FileWritten> {
        let path = path.to_string();
        let (written, relative) = self
            .offload(move |core| {
                let written = core.ops.write_file(&path, &content)?;
                Ok((written, core.relative_path(&path)))
            })
            .await?;
        self.notify(ChangeAction::Write, Some(relative));
        Ok(written)
    }

    /// Create a new file. Returns its root-relative path.
    pub async fn create_file(
        &self,
        path: &str,
        content: String,
        is_base64: bool,
    ) -> GatewayResult<String> {
        let path = path.to_string();
        let created = self
            .offload(move |core| core.ops.create_file(&path, &content, is_base64))
            .await?;
        self.notify(ChangeAction::Create, Some(created.clone()));
        Ok(created)
    }

    /// Create a new folder. Returns its root-relative path.
    pub async fn create_folder(&self, path: &str) -> GatewayResult<String> {
        let path = path.to_string();
        let created = self
            .offload(move |core| core.ops.create_folder(&path))
            .await?;
        self.notify(ChangeAction::CreateFolder, Some(created.clone()));
        Ok(created)
    }

    /// Delete a file or folder.
    pub async fn delete(&self, path: &str) -> GatewayResult<()> {
        let path = path.to_string();
        let relative = self
            .offload(move |core| {
                core.ops.delete(&path)?;
                Ok(core.relative_path(&path))
            })
            .await?;
        self.notify(ChangeAction::Delete, Some(relative));
        Ok(())
    }

    /// Delete several items. Failures are skipped; returns the count deleted.
    pub async fn delete_many(&self, paths: Vec<String>) -> GatewayResult<usize> {
        let deleted = self
            .offload(move |core| Ok(core.ops.delete_many(&paths)))
            .await?;
        self.notify(ChangeAction::DeleteMulti, None);
        Ok(deleted)
    }

    /// Copy a file or folder. Returns the destination path.
    pub async fn copy(&self, source: &str, destination: &str) -> GatewayResult<String> {
        let (source, destination) = (source.to_string(), destination.to_string());
        let copied = self
            .offload(move |core| core.ops.copy(&source, &destination))
            .await?;
        self.notify(ChangeAction::Copy, Some(copied.clone()));
        Ok(copied)
    }

    /// Rename a file or folder. Returns the new path.
    pub async fn rename(&self, source: &str, destination: &str) -> GatewayResult<String> {
        let (source, destination) = (source.to_string(), destination.to_string());
        let renamed = self
            .offload(move |core| core.ops.rename(&source, &destination))
            .await?;
        self.notify(ChangeAction::Rename, Some(renamed.clone()));
        Ok(renamed)
    }

    /// Move several items into an existing folder. Returns the count moved.
    pub async fn move_many(&self, paths: Vec<String>, destination: &str) -> GatewayResult<usize> {
        let destination = destination.to_string();
        let moved = self
            .offload(move |core| core.ops.move_many(&paths, &destination))
            .await?;
        self.notify(ChangeAction::MoveMulti, None);
        Ok(moved)
    }

    /// Upload a single file. Returns its root-relative path.
    pub async fn upload_file(
        &self,
        path: &str,
        content: String,
        overwrite: bool,
        is_base64: bool,
    ) -> GatewayResult<String> {
        let path = path.to_string();
        let uploaded = self
            .offload(move |core| core.ops.upload_file(&path, &content, overwrite, is_base64))
            .await?;
        self.notify(ChangeAction::Upload, Some(uploaded.clone()));
        Ok(uploaded)
    }

    /// Extract a base64 zip archive into a folder. Returns the file count.
    pub async fn upload_folder(&self, path: &str, zip_data: String) -> GatewayResult<usize> {
        let path = path.to_string();
        let (extracted, relative) = self
            .offload(move |core| {
                let extracted = core.ops.upload_folder(&path, &zip_data, &core.archives)?;
                Ok((extracted, core.relative_path(&path)))
            })
            .await?;
        self.notify(ChangeAction::UploadFolder, Some(relative));
        Ok(extracted)
    }

    // ========================================================================
    // Search and replace
    // ========================================================================

    /// Search every candidate file. Never fails; bad queries find nothing.
    pub async fn search(&self, query: &SearchQuery) -> Vec<SearchMatch> {
        self.core.search.search(query).await
    }

    /// Replace across the tree, publishing one change per rewritten file.
    pub async fn replace(
        &self,
        query: &SearchQuery,
        replacement: &str,
    ) -> GatewayResult<ReplaceSummary> {
        let summary = self
            .core
            .replace
            .replace(query, replacement, |path, occurrences| {
                debug!(path = %path, occurrences, "File updated by replace");
                self.notify(ChangeAction::Write, Some(path.to_string()));
            })
            .await?;

        info!(
            files = summary.files_updated,
            occurrences = summary.occurrences,
            "Replace finished"
        );
        Ok(summary)
    }

    // ========================================================================
    // Archives
    // ========================================================================

    /// Zip one folder as `<folder>.zip`.
    pub async fn archive_folder(&self, path: &str) -> GatewayResult<ArchiveData> {
        let path = path.to_string();
        self.offload(move |core| {
            let dir = core.resolver.resolve(&path)?;
            if !dir.is_dir() {
                return Err(if dir.exists() {
                    GatewayError::NotADirectory(path)
                } else {
                    GatewayError::NotFound(path)
                });
            }

            let bytes = core.archives.build_folder_archive(&dir)?;
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "archive".to_string());

            Ok(archive_data(format!("{}.zip", name), &bytes))
        })
        .await
    }

    /// Zip several paths as `download.zip`.
    pub async fn archive_many(&self, paths: Vec<String>) -> GatewayResult<ArchiveData> {
        self.offload(move |core| {
            let resolved = paths
                .iter()
                .map(|p| core.resolver.resolve(p))
                .collect::<GatewayResult<Vec<PathBuf>>>()?;

            let bytes = core.archives.build_multi_archive(&resolved)?;
            Ok(archive_data(MULTI_ARCHIVE_NAME.to_string(), &bytes))
        })
        .await
    }
}

fn archive_data(filename: String, bytes: &[u8]) -> ArchiveData {
    debug!(filename = %filename, bytes = bytes.len(), "Archive built");
    ArchiveData {
        success: true,
        filename,
        data: BASE64.encode(bytes),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn gateway_for(dir: &TempDir) -> FileGateway {
        FileGateway::new(&Config::with_root(dir.path())).unwrap()
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_root(dir.path().join("missing"));
        assert!(matches!(
            FileGateway::new(&config),
            Err(GatewayError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_all_is_cached_until_mutation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.yaml"), "a").unwrap();
        let gateway = gateway_for(&dir);

        let first = gateway.list_all(false, false).await.unwrap();
        assert_eq!(first.len(), 1);

        // An external change is not seen while the cache is fresh
        fs::write(dir.path().join("b.yaml"), "b").unwrap();
        let second = gateway.list_all(false, false).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // A gateway mutation invalidates the cache
        gateway.write_file("c.yaml", "c".to_string()).await.unwrap();
        let third = gateway.list_all(false, false).await.unwrap();
        assert_eq!(third.len(), 3);
    }

    #[tokio::test]
    async fn test_force_refresh_rewalks() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway_for(&dir);

        assert!(gateway.list_all(false, false).await.unwrap().is_empty());
        fs::write(dir.path().join("new.yaml"), "x").unwrap();

        let refreshed = gateway.list_all(false, true).await.unwrap();
        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed[0].path, "new.yaml");
    }

    #[tokio::test]
    async fn test_mutations_publish_events() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway_for(&dir);
        let mut events = gateway.subscribe();

        gateway.create_folder("pkg").await.unwrap();
        gateway
            .create_file("pkg/a.yaml", "x".to_string(), false)
            .await
            .unwrap();
        gateway.delete_many(vec!["pkg/a.yaml".to_string()]).await.unwrap();

        let first = events.recv().await.unwrap();
        assert_eq!(first.action, ChangeAction::CreateFolder);
        assert_eq!(first.path.as_deref(), Some("pkg"));
        assert!(first.timestamp > 0);

        let second = events.recv().await.unwrap();
        assert_eq!(second.action, ChangeAction::Create);
        assert_eq!(second.path.as_deref(), Some("pkg/a.yaml"));

        let third = events.recv().await.unwrap();
        assert_eq!(third.action, ChangeAction::DeleteMulti);
        assert!(third.path.is_none());
    }

    #[tokio::test]
    async fn test_failed_mutation_publishes_nothing() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway_for(&dir);
        let mut events = gateway.subscribe();

        assert!(gateway.delete("missing.yaml").await.is_err());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_replace_notifies_per_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.yaml"), "foo").unwrap();
        fs::write(dir.path().join("two.yaml"), "foo").unwrap();
        let gateway = gateway_for(&dir);
        let mut events = gateway.subscribe();

        let query = SearchQuery {
            query: "foo".to_string(),
            ..SearchQuery::default()
        };
        let summary = gateway.replace(&query, "bar").await.unwrap();
        assert_eq!(summary.files_updated, 2);

        let mut paths = vec![
            events.recv().await.unwrap().path.unwrap(),
            events.recv().await.unwrap().path.unwrap(),
        ];
        paths.sort();
        assert_eq!(paths, vec!["one.yaml", "two.yaml"]);
    }

    #[tokio::test]
    async fn test_events_carry_normalized_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("x")).unwrap();
        fs::write(dir.path().join("a.yaml"), "a").unwrap();
        fs::write(dir.path().join("b.yaml"), "b").unwrap();
        let gateway = gateway_for(&dir);
        let mut events = gateway.subscribe();

        gateway.write_file("/a.yaml", "new".to_string()).await.unwrap();
        gateway.delete("x/../b.yaml").await.unwrap();

        let write = events.recv().await.unwrap();
        assert_eq!(write.action, ChangeAction::Write);
        assert_eq!(write.path.as_deref(), Some("a.yaml"));

        let delete = events.recv().await.unwrap();
        assert_eq!(delete.action, ChangeAction::Delete);
        assert_eq!(delete.path.as_deref(), Some("b.yaml"));
    }

    #[tokio::test]
    async fn test_serve_file_returns_bytes_and_mime() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let gateway = gateway_for(&dir);

        let (bytes, mime) = gateway.serve_file("logo.png").await.unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(mime, "image/png");

        assert!(matches!(
            gateway.serve_file("../etc/passwd").await,
            Err(GatewayError::PathDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_archive_many_tolerates_duplicate_selection() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/x.yaml"), "a").unwrap();
        fs::write(dir.path().join("b/x.yaml"), "b").unwrap();
        let gateway = gateway_for(&dir);

        let files = gateway
            .archive_many(vec!["a/x.yaml".to_string(), "b/x.yaml".to_string()])
            .await
            .unwrap();
        assert_eq!(files.filename, "download.zip");

        let folders = gateway
            .archive_many(vec!["a".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert!(folders.success);
    }

    #[tokio::test]
    async fn test_archive_names() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("lights")).unwrap();
        fs::write(dir.path().join("lights/a.yaml"), "a").unwrap();
        let gateway = gateway_for(&dir);

        let folder = gateway.archive_folder("lights").await.unwrap();
        assert_eq!(folder.filename, "lights.zip");
        assert!(!BASE64.decode(folder.data).unwrap().is_empty());

        let many = gateway
            .archive_many(vec!["lights/a.yaml".to_string()])
            .await
            .unwrap();
        assert_eq!(many.filename, "download.zip");

        assert!(matches!(
            gateway.archive_folder("lights/a.yaml").await,
            Err(GatewayError::NotADirectory(_))
        ));
        assert!(matches!(
            gateway.archive_many(vec!["../outside".to_string()]).await,
            Err(GatewayError::PathDenied(_))
        ));
    }
}
