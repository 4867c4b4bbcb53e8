//! Protocol message definitions for Treegate.
//!
//! This module defines the request, result and notification types exchanged
//! between the filesystem gateway and the collaborator layer that fronts it
//! (HTTP handlers, event subscribers). Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Envelope wrapper for all protocol messages.
///
/// The envelope provides versioning and sequence numbers so that responses
/// can be matched to the request that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version for compatibility checking.
    pub version: u8,
    /// Sequence number echoed back in the response.
    pub sequence: u64,
    /// The actual message payload.
    pub payload: Message,
}

impl Envelope {
    /// Create a new envelope with the current protocol version.
    pub fn new(sequence: u64, payload: Message) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            sequence,
            payload,
        }
    }

    /// Reject envelopes produced by a different protocol version.
    pub fn check_version(&self) -> Result<()> {
        if self.version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                got: self.version,
            });
        }
        Ok(())
    }
}

/// Top-level message enum containing all message types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Message {
    // Listing requests
    /// Recursive listing of the whole tree (served from the index cache).
    ListAll(ListAllRequest),
    /// Single-level listing of one directory.
    ListDirectory(ListDirectoryRequest),

    // File requests
    /// Read a file's content.
    ReadFile(PathRequest),
    /// Read a file's size and modification time.
    StatFile(PathRequest),
    /// Overwrite (or create) a file with text content.
    WriteFile(WriteFileRequest),
    /// Create a new file; fails if it exists.
    CreateFile(CreateFileRequest),
    /// Create a new folder; fails if it exists.
    CreateFolder(PathRequest),
    /// Delete a file or folder.
    Delete(PathRequest),
    /// Delete several files or folders.
    DeleteMany(PathsRequest),
    /// Copy a file or folder.
    Copy(TransferRequest),
    /// Rename a file or folder.
    Rename(TransferRequest),
    /// Move several items into a folder.
    MoveMany(MoveManyRequest),
    /// Upload a single file.
    UploadFile(UploadFileRequest),
    /// Upload a zip archive and extract it into a folder.
    UploadFolder(UploadFolderRequest),

    // Search requests
    /// Search the whole tree.
    Search(SearchRequest),
    /// Search and replace across the whole tree.
    Replace(ReplaceRequest),

    // Archive requests
    /// Archive one folder.
    ArchiveFolder(PathRequest),
    /// Archive an arbitrary set of paths.
    ArchiveMany(PathsRequest),

    // Responses
    /// Ordered entries of a recursive listing.
    EntryList(EntryList),
    /// Result of a single-level listing.
    DirectoryListing(DirectoryListing),
    /// File content.
    FileContent(FileContent),
    /// File statistics.
    FileStat(FileStat),
    /// Result of a write.
    FileWritten(FileWritten),
    /// Result of an operation that produced a path.
    PathResult(PathResult),
    /// Result of an operation without a payload.
    Completed(Completed),
    /// Search matches.
    SearchResults(SearchResults),
    /// Aggregated replace outcome.
    ReplaceSummary(ReplaceSummary),
    /// Archive bytes (base64).
    Archive(ArchiveData),
    /// Result of a folder upload.
    FolderUploaded(FolderUploaded),

    // Notifications
    /// A mutation happened inside the sandbox.
    Changed(ChangeEvent),
    /// Error message.
    Error(ErrorMessage),
}

impl Message {
    /// Whether this message is a request the gateway should act on.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Message::ListAll(_)
                | Message::ListDirectory(_)
                | Message::ReadFile(_)
                | Message::StatFile(_)
                | Message::WriteFile(_)
                | Message::CreateFile(_)
                | Message::CreateFolder(_)
                | Message::Delete(_)
                | Message::DeleteMany(_)
                | Message::Copy(_)
                | Message::Rename(_)
                | Message::MoveMany(_)
                | Message::UploadFile(_)
                | Message::UploadFolder(_)
                | Message::Search(_)
                | Message::Replace(_)
                | Message::ArchiveFolder(_)
                | Message::ArchiveMany(_)
        )
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// Entries
// ============================================================================

/// Kind of a listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file (or a symlink to one).
    File,
    /// Directory (or a symlink to one).
    Folder,
}

/// A single file or folder produced by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Path relative to the sandbox root, `/`-separated.
    pub path: String,
    /// Entry name (last path segment).
    pub name: String,
    /// File or folder.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes; aggregate size for folders in recursive listings.
    pub size: u64,
    /// Whether the entry itself is a symbolic link.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_symlink: bool,
    /// Link target as stored in the link, if readable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink_target: Option<String>,
    /// Set for symbolic links whose target does not exist.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_broken: bool,
    /// Number of immediate children (single-level folder listings only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_count: Option<u64>,
}

impl Entry {
    /// Create a file entry.
    pub fn file(path: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self::new(path.into(), name.into(), EntryKind::File, size)
    }

    /// Create a folder entry.
    pub fn folder(path: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self::new(path.into(), name.into(), EntryKind::Folder, size)
    }

    fn new(path: String, name: String, kind: EntryKind, size: u64) -> Self {
        Self {
            path,
            name,
            kind,
            size,
            is_symlink: false,
            symlink_target: None,
            is_broken: false,
            child_count: None,
        }
    }

    /// Mark the entry as a symbolic link with the given target.
    pub fn with_symlink(mut self, target: Option<String>) -> Self {
        self.is_symlink = true;
        self.symlink_target = target;
        self
    }

    /// Mark the entry as a dangling symbolic link.
    pub fn broken(mut self) -> Self {
        self.is_broken = true;
        self
    }

    /// Attach an immediate-child count.
    pub fn with_child_count(mut self, count: u64) -> Self {
        self.child_count = Some(count);
        self
    }

    /// Whether this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Request for the recursive listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListAllRequest {
    /// Include entries whose name starts with `.`.
    pub show_hidden: bool,
    /// Bypass the index cache.
    pub force_refresh: bool,
}

/// Request for a single-level listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListDirectoryRequest {
    /// Directory to list; empty means the sandbox root.
    pub path: String,
    /// Include entries whose name starts with `.`.
    pub show_hidden: bool,
}

/// Request carrying a single path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathRequest {
    /// Path relative to the sandbox root.
    pub path: String,
}

/// Request carrying several paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathsRequest {
    /// Paths relative to the sandbox root.
    pub paths: Vec<String>,
}

/// Write text content to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WriteFileRequest {
    /// Destination path.
    pub path: String,
    /// New file content.
    pub content: String,
}

/// Create a new file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateFileRequest {
    /// Destination path.
    pub path: String,
    /// Initial content.
    pub content: String,
    /// Whether `content` is base64-encoded bytes.
    pub is_base64: bool,
}

/// Copy or rename from one path to another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferRequest {
    /// Existing source path.
    pub source: String,
    /// Destination path, which must not exist.
    pub destination: String,
}

/// Move several items into one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoveManyRequest {
    /// Items to move.
    pub paths: Vec<String>,
    /// Destination folder; empty means the sandbox root.
    pub destination: String,
}

/// Upload a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadFileRequest {
    /// Destination path.
    pub path: String,
    /// File content.
    pub content: String,
    /// Replace an existing file.
    pub overwrite: bool,
    /// Whether `content` is base64-encoded bytes.
    pub is_base64: bool,
}

/// Upload a zip archive to be extracted into a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadFolderRequest {
    /// Destination folder (created when missing).
    pub path: String,
    /// Base64-encoded zip archive.
    pub zip_data: String,
}

/// Search the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchRequest {
    /// Text or pattern to look for.
    pub query: String,
    /// Match case exactly.
    pub case_sensitive: bool,
    /// Treat `query` as a regular expression.
    pub use_regex: bool,
    /// Only match whole words.
    pub whole_word: bool,
    /// Only search files matching one of these globs.
    pub include: Vec<String>,
    /// Skip files matching any of these globs.
    pub exclude: Vec<String>,
}

/// Search and replace across the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplaceRequest {
    /// Text or pattern to look for.
    pub query: String,
    /// Replacement text.
    pub replacement: String,
    /// Match case exactly.
    pub case_sensitive: bool,
    /// Treat `query` as a regular expression.
    pub use_regex: bool,
    /// Only match whole words.
    pub whole_word: bool,
    /// Only touch files matching one of these globs.
    pub include: Vec<String>,
    /// Skip files matching any of these globs.
    pub exclude: Vec<String>,
}

// ============================================================================
// Results
// ============================================================================

/// Ordered entries of a recursive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryList {
    /// Entries sorted by path.
    pub entries: Vec<Entry>,
}

/// Result of a single-level directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    /// Path that was requested.
    pub path: String,
    /// Child folders, sorted case-insensitively.
    pub folders: Vec<Entry>,
    /// Child files, sorted case-insensitively.
    pub files: Vec<Entry>,
    /// Set when the directory could not be listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DirectoryListing {
    /// Empty listing carrying an error.
    pub fn failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            folders: Vec::new(),
            files: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// File content returned by a read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    /// Text content, or base64 for binary files.
    pub content: String,
    /// Whether `content` is base64-encoded.
    pub is_base64: bool,
    /// Guessed MIME type.
    pub mime_type: String,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: f64,
}

/// File size and modification time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    /// Operation succeeded.
    pub success: bool,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: f64,
    /// Size in bytes.
    pub size: u64,
}

/// Result of a write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileWritten {
    /// Operation succeeded.
    pub success: bool,
    /// Modification time after the write.
    pub mtime: f64,
}

/// Result of an operation that produced a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    /// Operation succeeded.
    pub success: bool,
    /// Path that was created or renamed to.
    pub path: String,
}

impl PathResult {
    /// Successful result for `path`.
    pub fn ok(path: impl Into<String>) -> Self {
        Self {
            success: true,
            path: path.into(),
        }
    }
}

/// Result of an operation without a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completed {
    /// Operation succeeded.
    pub success: bool,
}

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    /// File path relative to the sandbox root.
    pub path: String,
    /// 1-based line number.
    pub line_number: usize,
    /// The matching line, trimmed.
    pub line_text: String,
}

/// Search matches in completion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Bounded list of matches.
    pub matches: Vec<SearchMatch>,
}

/// Aggregated replace outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSummary {
    /// Operation succeeded.
    pub success: bool,
    /// Number of files rewritten.
    pub files_updated: usize,
    /// Total substitutions across all files.
    pub occurrences: usize,
}

/// Archive bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveData {
    /// Operation succeeded.
    pub success: bool,
    /// Suggested download name.
    pub filename: String,
    /// Base64-encoded zip archive.
    pub data: String,
}

/// Result of a folder upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderUploaded {
    /// Operation succeeded.
    pub success: bool,
    /// Number of files written.
    pub files_extracted: usize,
}

// ============================================================================
// Notifications
// ============================================================================

/// Kind of mutation reported by a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Write,
    Create,
    CreateFolder,
    Delete,
    DeleteMulti,
    MoveMulti,
    Copy,
    Rename,
    Upload,
    UploadFolder,
}

impl ChangeAction {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Write => "write",
            ChangeAction::Create => "create",
            ChangeAction::CreateFolder => "create_folder",
            ChangeAction::Delete => "delete",
            ChangeAction::DeleteMulti => "delete_multi",
            ChangeAction::MoveMulti => "move_multi",
            ChangeAction::Copy => "copy",
            ChangeAction::Rename => "rename",
            ChangeAction::Upload => "upload",
            ChangeAction::UploadFolder => "upload_folder",
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification emitted after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// What happened.
    pub action: ChangeAction,
    /// Affected path, absent for bulk operations.
    pub path: Option<String>,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

// ============================================================================
// Errors
// ============================================================================

/// Error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Error code for programmatic handling.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Optional context (e.g., the requested path).
    pub context: Option<String>,
    /// Whether retrying could succeed.
    pub recoverable: bool,
}

/// Error codes for common error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Unknown or unspecified error.
    Unknown,
    /// Path escapes the sandbox, is filtered out, or is protected.
    Forbidden,
    /// Resource not found.
    NotFound,
    /// Resource already exists.
    AlreadyExists,
    /// Operating system refused access.
    PermissionDenied,
    /// Invalid request or parameters.
    InvalidRequest,
    /// Server-side error.
    InternalError,
    /// Protocol version mismatch.
    VersionMismatch,
}

// ============================================================================
// Serialization helpers
// ============================================================================

impl Envelope {
    /// Serialize the envelope to MessagePack bytes (field names included).
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Deserialize an envelope from MessagePack bytes.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Serialize the envelope to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize an envelope from a JSON string.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(msg: Message) {
        let envelope = Envelope::new(42, msg);

        let bytes = envelope.to_msgpack().expect("msgpack serialization failed");
        let decoded = Envelope::from_msgpack(&bytes).expect("msgpack deserialization failed");
        assert_eq!(envelope, decoded);

        let json = envelope.to_json().expect("json serialization failed");
        let decoded = Envelope::from_json(&json).expect("json deserialization failed");
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn test_envelope_version() {
        let envelope = Envelope::new(1, Message::ListAll(ListAllRequest::default()));
        assert_eq!(envelope.version, PROTOCOL_VERSION);
        assert!(envelope.check_version().is_ok());
    }

    #[test]
    fn test_envelope_version_mismatch() {
        let mut envelope = Envelope::new(1, Message::ListAll(ListAllRequest::default()));
        envelope.version = PROTOCOL_VERSION + 1;
        assert!(matches!(
            envelope.check_version(),
            Err(ProtocolError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_listing_with_optional_fields_roundtrip() {
        roundtrip(Message::DirectoryListing(DirectoryListing {
            path: "config".to_string(),
            folders: vec![Entry::folder("config/sub", "sub", 0).with_child_count(3)],
            files: vec![
                Entry::file("config/a.yaml", "a.yaml", 12),
                Entry::file("config/link.yaml", "link.yaml", 0)
                    .with_symlink(Some("../missing.yaml".to_string()))
                    .broken(),
            ],
            error: None,
        }));
    }

    #[test]
    fn test_search_and_replace_roundtrip() {
        roundtrip(Message::Search(SearchRequest {
            query: "foo".to_string(),
            case_sensitive: true,
            use_regex: false,
            whole_word: true,
            include: vec!["*.yaml".to_string()],
            exclude: vec!["secrets.yaml".to_string()],
        }));
        roundtrip(Message::ReplaceSummary(ReplaceSummary {
            success: true,
            files_updated: 2,
            occurrences: 5,
        }));
    }

    #[test]
    fn test_file_content_roundtrip() {
        roundtrip(Message::FileContent(FileContent {
            content: "aGVsbG8=".to_string(),
            is_base64: true,
            mime_type: "image/png".to_string(),
            mtime: 1_704_067_200.5,
        }));
    }

    #[test]
    fn test_change_event_roundtrip() {
        roundtrip(Message::Changed(ChangeEvent {
            action: ChangeAction::DeleteMulti,
            path: None,
            timestamp: 1_704_067_200_000,
        }));
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = Entry::file("a/b.yaml", "b.yaml", 3);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["path"], "a/b.yaml");
        assert_eq!(json["type"], "file");
        assert_eq!(json["size"], 3);
        // Flags are omitted unless set
        assert!(json.get("isSymlink").is_none());
        assert!(json.get("isBroken").is_none());
        assert!(json.get("childCount").is_none());

        let link = Entry::folder("dir", "dir", 0).with_symlink(Some("/target".to_string()));
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["type"], "folder");
        assert_eq!(json["isSymlink"], true);
        assert_eq!(json["symlinkTarget"], "/target");
    }

    #[test]
    fn test_request_defaults_from_sparse_json() {
        let json = r#"{"version":1,"sequence":7,"payload":{"type":"Search","data":{"query":"foo"}}}"#;
        let envelope = Envelope::from_json(json).unwrap();

        match envelope.payload {
            Message::Search(req) => {
                assert_eq!(req.query, "foo");
                assert!(!req.case_sensitive);
                assert!(req.include.is_empty());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_change_action_wire_names() {
        let json = serde_json::to_string(&ChangeAction::CreateFolder).unwrap();
        assert_eq!(json, "\"create_folder\"");
        assert_eq!(ChangeAction::MoveMulti.as_str(), "move_multi");
        assert_eq!(ChangeAction::Write.to_string(), "write");
    }

    #[test]
    fn test_is_request() {
        assert!(Message::ReadFile(PathRequest::default()).is_request());
        assert!(Message::ArchiveMany(PathsRequest::default()).is_request());
        assert!(!Message::Completed(Completed { success: true }).is_request());
        assert!(!Message::Changed(ChangeEvent {
            action: ChangeAction::Write,
            path: Some("a.yaml".to_string()),
            timestamp: 0,
        })
        .is_request());
    }

    #[test]
    fn test_failed_listing() {
        let listing = DirectoryListing::failed("missing", "Directory not found");
        assert!(listing.folders.is_empty());
        assert!(listing.files.is_empty());
        assert_eq!(listing.error.as_deref(), Some("Directory not found"));
    }
}
