//! Error types for gateway operations.
//!
//! Every operation returns a [`GatewayError`] on failure; the router turns it
//! into a protocol [`ErrorMessage`] so callers always receive a structured
//! result.

use std::io;
use std::path::Path;

use protocol::messages::{ErrorCode, ErrorMessage};
use thiserror::Error;

/// Result alias used across the gateway.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur while serving a filesystem request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The path escapes the sandbox or names a file that is not allowed.
    #[error("access denied: {0}")]
    PathDenied(String),

    /// The requested file or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The target exists and the operation does not overwrite.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The operating system refused access.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The path is protected against deletion and renaming.
    #[error("path is protected: {0}")]
    Protected(String),

    /// A directory was expected.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The request parameters are invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The search query or a glob failed to compile.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Building or extracting an archive failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal failure (task join, poisoned state).
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Map an IO error on `path` to the matching variant.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        let display = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => GatewayError::NotFound(display),
            io::ErrorKind::PermissionDenied => GatewayError::PermissionDenied(display),
            io::ErrorKind::AlreadyExists => GatewayError::AlreadyExists(display),
            _ => GatewayError::Io(err),
        }
    }

    /// Convert to a protocol error message.
    pub fn to_error_message(&self, context: Option<String>) -> ErrorMessage {
        let (code, recoverable) = match self {
            GatewayError::PathDenied(_) => (ErrorCode::Forbidden, false),
            GatewayError::Protected(_) => (ErrorCode::Forbidden, false),
            GatewayError::NotFound(_) => (ErrorCode::NotFound, false),
            GatewayError::AlreadyExists(_) => (ErrorCode::AlreadyExists, false),
            GatewayError::PermissionDenied(_) => (ErrorCode::PermissionDenied, false),
            GatewayError::InvalidRequest(_) => (ErrorCode::InvalidRequest, false),
            GatewayError::InvalidQuery(_) => (ErrorCode::InvalidRequest, false),
            GatewayError::NotADirectory(_) => (ErrorCode::InvalidRequest, false),
            GatewayError::Archive(_) => (ErrorCode::InternalError, true),
            GatewayError::Io(_) => (ErrorCode::InternalError, true),
            GatewayError::Internal(_) => (ErrorCode::InternalError, true),
        };

        ErrorMessage {
            code,
            message: self.to_string(),
            context,
            recoverable,
        }
    }
}

impl From<zip::result::ZipError> for GatewayError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => GatewayError::Io(e),
            other => GatewayError::Archive(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for GatewayError {
    fn from(err: tokio::task::JoinError) -> Self {
        GatewayError::Internal(format!("blocking task failed: {}", err))
    }
}
