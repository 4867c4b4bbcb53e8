//! Message router for dispatching requests to the gateway.
//!
//! This module provides the `GatewayRouter` that receives protocol messages,
//! calls the matching [`FileGateway`] operation and wraps the outcome in a
//! response message.

use protocol::messages::{
    Completed, EntryList, FolderUploaded, Message, PathResult, SearchResults,
};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::files::SearchQuery;
use crate::gateway::FileGateway;

/// Result type for router operations.
pub type RouterResult = Result<Option<Message>, GatewayError>;

/// Dispatches request messages to a [`FileGateway`].
#[derive(Debug, Clone)]
pub struct GatewayRouter {
    gateway: FileGateway,
}

impl GatewayRouter {
    /// Create a router over `gateway`.
    pub fn new(gateway: FileGateway) -> Self {
        Self { gateway }
    }

    /// The gateway requests are dispatched to.
    pub fn gateway(&self) -> &FileGateway {
        &self.gateway
    }

    /// Route a message to the appropriate operation.
    ///
    /// Returns `Ok(Some(response))` for requests, `Ok(None)` for messages
    /// that need no answer, or `Err(error)` if the operation failed.
    pub async fn route(&self, message: Message) -> RouterResult {
        debug!(request = message.is_request(), "Routing message");
        let gateway = &self.gateway;

        let response = match message {
            // Listing
            Message::ListAll(req) => {
                let entries = gateway.list_all(req.show_hidden, req.force_refresh).await?;
                Message::EntryList(EntryList {
                    entries: entries.to_vec(),
                })
            }
            Message::ListDirectory(req) => {
                Message::DirectoryListing(gateway.list_directory(&req.path, req.show_hidden).await?)
            }

            // Files
            Message::ReadFile(req) => Message::FileContent(gateway.read_file(&req.path).await?),
            Message::StatFile(req) => Message::FileStat(gateway.stat_file(&req.path).await?),
            Message::WriteFile(req) => {
                Message::FileWritten(gateway.write_file(&req.path, req.content).await?)
            }
            Message::CreateFile(req) => {
                let path = gateway
                    .create_file(&req.path, req.content, req.is_base64)
                    .await?;
                Message::PathResult(PathResult::ok(path))
            }
            Message::CreateFolder(req) => {
                Message::PathResult(PathResult::ok(gateway.create_folder(&req.path).await?))
            }
            Message::Delete(req) => {
                gateway.delete(&req.path).await?;
                Message::Completed(Completed { success: true })
            }
            Message::DeleteMany(req) => {
                let deleted = gateway.delete_many(req.paths).await?;
                debug!(deleted, "Bulk delete finished");
                Message::Completed(Completed { success: true })
            }
            Message::Copy(req) => Message::PathResult(PathResult::ok(
                gateway.copy(&req.source, &req.destination).await?,
            )),
            Message::Rename(req) => Message::PathResult(PathResult::ok(
                gateway.rename(&req.source, &req.destination).await?,
            )),
            Message::MoveMany(req) => {
                let moved = gateway.move_many(req.paths, &req.destination).await?;
                debug!(moved, "Bulk move finished");
                Message::Completed(Completed { success: true })
            }
            Message::UploadFile(req) => {
                let path = gateway
                    .upload_file(&req.path, req.content, req.overwrite, req.is_base64)
                    .await?;
                Message::PathResult(PathResult::ok(path))
            }
            Message::UploadFolder(req) => {
                let files_extracted = gateway.upload_folder(&req.path, req.zip_data).await?;
                Message::FolderUploaded(FolderUploaded {
                    success: true,
                    files_extracted,
                })
            }

            // Search
            Message::Search(req) => {
                let query = SearchQuery::from(req);
                Message::SearchResults(SearchResults {
                    matches: gateway.search(&query).await,
                })
            }
            Message::Replace(req) => {
                let (query, replacement) = SearchQuery::from_replace(req);
                Message::ReplaceSummary(gateway.replace(&query, &replacement).await?)
            }

            // Archives
            Message::ArchiveFolder(req) => Message::Archive(gateway.archive_folder(&req.path).await?),
            Message::ArchiveMany(req) => Message::Archive(gateway.archive_many(req.paths).await?),

            Message::Error(err) => {
                warn!(?err, "Received error from peer");
                return Ok(None);
            }
            Message::EntryList(_)
            | Message::DirectoryListing(_)
            | Message::FileContent(_)
            | Message::FileStat(_)
            | Message::FileWritten(_)
            | Message::PathResult(_)
            | Message::Completed(_)
            | Message::SearchResults(_)
            | Message::ReplaceSummary(_)
            | Message::Archive(_)
            | Message::FolderUploaded(_)
            | Message::Changed(_) => {
                // These are responses or notifications, not requests
                debug!("Ignoring response message received as request");
                return Ok(None);
            }
        };

        Ok(Some(response))
    }

    /// Route a message, turning failures into an error response.
    pub async fn route_or_error(&self, message: Message) -> Option<Message> {
        let context = request_context(&message);
        match self.route(message).await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Request failed");
                Some(Message::Error(e.to_error_message(context)))
            }
        }
    }
}

/// Name of the path a request acts on, for error context.
fn request_context(message: &Message) -> Option<String> {
    match message {
        Message::ListDirectory(req) => Some(req.path.clone()),
        Message::ReadFile(req)
        | Message::StatFile(req)
        | Message::CreateFolder(req)
        | Message::Delete(req)
        | Message::ArchiveFolder(req) => Some(req.path.clone()),
        Message::WriteFile(req) => Some(req.path.clone()),
        Message::CreateFile(req) => Some(req.path.clone()),
        Message::UploadFile(req) => Some(req.path.clone()),
        Message::UploadFolder(req) => Some(req.path.clone()),
        Message::Copy(req) | Message::Rename(req) => Some(req.source.clone()),
        Message::MoveMany(req) => Some(req.destination.clone()),
        _ => None,
    }
}
