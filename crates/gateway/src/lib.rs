//! # Treegate Gateway Library
//!
//! Sandboxed access to a single directory tree for remote clients.
//!
//! ## Overview
//!
//! The gateway confines every request to one root directory and provides:
//!
//! - **Browsing**: a cached recursive index and lazy single-level listings
//! - **File Operations**: read, write, create, copy, rename, move, delete, upload
//! - **Search and Replace**: parallel content search with include/exclude globs
//! - **Archives**: zip downloads of folders or selections, zip uploads
//! - **Change Notifications**: a broadcast event for every mutation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Gateway Router                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                         FileGateway                             │
//! │                                                                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │ PathResolver │  │  AllowList   │  │   DirectoryCache     │  │
//! │  │              │  │   Filter     │  │   + TreeWalker       │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────────┘  │
//! │                                                                  │
//! │  ┌────────────┐ ┌──────────────┐ ┌────────────┐ ┌───────────┐  │
//! │  │ LazyLister │ │Search/Replace│ │  Archives  │ │ File Ops  │  │
//! │  └────────────┘ └──────────────┘ └────────────┘ └───────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gateway::{Config, FileGateway};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::with_root("/srv/config");
//!     let gateway = FileGateway::new(&config)?;
//!
//!     let mut changes = gateway.subscribe();
//!     gateway.write_file("automations.yaml", "[]\n".to_string()).await?;
//!
//!     let event = changes.recv().await?;
//!     println!("{} {:?}", event.action, event.path);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`error`]: Gateway error type and protocol mapping
//! - [`files`]: Path resolution, filtering, listing, search and archives
//! - [`gateway`]: The `FileGateway` facade
//! - [`router`]: Message routing to gateway operations

pub mod config;
pub mod error;
pub mod files;
pub mod gateway;
pub mod router;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError};
pub use error::{GatewayError, GatewayResult};
pub use files::SearchQuery;
pub use gateway::FileGateway;
pub use router::{GatewayRouter, RouterResult};
