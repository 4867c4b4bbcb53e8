//! # Treegate Protocol Library
//!
//! This crate provides the message definitions exchanged with the Treegate
//! filesystem gateway.
//!
//! ## Overview
//!
//! - **Requests**: one message per gateway operation (listing, file access,
//!   mutations, search/replace, archives)
//! - **Results**: typed payloads carrying entries, file content and summaries
//! - **Notifications**: change events emitted after every successful mutation
//! - **Errors**: a small code taxonomy shared by every operation
//!
//! Messages travel inside an [`Envelope`] that carries a protocol version and
//! a sequence number. Envelopes encode to JSON or named MessagePack.
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{Envelope, Message};
//! use protocol::messages::ListDirectoryRequest;
//!
//! let message = Message::ListDirectory(ListDirectoryRequest {
//!     path: "config".to_string(),
//!     show_hidden: false,
//! });
//! let envelope = Envelope::new(1, message);
//!
//! let json = envelope.to_json().unwrap();
//! let decoded = Envelope::from_json(&json).unwrap();
//! assert_eq!(envelope, decoded);
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: Protocol message definitions
//! - [`error`]: Error types

pub mod error;
pub mod messages;

pub use error::{ProtocolError, Result};
pub use messages::{
    ChangeAction, ChangeEvent, Entry, EntryKind, Envelope, ErrorCode, ErrorMessage, Message,
    PROTOCOL_VERSION,
};
