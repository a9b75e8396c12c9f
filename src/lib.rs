//! # Quotesync
//!
//! A local quote book with category filtering and periodic remote sync.
//!
//! Quotes (a text plus a category) live in an ordered store that is mirrored
//! to durable key-value storage after every mutation. A category filter
//! narrows the visible set, from which quotes are picked at random. A sync
//! agent periodically fetches a remote list, projects it into quotes and
//! merges it into the store.
//!
//! ## Layers
//!
//! - [`storage`]: key-value backends (filesystem, in-memory)
//! - [`services`]: the quote store, selection, the owning [`QuoteBook`] and
//!   the [`SyncAgent`]
//! - [`remote`]: the remote collaborator and the post-to-quote projection
//! - [`io`]: JSON export and import parsing
//! - [`observability`]: logging setup and the notification bus
//!
//! ## Example
//!
//! ```rust,ignore
//! use quotesync::storage::MemoryStore;
//! use quotesync::QuoteBook;
//! use std::sync::Arc;
//!
//! let mut book = QuoteBook::open(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
//! book.add("Stay hungry, stay foolish.", "Motivation")?;
//! if let Some(quote) = book.show_random() {
//!     println!("{quote}");
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod remote;
pub mod services;
pub mod storage;

pub use config::{LoggingSettings, QuoteSyncConfig, SyncSettings};
pub use models::{CategoryFilter, Notification, NotificationLevel, Quote, QuoteId, QuoteKey};
pub use remote::{HttpRemote, PostProjection, RemotePost, RemoteSource};
pub use services::{
    ImportReport, QuoteBook, QuoteStore, Selection, SharedBook, SyncAgent, SyncOutcome,
    SyncStats,
};
pub use storage::{FilesystemStore, KeyValueStore, MemoryStore};

/// Error type for quotesync operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Blank quote fields, blank filter, non-array import, unsafe storage key |
/// | `Parse` | Malformed import JSON, malformed config TOML |
/// | `OperationFailed` | Filesystem I/O, serialization, poisoned lock, logging init |
/// | `Remote` | HTTP connect/timeout/status errors, undecodable remote payloads |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - Quote text or category is empty after trimming
    /// - The category filter name is blank
    /// - An import document is valid JSON but not an array
    /// - A storage key contains path separators or other unsafe characters
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A document could not be parsed.
    #[error("failed to parse {what}: {cause}")]
    Parse {
        /// What was being parsed.
        what: String,
        /// The underlying cause.
        cause: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem reads or writes fail
    /// - Serialization fails
    /// - The shared quote book lock is poisoned
    /// - Logging initialization fails
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The remote endpoint could not be reached or answered badly.
    ///
    /// Raised when:
    /// - The connection fails or the request times out
    /// - The endpoint returns a non-success status
    /// - The response body is not the expected JSON shape
    #[error("remote '{operation}' failed: {cause}")]
    Remote {
        /// The remote operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for quotesync operations.
pub type Result<T> = std::result::Result<T, Error>;
