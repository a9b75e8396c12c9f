//! Storage layer abstraction.
//!
//! Everything the quote book keeps between runs goes through the
//! [`KeyValueStore`] trait, under the well-known keys below.

pub mod persistence;
pub mod traits;

pub use persistence::{FilesystemStore, MemoryStore};
pub use traits::KeyValueStore;

/// Durable key holding the full serialized quote list.
pub const QUOTES_KEY: &str = "quotes";

/// Durable key holding the active category filter.
pub const SELECTED_CATEGORY_KEY: &str = "selectedCategory";

/// Older name of [`SELECTED_CATEGORY_KEY`], still read on load.
pub const LEGACY_CATEGORY_KEY: &str = "lastCategory";

/// Session key holding the last quote shown.
pub const LAST_QUOTE_KEY: &str = "lastQuote";
