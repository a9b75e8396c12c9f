//! Business logic services.
//!
//! [`QuoteBook`] owns the [`QuoteStore`] and the [`Selection`]; the
//! [`SyncAgent`] shares the book and merges remote data into it.

mod book;
mod selection;
mod store;
mod sync;

pub use book::{QuoteBook, SharedBook, lock_book};
pub use selection::Selection;
pub use store::{ImportReport, QuoteStore};
pub use sync::{SyncAgent, SyncOutcome, SyncStats, merge_remote};
