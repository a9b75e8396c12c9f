//! Data models for quotesync.

mod events;
mod filter;
mod key;
mod quote;

pub use events::{Notification, NotificationLevel};
pub use filter::CategoryFilter;
pub use key::QuoteKey;
pub use quote::{Quote, QuoteId};

/// The quotes a fresh store starts with when nothing is persisted.
#[must_use]
pub fn default_quotes() -> Vec<Quote> {
    vec![
        Quote::new("Success is not final, failure is not fatal.", "Motivation"),
        Quote::new("Happiness depends upon ourselves.", "Philosophy"),
        Quote::new("Simplicity is the ultimate sophistication.", "Wisdom"),
    ]
}
