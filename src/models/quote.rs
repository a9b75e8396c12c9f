//! Quote types and identifiers.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::QuoteKey;

/// Unique identifier for a quote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    /// Creates a quote ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for QuoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for QuoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single quote record.
///
/// Serialized with camelCase keys so files written by the browser versions
/// of the quote book (`lastModified`, `serverId`) load unchanged. The `id`
/// and timestamp are optional on input: older files carry neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Local identifier, minted on insertion.
    #[serde(default = "QuoteId::generate")]
    pub id: QuoteId,
    /// The quote text.
    pub text: String,
    /// The quote category.
    pub category: String,
    /// Last local modification, stored as epoch milliseconds.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<DateTime<Utc>>,
    /// Identifier of the remote item this quote came from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
}

impl Quote {
    /// Creates a new local quote with a fresh ID, stamped with the current time.
    #[must_use]
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: QuoteId::generate(),
            text: text.into(),
            category: category.into(),
            last_modified: Some(Self::timestamp_now()),
            server_id: None,
        }
    }

    /// Current time at the millisecond precision quotes are stored with.
    #[must_use]
    pub fn timestamp_now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }

    /// Sets the remote-origin marker.
    #[must_use]
    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }

    /// Returns the normalized equality key of this quote.
    #[must_use]
    pub fn key(&self) -> QuoteKey {
        QuoteKey::new(&self.text, &self.category)
    }

    /// Returns true if text and category are both non-blank.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty() && !self.category.trim().is_empty()
    }

    /// Returns true if this quote claims remote origin.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.server_id.is_some()
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"\nCategory: {}", self.text, self.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_quote_has_id_and_timestamp() {
        let quote = Quote::new("Alpha", "Cats");
        assert!(!quote.id.as_str().is_empty());
        assert!(quote.last_modified.is_some());
        assert!(!quote.is_remote());
        assert!(quote.is_valid());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(QuoteId::generate(), QuoteId::generate());
    }

    #[test]
    fn test_legacy_record_without_id_or_timestamp() {
        let json = r#"{"text": "Happiness depends upon ourselves.", "category": "Philosophy"}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.text, "Happiness depends upon ourselves.");
        assert!(!quote.id.as_str().is_empty());
        assert!(quote.last_modified.is_none());
        assert!(quote.server_id.is_none());
    }

    #[test]
    fn test_browser_record_with_millis_timestamp() {
        let json = r#"{"id": "q1", "text": "Beta", "category": "Dogs",
                       "lastModified": 1700000000000, "serverId": "7"}"#;
        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.id.as_str(), "q1");
        assert_eq!(quote.server_id.as_deref(), Some("7"));
        assert_eq!(quote.last_modified.unwrap().timestamp_millis(), 1_700_000_000_000);

        let out = serde_json::to_string(&quote).unwrap();
        assert!(out.contains("\"lastModified\":1700000000000"));
        assert!(out.contains("\"serverId\":\"7\""));
    }

    #[test]
    fn test_new_quote_survives_serialization() {
        let quote = Quote::new("Alpha", "Cats").with_server_id("3");
        let json = serde_json::to_string(&quote).unwrap();
        assert_eq!(serde_json::from_str::<Quote>(&json).unwrap(), quote);
    }

    #[test]
    fn test_blank_fields_are_invalid() {
        assert!(!Quote::new("   ", "Cats").is_valid());
        assert!(!Quote::new("Alpha", "").is_valid());
    }

    #[test]
    fn test_display() {
        let quote = Quote::new("Alpha", "Cats");
        assert_eq!(quote.to_string(), "\"Alpha\"\nCategory: Cats");
    }
}
