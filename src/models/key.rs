//! Normalized equality key for quotes.
//!
//! Every place that asks "is this the same quote?" (import de-duplication,
//! sync matching) compares [`QuoteKey`]s, never raw strings.

use sha2::{Digest, Sha256};
use std::fmt;

/// Separator between the normalized text and category before hashing.
const FIELD_SEPARATOR: char = '\u{1f}';

/// SHA-256 over the normalized `(text, category)` pair.
///
/// # Normalization
///
/// Each field is:
/// - Trimmed of leading/trailing whitespace
/// - Converted to lowercase
/// - Collapsed so runs of whitespace become a single space
///
/// # Example
///
/// ```rust
/// use quotesync::QuoteKey;
///
/// let a = QuoteKey::new("Stay  hungry", "Motivation");
/// let b = QuoteKey::new(" stay hungry ", "MOTIVATION");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuoteKey(String);

impl QuoteKey {
    /// Computes the key for a text/category pair.
    #[must_use]
    pub fn new(text: &str, category: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(Self::normalize(text).as_bytes());
        hasher.update(FIELD_SEPARATOR.to_string().as_bytes());
        hasher.update(Self::normalize(category).as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Normalizes one field for comparison.
    ///
    /// ```rust
    /// use quotesync::QuoteKey;
    ///
    /// assert_eq!(QuoteKey::normalize("  Hello   WORLD  "), "hello world");
    /// ```
    #[must_use]
    pub fn normalize(field: &str) -> String {
        field
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0[..self.0.len().min(16)])
    }
}
