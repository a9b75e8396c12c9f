//! Category filter.

use std::fmt;

use super::Quote;

/// The active category filter.
///
/// Persisted as a plain string: `"all"` for [`CategoryFilter::All`], the
/// category name otherwise. Matching is exact and case-sensitive, the same
/// way categories are displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No filtering.
    #[default]
    All,
    /// Only quotes in this category.
    Only(String),
}

impl CategoryFilter {
    /// Sentinel value meaning "no filter".
    pub const ALL: &'static str = "all";

    /// Parses a stored or user-supplied filter value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == Self::ALL {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }

    /// Returns the persisted string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => Self::ALL,
            Self::Only(name) => name,
        }
    }

    /// Returns true if the quote passes this filter.
    #[must_use]
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => quote.category == *name,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
