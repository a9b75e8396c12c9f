//! User-visible notifications.

use chrono::{DateTime, Utc};
use std::fmt;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Nothing changed or purely informational.
    Info,
    /// An operation changed the store.
    Success,
    /// Something was skipped but nothing failed.
    Warning,
    /// An operation failed and was abandoned.
    Error,
}

impl NotificationLevel {
    /// Returns the level as a lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Component that raised it (`sync`, `import`, `store`).
    pub source: &'static str,
    /// Human-readable text.
    pub message: String,
    /// When it was raised.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification stamped with the current time.
    #[must_use]
    pub fn new(level: NotificationLevel, source: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            source,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for an informational notification.
    #[must_use]
    pub fn info(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, source, message)
    }

    /// Shorthand for a success notification.
    #[must_use]
    pub fn success(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, source, message)
    }

    /// Shorthand for a warning notification.
    #[must_use]
    pub fn warning(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, source, message)
    }

    /// Shorthand for an error notification.
    #[must_use]
    pub fn error(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, source, message)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.level.as_str(),
            self.source,
            self.message
        )
    }
}
