//! The quote book: single owner of the store and the selection.
//!
//! Every mutation from the CLI, the sync agent, or library callers goes
//! through [`QuoteBook`], so persistence and notifications happen in one
//! place. Shared between tasks as [`SharedBook`].

use crate::io;
use crate::models::{CategoryFilter, Notification, Quote};
use crate::observability::NotificationBus;
use crate::services::sync::{SyncStats, merge_remote};
use crate::services::{ImportReport, QuoteStore, Selection};
use crate::storage::KeyValueStore;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;

/// A quote book shared between tasks.
pub type SharedBook = Arc<Mutex<QuoteBook>>;

/// Locks a shared book.
///
/// # Errors
///
/// Returns an error if the lock is poisoned.
pub fn lock_book(book: &SharedBook) -> Result<MutexGuard<'_, QuoteBook>> {
    book.lock().map_err(|e| Error::OperationFailed {
        operation: "lock_quote_book".to_string(),
        cause: e.to_string(),
    })
}

/// Store, selection and notification bus.
pub struct QuoteBook {
    store: QuoteStore,
    selection: Selection,
    notifications: NotificationBus,
}

impl QuoteBook {
    /// Opens the book from durable and session storage.
    #[must_use]
    pub fn open(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: QuoteStore::load(Arc::clone(&durable)),
            selection: Selection::load(durable, session),
            notifications: NotificationBus::default(),
        }
    }

    /// Replaces the notification bus.
    #[must_use]
    pub fn with_notifications(mut self, notifications: NotificationBus) -> Self {
        self.notifications = notifications;
        self
    }

    /// Wraps the book for sharing with a [`crate::SyncAgent`].
    #[must_use]
    pub fn into_shared(self) -> SharedBook {
        Arc::new(Mutex::new(self))
    }

    /// Returns the store.
    #[must_use]
    pub const fn store(&self) -> &QuoteStore {
        &self.store
    }

    /// Returns the selection.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns the notification bus.
    #[must_use]
    pub const fn notifications(&self) -> &NotificationBus {
        &self.notifications
    }

    /// Adds a quote. Validation failures are also published as warnings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for blank fields, or an error if the
    /// store cannot be persisted.
    pub fn add(&mut self, text: &str, category: &str) -> Result<Quote> {
        self.store.add(text, category).inspect_err(|e| match e {
            Error::InvalidInput(message) => {
                self.notifications
                    .publish(Notification::warning("store", message.clone()));
            },
            other => {
                self.notifications
                    .publish(Notification::error("store", other.to_string()));
            },
        })
    }

    /// Imports already-parsed candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be persisted.
    pub fn import_values(&mut self, candidates: Vec<Value>) -> Result<ImportReport> {
        let result = self.store.import_batch(candidates);
        self.publish_import(&result);
        result
    }

    /// Parses and imports a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or not an array (the
    /// store is unchanged), or the store cannot be persisted.
    pub fn import_json(&mut self, contents: &str) -> Result<ImportReport> {
        match io::parse_import(contents) {
            Ok(candidates) => self.import_values(candidates),
            Err(e) => {
                self.notifications
                    .publish(Notification::error("import", format!("Import failed: {e}")));
                Err(e)
            },
        }
    }

    /// Reads and imports a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed (the store is
    /// unchanged), or the store cannot be persisted.
    #[instrument(skip_all, fields(operation = "book.import_file", path = %path.display()))]
    pub fn import_file(&mut self, path: &Path) -> Result<ImportReport> {
        match io::read_import_file(path) {
            Ok(candidates) => self.import_values(candidates),
            Err(e) => {
                self.notifications
                    .publish(Notification::error("import", format!("Import failed: {e}")));
                Err(e)
            },
        }
    }

    fn publish_import(&self, result: &Result<ImportReport>) {
        let notification = match result {
            Ok(report) if report.has_imports() => Notification::success("import", report.summary()),
            Ok(report) => Notification::info("import", report.summary()),
            Err(e) => Notification::error("import", format!("Import failed: {e}")),
        };
        self.notifications.publish(notification);
    }

    /// Serializes the whole store for export.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> Result<String> {
        io::to_json_pretty(self.store.quotes())
    }

    /// Writes the whole store to `path`. Returns the number of quotes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn export_to_file(&self, path: &Path) -> Result<usize> {
        io::write_export_file(path, self.store.quotes())?;
        tracing::info!(path = %path.display(), count = self.store.len(), "Exported quotes");
        Ok(self.store.len())
    }

    /// Sets the category filter.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank name or if the filter cannot be saved.
    pub fn set_category(&mut self, name: &str) -> Result<()> {
        self.selection.set_category(name)
    }

    /// Returns the active filter.
    #[must_use]
    pub const fn filter(&self) -> &CategoryFilter {
        self.selection.filter()
    }

    /// Returns the quotes passing the filter.
    #[must_use]
    pub fn visible(&self) -> Vec<&Quote> {
        self.selection.visible_set(&self.store)
    }

    /// Picks a random visible quote and records it as last viewed.
    #[must_use]
    pub fn show_random(&self) -> Option<Quote> {
        self.selection.pick_random(&self.store)
    }

    /// Returns the distinct categories, sorted.
    #[must_use]
    pub fn categories(&self) -> BTreeSet<String> {
        self.selection.available_categories(&self.store)
    }

    /// Returns the session's last viewed quote.
    #[must_use]
    pub fn last_viewed(&self) -> Option<Quote> {
        self.selection.last_viewed()
    }

    /// Clears session storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend cannot be cleared.
    pub fn end_session(&self) -> Result<usize> {
        self.selection.end_session()
    }

    /// Merges remote candidates into the store and persists on change.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the store is left as it was.
    #[instrument(skip_all, fields(operation = "book.apply_remote", candidates = candidates.len()))]
    pub fn apply_remote(
        &mut self,
        candidates: Vec<Quote>,
        prune_missing: bool,
    ) -> Result<SyncStats> {
        let stats = self.store.update_with(|quotes| {
            let stats = merge_remote(quotes, candidates, prune_missing);
            (stats, !stats.is_empty())
        })?;

        tracing::info!(
            fetched = stats.fetched,
            added = stats.added,
            updated = stats.updated,
            removed = stats.removed,
            "Merged remote quotes"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationLevel;
    use crate::storage::{FilesystemStore, MemoryStore};
    use tempfile::TempDir;

    fn memory_book() -> QuoteBook {
        QuoteBook::open(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_open_starts_with_defaults() {
        let book = memory_book();
        assert_eq!(book.store().len(), 3);
        assert_eq!(book.filter(), &CategoryFilter::All);
        assert!(book.last_viewed().is_none());
    }

    #[test]
    fn test_add_refreshes_categories() {
        let mut book = memory_book();
        book.add("Alpha", "Cats").unwrap();
        assert!(book.categories().contains("Cats"));
    }

    #[tokio::test]
    async fn test_blank_add_publishes_warning() {
        let mut book = memory_book();
        let mut rx = book.notifications().subscribe();

        assert!(book.add(" ", "Cats").is_err());
        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Warning);
        assert_eq!(notification.source, "store");
    }

    #[tokio::test]
    async fn test_import_json_rejects_non_array_without_changes() {
        let mut book = memory_book();
        let mut rx = book.notifications().subscribe();

        let err = book.import_json(r#"{"text": "Alpha", "category": "Cats"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid file format"));
        assert_eq!(book.store().len(), 3);
        assert_eq!(rx.recv().await.unwrap().level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_import_json_reports_counts() {
        let mut book = memory_book();
        let mut rx = book.notifications().subscribe();

        let report = book
            .import_json(r#"[{"text": "Alpha", "category": "Cats"}, {"text": ""}]"#)
            .unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped_invalid, 1);

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Success);
        assert_eq!(notification.message, report.summary());
    }

    #[test]
    fn test_export_then_import_adds_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(io::DEFAULT_EXPORT_FILE);
        let mut book = memory_book();

        assert_eq!(book.export_to_file(&path).unwrap(), 3);
        let report = book.import_file(&path).unwrap();

        assert_eq!(report.imported, 0);
        assert_eq!(report.skipped_duplicates, 3);
        assert_eq!(book.store().len(), 3);
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let durable: Arc<dyn KeyValueStore> =
            Arc::new(FilesystemStore::new(dir.path().join("data")));
        let session: Arc<dyn KeyValueStore> =
            Arc::new(FilesystemStore::new(dir.path().join("session")));

        let mut book = QuoteBook::open(Arc::clone(&durable), Arc::clone(&session));
        book.add("Alpha", "Cats").unwrap();
        book.set_category("Cats").unwrap();
        let shown = book.show_random().unwrap();

        let reopened = QuoteBook::open(durable, session);
        assert_eq!(reopened.store().len(), 4);
        assert_eq!(reopened.filter(), &CategoryFilter::Only("Cats".to_string()));
        assert_eq!(reopened.visible().len(), 1);
        assert_eq!(reopened.last_viewed(), Some(shown));

        assert_eq!(reopened.end_session().unwrap(), 1);
        assert!(reopened.last_viewed().is_none());
    }

    #[test]
    fn test_apply_remote_without_changes_does_not_persist() {
        let durable = Arc::new(MemoryStore::new());
        let mut book = QuoteBook::open(durable.clone(), Arc::new(MemoryStore::new()));

        let stats = book.apply_remote(Vec::new(), true).unwrap();
        assert!(stats.is_empty());
        assert!(durable.get(crate::storage::QUOTES_KEY).unwrap().is_none());
    }
}
