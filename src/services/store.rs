//! Quote store.
//!
//! Owns the ordered quote list and mirrors every mutation to durable
//! storage under [`QUOTES_KEY`]. Persistence always rewrites the whole list.

use crate::models::{Quote, QuoteKey, default_quotes};
use crate::storage::{KeyValueStore, QUOTES_KEY};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::instrument;

/// Ordered, persisted list of quotes.
pub struct QuoteStore {
    /// Quotes in insertion order.
    quotes: Vec<Quote>,
    /// Durable backend.
    backend: Arc<dyn KeyValueStore>,
}

impl QuoteStore {
    /// Loads the store from durable storage.
    ///
    /// Falls back to the default quotes when nothing is persisted or the
    /// persisted value cannot be read or parsed. Records with blank text or
    /// category are dropped.
    #[must_use]
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let quotes = Self::read_persisted(backend.as_ref()).unwrap_or_else(default_quotes);
        tracing::debug!(count = quotes.len(), "Loaded quote store");
        Self { quotes, backend }
    }

    /// Creates a store holding exactly `quotes`, without touching storage.
    #[must_use]
    pub fn with_quotes(backend: Arc<dyn KeyValueStore>, quotes: Vec<Quote>) -> Self {
        Self { quotes, backend }
    }

    /// Re-reads the persisted list.
    ///
    /// Another process may have written the list since this store was
    /// loaded. Every mutation starts from the persisted copy so those writes
    /// are not overwritten. The in-memory list is kept when nothing usable is
    /// persisted.
    pub fn reload(&mut self) {
        if let Some(quotes) = Self::read_persisted(self.backend.as_ref()) {
            self.quotes = quotes;
        }
    }

    fn read_persisted(backend: &dyn KeyValueStore) -> Option<Vec<Quote>> {
        let raw = match backend.get(QUOTES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted quotes, using defaults");
                return None;
            },
        };

        let records = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(records)) => records,
            Ok(Value::Null) => return None,
            Ok(_) => {
                tracing::warn!("Persisted quotes are not a list, using defaults");
                return None;
            },
            Err(e) => {
                tracing::warn!(error = %e, "Persisted quotes are malformed, using defaults");
                return None;
            },
        };

        let before = records.len();
        let quotes: Vec<Quote> = records
            .into_iter()
            .filter_map(|record| serde_json::from_value::<Quote>(record).ok())
            .filter(Quote::is_valid)
            .collect();
        if quotes.len() < before {
            tracing::warn!(
                dropped = before - quotes.len(),
                "Dropped unusable persisted quotes"
            );
        }
        Some(quotes)
    }

    /// Returns the quotes in insertion order.
    #[must_use]
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Returns the number of quotes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Returns true if the store holds no quotes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Returns true if a quote with this key exists.
    #[must_use]
    pub fn contains_key(&self, key: &QuoteKey) -> bool {
        self.quotes.iter().any(|q| q.key() == *key)
    }

    /// Returns the distinct categories, sorted.
    #[must_use]
    pub fn categories(&self) -> BTreeSet<String> {
        self.quotes.iter().map(|q| q.category.clone()).collect()
    }

    /// Adds a quote and persists the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the text or category is blank (the
    /// store is unchanged), or an error if persisting fails (the addition is
    /// rolled back).
    #[instrument(skip_all, fields(operation = "store.add", category = %category))]
    pub fn add(&mut self, text: &str, category: &str) -> Result<Quote> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("Quote text cannot be empty".to_string()));
        }
        if category.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Quote category cannot be empty".to_string(),
            ));
        }

        self.reload();
        let quote = Quote::new(text, category);
        self.quotes.push(quote.clone());

        if let Err(e) = self.persist() {
            self.quotes.pop();
            return Err(e);
        }

        tracing::info!(id = %quote.id, "Added quote");
        Ok(quote)
    }

    /// Imports a batch of untyped candidates.
    ///
    /// Only objects with non-blank string `text` and `category` fields are
    /// accepted. Candidates whose [`QuoteKey`] is already in the store (or
    /// earlier in the batch) are skipped. Every accepted quote gets a fresh
    /// ID and timestamp; other fields of the candidate are ignored. The
    /// store is persisted once, only if something was accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the batch is rolled back.
    #[instrument(skip_all, fields(operation = "store.import", count = candidates.len()))]
    pub fn import_batch(&mut self, candidates: Vec<Value>) -> Result<ImportReport> {
        self.reload();
        let mut report = ImportReport::default();
        let mut seen: HashSet<QuoteKey> = self.quotes.iter().map(Quote::key).collect();
        let original_len = self.quotes.len();

        for (index, candidate) in candidates.iter().enumerate() {
            let record = index + 1;
            let Some((text, category)) = candidate_fields(candidate) else {
                report.skipped_invalid += 1;
                report
                    .errors
                    .push(format!("Record {record}: missing or empty text/category"));
                continue;
            };

            if !seen.insert(QuoteKey::new(text, category)) {
                report.skipped_duplicates += 1;
                continue;
            }

            self.quotes.push(Quote::new(text, category));
            report.imported += 1;
        }

        if report.has_imports() {
            if let Err(e) = self.persist() {
                self.quotes.truncate(original_len);
                return Err(e);
            }
        }

        tracing::info!(
            imported = report.imported,
            skipped_duplicates = report.skipped_duplicates,
            skipped_invalid = report.skipped_invalid,
            "Import finished"
        );
        Ok(report)
    }

    /// Writes the full quote list to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.quotes).map_err(|e| Error::OperationFailed {
            operation: "serialize_quotes".to_string(),
            cause: e.to_string(),
        })?;
        self.backend.set(QUOTES_KEY, &json)
    }

    /// Reloads the persisted list, then replaces it through `update`,
    /// persisting if it reports a change. The previous list is restored if
    /// persisting fails.
    pub(crate) fn update_with<T>(
        &mut self,
        update: impl FnOnce(&mut Vec<Quote>) -> (T, bool),
    ) -> Result<T> {
        self.reload();
        let snapshot = self.quotes.clone();
        let (output, changed) = update(&mut self.quotes);
        if changed {
            if let Err(e) = self.persist() {
                self.quotes = snapshot;
                return Err(e);
            }
        }
        Ok(output)
    }
}

/// Extracts non-blank `text` and `category` strings from a candidate.
fn candidate_fields(candidate: &Value) -> Option<(&str, &str)> {
    let text = candidate.get("text")?.as_str()?;
    let category = candidate.get("category")?.as_str()?;
    (!text.trim().is_empty() && !category.trim().is_empty()).then_some((text, category))
}

/// Result of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Quotes added to the store.
    pub imported: usize,
    /// Candidates already present (or repeated within the batch).
    pub skipped_duplicates: usize,
    /// Candidates without usable text/category.
    pub skipped_invalid: usize,
    /// Messages for invalid candidates.
    pub errors: Vec<String>,
}

impl ImportReport {
    /// Returns whether any quotes were imported.
    #[must_use]
    pub const fn has_imports(&self) -> bool {
        self.imported > 0
    }

    /// Returns the number of candidates examined.
    #[must_use]
    pub const fn total_processed(&self) -> usize {
        self.imported + self.skipped_duplicates + self.skipped_invalid
    }

    /// Returns a human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Imported {} quote(s), skipped {} duplicate(s) and {} invalid record(s)",
            self.imported, self.skipped_duplicates, self.skipped_invalid
        )
    }
}
