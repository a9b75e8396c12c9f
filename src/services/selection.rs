//! Category filter and random selection.

use crate::models::{CategoryFilter, Quote};
use crate::services::QuoteStore;
use crate::storage::{KeyValueStore, LAST_QUOTE_KEY, LEGACY_CATEGORY_KEY, SELECTED_CATEGORY_KEY};
use crate::{Error, Result};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Active category filter plus the session's last-viewed quote.
///
/// The filter is persisted durably; the last-viewed quote lives in session
/// storage and is only used to restore the display.
pub struct Selection {
    /// Active filter.
    filter: CategoryFilter,
    /// Durable backend (selected category).
    durable: Arc<dyn KeyValueStore>,
    /// Session backend (last viewed quote).
    session: Arc<dyn KeyValueStore>,
}

impl Selection {
    /// Loads the persisted filter.
    ///
    /// Reads [`SELECTED_CATEGORY_KEY`], falling back to the older
    /// [`LEGACY_CATEGORY_KEY`], then to [`CategoryFilter::All`].
    #[must_use]
    pub fn load(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        let filter = [SELECTED_CATEGORY_KEY, LEGACY_CATEGORY_KEY]
            .into_iter()
            .find_map(|key| match durable.get(key) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Failed to read category filter");
                    None
                },
            })
            .map(|raw| CategoryFilter::parse(&decode_stored_string(&raw)))
            .unwrap_or_default();

        Self {
            filter,
            durable,
            session,
        }
    }

    /// Returns the active filter.
    #[must_use]
    pub const fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// Sets and persists the active filter. `"all"` clears it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a blank name, or an error if the
    /// filter cannot be persisted (the previous filter is kept).
    pub fn set_category(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Category filter cannot be empty".to_string(),
            ));
        }

        let filter = CategoryFilter::parse(name);
        let encoded = serde_json::to_string(filter.as_str()).map_err(|e| Error::OperationFailed {
            operation: "serialize_category".to_string(),
            cause: e.to_string(),
        })?;
        self.durable.set(SELECTED_CATEGORY_KEY, &encoded)?;

        tracing::debug!(filter = %filter, "Category filter changed");
        self.filter = filter;
        Ok(())
    }

    /// Returns the quotes that pass the active filter, in store order.
    #[must_use]
    pub fn visible_set<'a>(&self, store: &'a QuoteStore) -> Vec<&'a Quote> {
        store
            .quotes()
            .iter()
            .filter(|q| self.filter.matches(q))
            .collect()
    }

    /// Picks a uniformly random visible quote and records it as last viewed.
    ///
    /// Returns `None` when nothing passes the filter.
    #[must_use]
    pub fn pick_random(&self, store: &QuoteStore) -> Option<Quote> {
        self.pick_random_with(store, &mut rand::rng())
    }

    /// Like [`Selection::pick_random`], with a caller-supplied RNG.
    pub fn pick_random_with<R: Rng + ?Sized>(
        &self,
        store: &QuoteStore,
        rng: &mut R,
    ) -> Option<Quote> {
        let visible = self.visible_set(store);
        let quote = (*visible.choose(rng)?).clone();
        self.remember(&quote);
        Some(quote)
    }

    /// Returns the distinct categories currently in the store.
    #[must_use]
    pub fn available_categories(&self, store: &QuoteStore) -> BTreeSet<String> {
        store.categories()
    }

    /// Returns the last quote shown in this session, if any.
    #[must_use]
    pub fn last_viewed(&self) -> Option<Quote> {
        let raw = match self.session.get(LAST_QUOTE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read last viewed quote");
                return None;
            },
        };

        serde_json::from_str(&raw)
            .inspect_err(|e| tracing::warn!(error = %e, "Ignoring malformed last viewed quote"))
            .ok()
    }

    /// Records `quote` as the session's last viewed quote (best effort).
    pub fn remember(&self, quote: &Quote) {
        let result = serde_json::to_string(quote)
            .map_err(|e| Error::OperationFailed {
                operation: "serialize_last_quote".to_string(),
                cause: e.to_string(),
            })
            .and_then(|json| self.session.set(LAST_QUOTE_KEY, &json));

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to record last viewed quote");
        }
    }

    /// Clears session storage. Returns the number of keys removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend cannot be cleared.
    pub fn end_session(&self) -> Result<usize> {
        self.session.clear()
    }
}

/// Decodes a stored filter value.
///
/// Values are written as JSON strings; older stores hold the bare name.
fn decode_stored_string(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.trim().to_string())
}
